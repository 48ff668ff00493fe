use crate::config::{Config, Emit};
use crate::error::Diagnostics;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::printer;
use crate::runner::{parse_source, report_runtime_error};
use std::io::{self, BufRead, Write};

pub fn start(config: &Config) -> io::Result<()> {
    println!("yak {}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let evaluator = Evaluator::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }

                run_repl_command(line, config, &evaluator);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }

    Ok(())
}

fn run_repl_command(source: &str, config: &Config, evaluator: &Evaluator) {
    if config.emit == Emit::Tokens {
        let mut diagnostics = Diagnostics::new();
        for token in Lexer::new(source, &config.keywords).scan_tokens(&mut diagnostics) {
            println!("{}", token);
        }
        diagnostics.render_all(source, None);
        return;
    }

    let (expressions, diagnostics) = parse_source(source, config);
    diagnostics.render_all(source, None);
    if diagnostics.has_fatal() {
        return;
    }

    // Only the last expression on the line is echoed
    let mut last = None;
    for expr in &expressions {
        if config.emit == Emit::Ast {
            println!("{}", printer::print(expr));
            continue;
        }
        match evaluator.evaluate(expr) {
            Ok(value) => last = Some(value),
            Err(error) => {
                report_runtime_error(&error, source, None);
                return;
            }
        }
    }

    if let Some(value) = last {
        println!("{}", value);
    }
}
