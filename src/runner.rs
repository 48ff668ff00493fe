use crate::ast::Expr;
use crate::config::{Config, Emit};
use crate::error::{Diagnostics, PipelineError, RuntimeError};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::printer;
use crate::value::Value;

/// Lexes and parses `source` in program mode. Diagnostics from both stages
/// end up in the returned collector.
pub fn parse_source(source: &str, config: &Config) -> (Vec<Expr>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();

    tracing::debug!("scanning");
    let tokens = Lexer::new(source, &config.keywords).scan_tokens(&mut diagnostics);

    tracing::debug!("parsing");
    let expressions = Parser::new(tokens)
        .with_max_depth(config.max_depth)
        .parse_program(&mut diagnostics);

    (expressions, diagnostics)
}

/// Runs the whole pipeline and returns the value of every expression.
pub fn evaluate_source(source: &str, config: &Config) -> Result<Vec<Value>, PipelineError> {
    let (expressions, diagnostics) = parse_source(source, config);
    if diagnostics.has_fatal() {
        return Err(PipelineError::Diagnostics(diagnostics.into_vec()));
    }

    tracing::debug!("evaluating");
    let evaluator = Evaluator::new();
    let values = expressions
        .iter()
        .map(|expr| evaluator.evaluate(expr))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

/// Runs `source` and prints what `config.emit` asks for. Diagnostics are
/// rendered as they are found; a fatal one stops before evaluation.
pub fn run(source: &str, filename: Option<&str>, config: &Config) -> Result<(), PipelineError> {
    if config.emit == Emit::Tokens {
        let mut diagnostics = Diagnostics::new();
        let tokens = Lexer::new(source, &config.keywords).scan_tokens(&mut diagnostics);
        for token in &tokens {
            println!("{}", token);
        }
        diagnostics.render_all(source, filename);
        return Ok(());
    }

    let (expressions, diagnostics) = parse_source(source, config);
    diagnostics.render_all(source, filename);
    if diagnostics.has_fatal() {
        return Err(PipelineError::Diagnostics(diagnostics.into_vec()));
    }

    if config.emit == Emit::Ast {
        for expr in &expressions {
            println!("{}", printer::print(expr));
        }
        return Ok(());
    }

    tracing::debug!("evaluating");
    let evaluator = Evaluator::new();
    for expr in &expressions {
        match evaluator.evaluate(expr) {
            Ok(value) => println!("{}", value),
            Err(error) => {
                report_runtime_error(&error, source, filename);
                return Err(error.into());
            }
        }
    }

    Ok(())
}

pub(crate) fn report_runtime_error(error: &RuntimeError, source: &str, filename: Option<&str>) {
    if let Err(err) = error.report(source, filename) {
        tracing::warn!("failed to render runtime error: {err}");
        eprintln!("{}", error);
    }
}
