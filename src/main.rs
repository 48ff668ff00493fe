use clap::error::{ContextKind, ErrorKind};
use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::path::Path;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use yak::config::ConfigError;
use yak::{Config, Diagnostic, DiagnosticKind, Emit, Severity};

fn cli() -> Command {
    Command::new("yak")
        .about("Lexer, parser and evaluator for the yak expression language")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("file")
                .help("The source file to evaluate")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("emit")
                .short('p')
                .long("emit")
                .help("What to print for each expression")
                .value_name("MODE")
                .value_parser(["tokens", "ast", "value"])
                .default_value("value"),
        )
        .arg(
            Arg::new("keywords")
                .short('k')
                .long("keywords")
                .help("File of 'name = spelling' keyword overrides")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Deepest expression nesting accepted by the parser")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log pipeline stages (-v) or every token and node (-vv)")
                .action(ArgAction::Count),
        )
}

fn main() {
    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => fail_on_flag_error(err),
    };

    init_tracing(matches.get_count("verbose"));

    let mut config = Config {
        emit: matches
            .get_one::<String>("emit")
            .and_then(|mode| mode.parse::<Emit>().ok())
            .unwrap_or_default(),
        ..Config::default()
    };
    if let Some(&max_depth) = matches.get_one::<usize>("max-depth") {
        config.max_depth = max_depth;
    }
    if let Some(path) = matches.get_one::<String>("keywords") {
        if let Err(err) = config.load_keywords(Path::new(path)) {
            fail_on_config_error(path, err);
        }
    }

    if let Some(file_path) = matches.get_one::<String>("file") {
        run_file(file_path, &config);
    } else if let Err(err) = yak::start_repl(&config) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run_file(path: &str, config: &Config) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            fail(Diagnostic::unlocated(
                DiagnosticKind::FileNotFound,
                Severity::Fatal,
                vec![path.to_string()],
            ));
        }
        Err(err) => {
            eprintln!("Error reading file '{}': {}", path, err);
            process::exit(1);
        }
    };

    if let Err(err) = yak::run(&source, Some(path), config) {
        tracing::debug!("run failed: {err}");
        process::exit(err.exit_code());
    }
}

/// Reports unknown flags and flags missing their argument as diagnostics;
/// everything else (help, version, bad values) is left to clap.
fn fail_on_flag_error(err: clap::Error) -> ! {
    let flag = err
        .get(ContextKind::InvalidArg)
        .map(|arg| arg.to_string())
        .unwrap_or_default();
    let missing_value = err
        .get(ContextKind::InvalidValue)
        .map_or(false, |value| value.to_string().is_empty());

    match err.kind() {
        ErrorKind::UnknownArgument => fail(Diagnostic::unlocated(
            DiagnosticKind::UnrecognizedFlag,
            Severity::Fatal,
            vec![flag],
        )),
        ErrorKind::InvalidValue if missing_value => fail(Diagnostic::unlocated(
            DiagnosticKind::MissingFlagArgument,
            Severity::Fatal,
            vec![flag, "(EOL)".to_string()],
        )),
        _ => err.exit(),
    }
}

fn fail_on_config_error(path: &str, err: ConfigError) -> ! {
    match err {
        ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            fail(Diagnostic::unlocated(
                DiagnosticKind::FileNotFound,
                Severity::Fatal,
                vec![path.to_string()],
            ))
        }
        other => {
            eprintln!("Error: {}", other);
            process::exit(1);
        }
    }
}

fn fail(diagnostic: Diagnostic) -> ! {
    eprintln!("{}", diagnostic);
    process::exit(diagnostic.kind.code());
}
