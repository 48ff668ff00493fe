// Yak expression language front end
//
// Lexer, precedence-climbing parser, tree-walking evaluator and AST printer
// for a small expression-oriented language, plus the diagnostics they report.

// Public modules
pub mod ast;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod repl;
pub mod runner;
pub mod token;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, LiteralValue, TernaryKind};
pub use config::{Config, Emit};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, PipelineError, RuntimeError, Severity, Span};
pub use evaluator::Evaluator;
pub use lexer::{lex, Keywords, Lexer};
pub use parser::Parser;
pub use token::{Token, TokenKind, TokenLiteral};
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{evaluate_source, run};
