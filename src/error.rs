use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

/// Character offsets `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Enqueued; the stage keeps going.
    Recoverable,
    /// The stage that reported it stops.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    FileNotFound,
    UnexpectedCharacter,
    UnterminatedBlockComment,
    UnterminatedString,
    MissingFlagArgument,
    UnrecognizedFlag,
    UnclosedParenthesis,
    ExpectedExpression,
    UnterminatedTernary,
    ExpectedSemicolon,
    NestingTooDeep,
}

impl DiagnosticKind {
    /// Stable numeric code, also used as the process exit status.
    pub fn code(self) -> i32 {
        match self {
            DiagnosticKind::FileNotFound => 1,
            DiagnosticKind::UnexpectedCharacter => 2,
            DiagnosticKind::UnterminatedBlockComment => 3,
            DiagnosticKind::UnterminatedString => 4,
            DiagnosticKind::MissingFlagArgument => 5,
            DiagnosticKind::UnrecognizedFlag => 6,
            DiagnosticKind::UnclosedParenthesis => 7,
            DiagnosticKind::ExpectedExpression => 8,
            DiagnosticKind::UnterminatedTernary => 9,
            DiagnosticKind::ExpectedSemicolon => 10,
            DiagnosticKind::NestingTooDeep => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::FileNotFound => "file-not-found",
            DiagnosticKind::UnexpectedCharacter => "unexpected-character",
            DiagnosticKind::UnterminatedBlockComment => "unterminated-block-comment",
            DiagnosticKind::UnterminatedString => "unterminated-string",
            DiagnosticKind::MissingFlagArgument => "missing-flag-argument",
            DiagnosticKind::UnrecognizedFlag => "unrecognized-flag",
            DiagnosticKind::UnclosedParenthesis => "unclosed-parenthesis",
            DiagnosticKind::ExpectedExpression => "expected-expression",
            DiagnosticKind::UnterminatedTernary => "unterminated-ternary",
            DiagnosticKind::ExpectedSemicolon => "expected-semicolon",
            DiagnosticKind::NestingTooDeep => "nesting-too-deep",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A structured report from the lexer, parser or command line.
///
/// The core only fills in `(kind, line, column, details)`; turning that into
/// text is the job of [`Diagnostic::render`] or the `Display` impl.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// 1-based; 0 when the diagnostic has no source position.
    pub line: usize,
    /// 1-based; 0 when the diagnostic has no source position.
    pub column: usize,
    pub details: Vec<String>,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        line: usize,
        column: usize,
        details: Vec<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            line,
            column,
            details,
            span: None,
        }
    }

    pub fn recoverable(kind: DiagnosticKind, line: usize, column: usize, details: Vec<String>) -> Self {
        Self::new(kind, Severity::Recoverable, line, column, details)
    }

    pub fn fatal(kind: DiagnosticKind, line: usize, column: usize, details: Vec<String>) -> Self {
        Self::new(kind, Severity::Fatal, line, column, details)
    }

    /// A diagnostic that is not tied to a source position (files, flags).
    pub fn unlocated(kind: DiagnosticKind, severity: Severity, details: Vec<String>) -> Self {
        Self::new(kind, severity, 0, 0, details)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    fn detail(&self, index: usize) -> &str {
        self.details.get(index).map(String::as_str).unwrap_or("")
    }

    /// One-line summary without location, used as the ariadne label.
    pub fn summary(&self) -> String {
        match self.kind {
            DiagnosticKind::FileNotFound => format!("file '{}' not found", self.detail(0)),
            DiagnosticKind::UnexpectedCharacter => {
                format!("unexpected character '{}'", self.detail(0))
            }
            DiagnosticKind::UnterminatedBlockComment => "unterminated block comment".to_string(),
            DiagnosticKind::UnterminatedString => "unterminated string".to_string(),
            DiagnosticKind::MissingFlagArgument => {
                format!("flag '{}' requires an argument", self.detail(0))
            }
            DiagnosticKind::UnrecognizedFlag => format!("unrecognized flag '{}'", self.detail(0)),
            DiagnosticKind::UnclosedParenthesis => "expected ')' to close '('".to_string(),
            DiagnosticKind::ExpectedExpression => match self.details.get(1) {
                Some(found) if !found.is_empty() => format!("expected expression, found '{}'", found),
                _ => "expected expression".to_string(),
            },
            DiagnosticKind::UnterminatedTernary => "expected ':' in conditional expression".to_string(),
            DiagnosticKind::ExpectedSemicolon => {
                format!("expected ';' after expression, found '{}'", self.detail(1))
            }
            DiagnosticKind::NestingTooDeep => "expression is nested too deeply".to_string(),
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self.kind {
            DiagnosticKind::UnclosedParenthesis => {
                Some("Every opening parenthesis '(' must have a matching closing parenthesis ')'.")
            }
            DiagnosticKind::UnterminatedTernary => {
                Some("A conditional expression has the form: condition ? then : else")
            }
            DiagnosticKind::UnterminatedString => Some("Close the string with '\"'."),
            DiagnosticKind::UnterminatedBlockComment => {
                Some("Block comments nest; every '/*' needs its own '*/'.")
            }
            DiagnosticKind::NestingTooDeep => Some("Split the expression into smaller parts."),
            _ => None,
        }
    }

    /// Prints a rich report for this diagnostic to stderr.
    pub fn render(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<repl>");
        let color = if self.is_fatal() { Color::Red } else { Color::Yellow };
        let report_kind = if self.is_fatal() {
            ReportKind::Error
        } else {
            ReportKind::Warning
        };
        let span = self.span.unwrap_or_default();

        let mut report_builder = Report::build(report_kind, filename, span.start)
            .with_code(self.kind.code())
            .with_message(format!("{}: {}", self.kind.name().fg(color), self.summary()));

        if self.span.is_some() {
            report_builder = report_builder.with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(self.summary())
                    .with_color(color),
            );
        }

        if let Some(help_text) = self.help() {
            report_builder = report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .eprint((filename, Source::from(source)))
    }
}

/// `~` repeated `column - 1` times followed by `^`.
pub fn squiggle(column: usize) -> String {
    let mut squiggle = "~".repeat(column.saturating_sub(1));
    squiggle.push('^');
    squiggle
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = if self.is_fatal() { "error" } else { "warning" };
        write!(f, "{}[{}]: {}", label, self.kind.code(), self.summary())?;
        if self.line == 0 {
            return Ok(());
        }
        write!(f, " at line {}, column {}", self.line, self.column)?;

        let source_line = match self.kind {
            DiagnosticKind::UnexpectedCharacter => self.details.get(1),
            DiagnosticKind::FileNotFound
            | DiagnosticKind::MissingFlagArgument
            | DiagnosticKind::UnrecognizedFlag => None,
            _ => self.details.first(),
        };
        if let Some(text) = source_line {
            write!(f, "\n{}\n{}", text, squiggle(self.column))?;
        }
        Ok(())
    }
}

/// Append-only collector owned by a single pipeline run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            kind = diagnostic.kind.name(),
            line = diagnostic.line,
            column = diagnostic.column,
            fatal = diagnostic.is_fatal(),
            "diagnostic reported"
        );
        self.entries.push(diagnostic);
    }

    pub fn has_fatal(&self) -> bool {
        self.first_fatal().is_some()
    }

    /// The first fatal diagnostic, which decides the exit status.
    pub fn first_fatal(&self) -> Option<&Diagnostic> {
        first_fatal(&self.entries)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn render_all(&self, source: &str, filename: Option<&str>) {
        for diagnostic in &self.entries {
            if let Err(err) = diagnostic.render(source, filename) {
                tracing::warn!("failed to render diagnostic: {err}");
                eprintln!("{}", diagnostic);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("operand type mismatch for operator '{operator}' at line {line}, column {column}: expected {expected}, found {found}")]
    OperandMismatch {
        operator: String,
        expected: &'static str,
        found: String,
        line: usize,
        column: usize,
        span: Span,
    },
    #[error("operator '{operator}' cannot be evaluated at line {line}, column {column}")]
    UnsupportedOperator {
        operator: String,
        line: usize,
        column: usize,
        span: Span,
    },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::OperandMismatch { span, .. } => *span,
            RuntimeError::UnsupportedOperator { span, .. } => *span,
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<repl>");
        let span = self.span();
        let (message, help) = match self {
            RuntimeError::OperandMismatch { operator, expected, found, .. } => (
                format!("cannot apply '{}' to {}", operator, found),
                format!("'{}' expects {}.", operator, expected),
            ),
            RuntimeError::UnsupportedOperator { operator, .. } => (
                format!("'{}' is not an operator", operator),
                "Only operators produced by the parser can be evaluated.".to_string(),
            ),
        };

        Report::build(ReportKind::Error, filename, span.start)
            .with_message(format!("{}: {}", "Runtime Error".fg(Color::Magenta), self))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(message)
                    .with_color(Color::Magenta),
            )
            .with_note(format!("{}: {}", "help".fg(Color::Cyan), help))
            .finish()
            .eprint((filename, Source::from(source)))
    }
}

/// Why a pipeline run produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("{} diagnostic(s), first fatal: {}", .0.len(), first_fatal_name(.0))]
    Diagnostics(Vec<Diagnostic>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn first_fatal(diagnostics: &[Diagnostic]) -> Option<&Diagnostic> {
    diagnostics.iter().find(|d| d.is_fatal())
}

fn first_fatal_name(diagnostics: &[Diagnostic]) -> &'static str {
    first_fatal(diagnostics).map(|d| d.kind.name()).unwrap_or("none")
}

impl PipelineError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Diagnostics(diagnostics) => {
                first_fatal(diagnostics).map(|d| d.kind.code()).unwrap_or(1)
            }
            PipelineError::Runtime(_) => 70,
        }
    }
}
