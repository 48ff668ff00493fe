use crate::error::{Diagnostic, DiagnosticKind, Diagnostics, Span};
use crate::token::{Token, TokenKind, TokenLiteral};
use std::collections::HashMap;
use std::rc::Rc;

/// Internal keyword names and the token kinds they produce.
pub const KEYWORD_NAMES: [(&str, TokenKind); 22] = [
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("not", TokenKind::Bang),
    ("class", TokenKind::Class),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("nil", TokenKind::Nil),
    ("function", TokenKind::Function),
    ("return", TokenKind::Return),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("print", TokenKind::Print),
    ("super", TokenKind::Super),
    ("this", TokenKind::This),
    ("var", TokenKind::Var),
    ("b_or", TokenKind::BitOr),
    ("b_and", TokenKind::BitAnd),
    ("b_not", TokenKind::BitNot),
    ("b_xor", TokenKind::BitXor),
    ("b_nand", TokenKind::BitNand),
];

/// Keyword spellings. Each internal name has exactly one spelling; the
/// default spelling is the name itself.
#[derive(Debug, Clone)]
pub struct Keywords {
    spellings: HashMap<&'static str, String>,
    table: HashMap<String, TokenKind>,
}

impl Default for Keywords {
    fn default() -> Self {
        let mut spellings = HashMap::new();
        let mut table = HashMap::new();
        for (name, kind) in KEYWORD_NAMES {
            spellings.insert(name, name.to_string());
            table.insert(name.to_string(), kind);
        }
        Self { spellings, table }
    }
}

impl Keywords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the spelling of the keyword with internal name `name`.
    /// Returns `false` if `name` is not a keyword.
    pub fn set_spelling(&mut self, name: &str, spelling: &str) -> bool {
        let Some(&(name, kind)) = KEYWORD_NAMES.iter().find(|(n, _)| *n == name) else {
            return false;
        };
        if let Some(old) = self.spellings.insert(name, spelling.to_string()) {
            self.table.remove(&old);
        }
        self.table.insert(spelling.to_string(), kind);
        true
    }

    pub fn spelling(&self, name: &str) -> Option<&str> {
        self.spellings.get(name).map(String::as_str)
    }

    pub fn lookup(&self, text: &str) -> Option<TokenKind> {
        self.table.get(text).copied()
    }
}

/// Lexes `source` with the default keyword spellings.
pub fn lex(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let keywords = Keywords::default();
    Lexer::new(source, &keywords).scan_tokens(diagnostics)
}

/// Single forward pass over the source, one token per step.
pub struct Lexer<'k> {
    chars: Vec<char>,
    lines: Vec<Rc<str>>,
    keywords: &'k Keywords,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    // Characters consumed on the current line.
    column: usize,
    start_line: usize,
    start_column: usize,
}

impl<'k> Lexer<'k> {
    pub fn new(source: &str, keywords: &'k Keywords) -> Self {
        let lines = source
            .split('\n')
            .map(|line| Rc::from(line.strip_suffix('\r').unwrap_or(line)))
            .collect();

        Self {
            chars: source.chars().collect(),
            lines,
            keywords,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Never fails: bad input is reported to `diagnostics` as recoverable and
    /// skipped. The result always ends with exactly one `Eof` token.
    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        let reported_before = diagnostics.len();

        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column + 1;
            self.scan_token(diagnostics);
        }

        let eof = Token::new(
            TokenKind::Eof,
            String::new(),
            None,
            self.line,
            self.column + 1,
            self.source_line(self.line),
            Span::new(self.current, self.current),
        );
        self.tokens.push(eof);

        tracing::debug!(
            tokens = self.tokens.len(),
            diagnostics = diagnostics.len() - reported_before,
            "lexing complete"
        );
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '?' => self.add_token(TokenKind::Question),
            ':' => self.add_token(TokenKind::Colon),
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.number();
                } else {
                    self.add_token(TokenKind::Dot);
                }
            }
            '*' => {
                let kind = if self.match_char('*') {
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                };
                self.add_token(kind);
            }
            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else if self.match_char('<') {
                    TokenKind::LeftShift
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else if self.match_char('>') {
                    TokenKind::RightShift
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_char('*') {
                    self.block_comment(diagnostics);
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            // Line and column bookkeeping happens in advance()
            ' ' | '\r' | '\t' | '\n' => {}
            '"' => self.string(diagnostics),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                let source_line = self.source_line(self.start_line).to_string();
                diagnostics.report(
                    Diagnostic::recoverable(
                        DiagnosticKind::UnexpectedCharacter,
                        self.start_line,
                        self.start_column,
                        vec![c.to_string(), source_line],
                    )
                    .with_span(Span::new(self.start, self.current)),
                );
            }
        }
    }

    fn advance(&mut self) -> char {
        let Some(&c) = self.chars.get(self.current) else {
            return '\0';
        };
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> char {
        self.chars.get(self.current + n).copied().unwrap_or('\0')
    }

    fn source_line(&self, line: usize) -> Rc<str> {
        line.checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .cloned()
            .unwrap_or_else(|| Rc::from(""))
    }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    /// Called after the opening `/*`. Nested openers must each be closed.
    fn block_comment(&mut self, diagnostics: &mut Diagnostics) {
        let mut depth = 1usize;

        while depth > 0 {
            if self.is_at_end() {
                let source_line = self.source_line(self.start_line).to_string();
                diagnostics.report(
                    Diagnostic::recoverable(
                        DiagnosticKind::UnterminatedBlockComment,
                        self.start_line,
                        self.start_column,
                        vec![source_line],
                    )
                    .with_span(Span::new(self.start, self.start + 2)),
                );
                return;
            }

            if self.peek() == '*' && self.peek_at(1) == '/' {
                self.advance();
                self.advance();
                depth -= 1;
            } else if self.peek() == '/' && self.peek_at(1) == '*' {
                self.advance();
                self.advance();
                depth += 1;
            } else {
                self.advance();
            }
        }
    }

    fn string(&mut self, diagnostics: &mut Diagnostics) {
        while self.peek() != '"' && !self.is_at_end() {
            // An escaped quote does not end the string
            if self.peek() == '\\' && self.peek_at(1) != '\0' {
                self.advance();
            }
            self.advance();
        }

        if self.is_at_end() {
            let source_line = self.source_line(self.start_line).to_string();
            diagnostics.report(
                Diagnostic::recoverable(
                    DiagnosticKind::UnterminatedString,
                    self.start_line,
                    self.start_column,
                    vec![source_line],
                )
                .with_span(Span::new(self.start, self.current)),
            );
            return;
        }

        // Consume the closing "
        self.advance();

        let body: String = self.chars[self.start + 1..self.current - 1].iter().collect();
        self.add_literal_token(TokenKind::String, Some(TokenLiteral::Text(unescape(&body))));
    }

    fn number(&mut self) {
        let leading_dot = self.chars[self.start] == '.';

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_double = leading_dot;

        // Look for fractional part
        if !leading_dot && self.peek() == '.' && self.peek_at(1).is_ascii_digit() {
            is_double = true;
            // Consume the "."
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();

        if !is_double {
            if let Ok(value) = text.parse::<i32>() {
                self.add_literal_token(TokenKind::Integer, Some(TokenLiteral::Integer(value)));
                return;
            }
        }

        // Digit runs always parse as f64; overflowing integers land here too.
        let value = text.parse::<f64>().unwrap_or(f64::INFINITY);
        self.add_literal_token(TokenKind::Double, Some(TokenLiteral::Double(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        match self.keywords.lookup(&text) {
            Some(kind) => self.add_token(kind),
            None => self.add_literal_token(TokenKind::Identifier, Some(TokenLiteral::Text(text))),
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_literal_token(kind, None);
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Option<TokenLiteral>) {
        let token = Token::new(
            kind,
            self.lexeme(),
            literal,
            self.start_line,
            self.start_column,
            self.source_line(self.start_line),
            Span::new(self.start, self.current),
        );
        tracing::trace!(%token, line = token.line, column = token.column, "token");
        self.tokens.push(token);
    }
}

/// Decodes backslash escapes in a string literal body. Unknown escapes are
/// kept as written.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_known_sequences() {
        assert_eq!(unescape(r#"a\nb\tc\\d\"e"#), "a\nb\tc\\d\"e");
    }

    #[test]
    fn unescape_keeps_unknown_sequences() {
        assert_eq!(unescape(r"\q"), r"\q");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn respelled_keyword_replaces_old_spelling() {
        let mut keywords = Keywords::new();
        assert!(keywords.set_spelling("true", "wahr"));
        assert_eq!(keywords.lookup("wahr"), Some(TokenKind::True));
        assert_eq!(keywords.lookup("true"), None);
        assert_eq!(keywords.spelling("true"), Some("wahr"));
        assert!(!keywords.set_spelling("lambda", "fn"));
    }

    #[test]
    fn columns_reset_after_newline() {
        let mut diagnostics = Diagnostics::new();
        let tokens = lex("1\n  22", &mut diagnostics);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!(&*tokens[1].source_line, "  22");
        assert_eq!(tokens[1].span, Span::new(4, 6));
    }
}
