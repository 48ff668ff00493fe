use crate::error::Span;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,

    // One or two character tokens
    StarStar,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    RightShift,
    Less,
    LessEqual,
    LeftShift,

    // Literals
    Identifier,
    String,
    Integer,
    Double,

    // Keywords
    And,
    Or,
    BitOr,
    BitAnd,
    BitNot,
    BitXor,
    BitNand,
    Class,
    If,
    Else,
    True,
    False,
    Nil,
    Function,
    Return,
    While,
    For,
    Print,
    Super,
    This,
    Var,

    // Special
    Eof,
}

impl TokenKind {
    /// Keywords that begin a statement; the parser resynchronizes on these.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Function
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Minus => "MINUS",
            TokenKind::Plus => "PLUS",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Slash => "SLASH",
            TokenKind::Star => "STAR",
            TokenKind::Question => "QUESTION",
            TokenKind::Colon => "COLON",
            TokenKind::StarStar => "STAR_STAR",
            TokenKind::Bang => "BANG",
            TokenKind::BangEqual => "BANG_EQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::EqualEqual => "EQUAL_EQUAL",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::RightShift => "RIGHT_SHIFT",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::LeftShift => "LEFT_SHIFT",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            TokenKind::Integer => "INTEGER",
            TokenKind::Double => "DOUBLE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::BitOr => "B_OR",
            TokenKind::BitAnd => "B_AND",
            TokenKind::BitNot => "B_NOT",
            TokenKind::BitXor => "B_XOR",
            TokenKind::BitNand => "B_NAND",
            TokenKind::Class => "CLASS",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Nil => "NIL",
            TokenKind::Function => "FUNCTION",
            TokenKind::Return => "RETURN",
            TokenKind::While => "WHILE",
            TokenKind::For => "FOR",
            TokenKind::Print => "PRINT",
            TokenKind::Super => "SUPER",
            TokenKind::This => "THIS",
            TokenKind::Var => "VAR",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded payload of a literal or identifier token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenLiteral {
    Text(String),
    Integer(i32),
    Double(f64),
}

impl fmt::Display for TokenLiteral {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenLiteral::Text(s) => write!(f, "{}", s),
            TokenLiteral::Integer(n) => write!(f, "{}", n),
            TokenLiteral::Double(n) => write!(f, "{:?}", n),
        }
    }
}

/// Immutable unit produced by the lexer.
///
/// `line` and `column` are 1-based and point at the first character of the
/// lexeme. `source_line` is shared by every token on the same line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<TokenLiteral>,
    pub line: usize,
    pub column: usize,
    pub source_line: Rc<str>,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: String,
        literal: Option<TokenLiteral>,
        line: usize,
        column: usize,
        source_line: Rc<str>,
        span: Span,
    ) -> Self {
        Self {
            kind,
            lexeme,
            literal,
            line,
            column,
            source_line,
            span,
        }
    }

    /// A token with no source behind it, for building trees by hand.
    pub fn synthetic(kind: TokenKind, lexeme: &str) -> Self {
        Self::new(kind, lexeme.to_string(), None, 0, 0, Rc::from(""), Span::default())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.lexeme)?;
        match &self.literal {
            Some(literal) => write!(f, " {}", literal),
            None => write!(f, " null"),
        }
    }
}
