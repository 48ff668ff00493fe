use crate::ast::{Expr, LiteralValue};
use crate::error::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::token::{Token, TokenKind, TokenLiteral};

/// Deepest nesting (operand entries plus binary folds) accepted before the
/// parser gives up.
pub const DEFAULT_MAX_DEPTH: usize = 128;

type ParseResult<T> = Result<T, Diagnostic>;

/// Precedence-climbing recursive descent over a token sequence.
///
/// Every parse error is fatal for the expression being parsed: the error is
/// reported and no tree is produced for it.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::synthetic(TokenKind::Eof, ""));
        }

        Self {
            tokens,
            current: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses a single expression, optionally followed by `;`.
    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Option<Expr> {
        match self.expression() {
            Ok(expr) => {
                self.match_kinds(&[TokenKind::Semicolon]);
                if !self.is_at_end() {
                    let next = self.peek();
                    tracing::warn!(
                        lexeme = %next.lexeme,
                        line = next.line,
                        column = next.column,
                        "ignoring input after expression"
                    );
                }
                Some(expr)
            }
            Err(diagnostic) => {
                diagnostics.report(diagnostic);
                None
            }
        }
    }

    /// Parses `;`-separated expressions until end of input. A malformed
    /// expression is reported, skipped via [`Parser::synchronize`], and
    /// parsing carries on with the next one.
    pub fn parse_program(&mut self, diagnostics: &mut Diagnostics) -> Vec<Expr> {
        let mut expressions = Vec::new();

        while !self.is_at_end() {
            match self.terminated_expression() {
                Ok(expr) => expressions.push(expr),
                Err(diagnostic) => {
                    diagnostics.report(diagnostic);
                    self.synchronize();
                }
            }
        }

        tracing::debug!(expressions = expressions.len(), "parsing complete");
        expressions
    }

    fn terminated_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.expression()?;

        if !self.match_kinds(&[TokenKind::Semicolon]) && !self.is_at_end() {
            return Err(self.error(self.peek(), DiagnosticKind::ExpectedSemicolon));
        }

        Ok(expr)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.conditional()
    }

    // Both branches sit at equality precedence, so a second `?` needs parens.
    fn conditional(&mut self) -> ParseResult<Expr> {
        let expr = self.equality()?;

        if self.match_kinds(&[TokenKind::Question]) {
            let then_branch = self.equality()?;
            self.consume(TokenKind::Colon, DiagnosticKind::UnterminatedTernary)?;
            let else_branch = self.equality()?;
            return Ok(Expr::conditional(expr, then_branch, else_branch));
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::BangEqual, TokenKind::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.left_associative(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::logic,
        )
    }

    fn logic(&mut self) -> ParseResult<Expr> {
        self.left_associative(
            &[
                TokenKind::And,
                TokenKind::Or,
                TokenKind::BitOr,
                TokenKind::BitAnd,
                TokenKind::BitXor,
                TokenKind::BitNand,
            ],
            Self::addition,
        )
    }

    fn addition(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::Plus, TokenKind::Minus], Self::multiplication)
    }

    fn multiplication(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::Slash, TokenKind::Star], Self::exponent)
    }

    // Folds left like every other level: 2 ** 3 ** 2 is (2 ** 3) ** 2.
    fn exponent(&mut self) -> ParseResult<Expr> {
        self.left_associative(&[TokenKind::StarStar], Self::unary)
    }

    /// One operand at the next-tighter level, then fold `op operand` pairs
    /// onto the left. Every fold deepens the tree by one level, so each one
    /// is charged against the nesting limit until the chain ends.
    fn left_associative(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let entry_depth = self.depth;
        let result = self.fold_left(operators, operand);
        self.depth = entry_depth;
        result
    }

    fn fold_left(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;

        while self.match_kinds(operators) {
            let operator = self.previous().clone();
            self.descend()?;
            let right = operand(self)?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        self.descend()?;
        let result = self.prefix();
        self.depth -= 1;
        result
    }

    fn descend(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(self.error(self.peek(), DiagnosticKind::NestingTooDeep));
        }
        self.depth += 1;
        Ok(())
    }

    fn prefix(&mut self) -> ParseResult<Expr> {
        if self.match_kinds(&[TokenKind::Bang, TokenKind::Minus, TokenKind::BitNot]) {
            let operator = self.previous().clone();
            let operand = self.unary()?;
            return Ok(Expr::unary(operator, operand));
        }

        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_kinds(&[TokenKind::False]) {
            return Ok(Expr::literal(LiteralValue::Bool(false)));
        }
        if self.match_kinds(&[TokenKind::True]) {
            return Ok(Expr::literal(LiteralValue::Bool(true)));
        }
        if self.match_kinds(&[TokenKind::Nil]) {
            return Ok(Expr::literal(LiteralValue::Nil));
        }

        if self.match_kinds(&[TokenKind::Integer, TokenKind::Double, TokenKind::String]) {
            let token = self.previous();
            let value = match &token.literal {
                Some(TokenLiteral::Integer(n)) => LiteralValue::Integer(*n),
                Some(TokenLiteral::Double(n)) => LiteralValue::Double(*n),
                Some(TokenLiteral::Text(s)) => LiteralValue::String(s.clone()),
                None => return Err(self.error(token, DiagnosticKind::ExpectedExpression)),
            };
            return Ok(Expr::literal(value));
        }

        if self.match_kinds(&[TokenKind::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, DiagnosticKind::UnclosedParenthesis)?;
            return Ok(Expr::grouping(expr));
        }

        Err(self.error(self.peek(), DiagnosticKind::ExpectedExpression))
    }

    /// Skips to the next statement boundary: just past a `;`, or just before
    /// a statement keyword.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            if self.peek().kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }

    fn error(&self, token: &Token, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic::fatal(
            kind,
            token.line,
            token.column,
            vec![token.source_line.to_string(), token.lexeme.clone()],
        )
        .with_span(token.span)
    }

    fn consume(&mut self, kind: TokenKind, error: DiagnosticKind) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(self.peek(), error))
        }
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().kind == kind
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
