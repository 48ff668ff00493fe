use pretty_assertions::assert_eq;
use yak::ast::{Expr, LiteralValue};
use yak::error::{squiggle, DiagnosticKind, Diagnostics, PipelineError, RuntimeError, Severity};
use yak::evaluator::Evaluator;
use yak::lexer::{lex, Keywords, Lexer};
use yak::parser::Parser;
use yak::printer::print;
use yak::token::{Token, TokenKind, TokenLiteral};
use yak::value::Value;
use yak::{evaluate_source, Config};

fn tokens_of(source: &str) -> (Vec<Token>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = lex(source, &mut diagnostics);
    (tokens, diagnostics)
}

fn kinds_of(source: &str) -> Vec<TokenKind> {
    tokens_of(source).0.iter().map(|t| t.kind).collect()
}

fn parse_one(source: &str) -> Expr {
    let (tokens, mut diagnostics) = tokens_of(source);
    let expr = Parser::new(tokens).parse(&mut diagnostics);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    expr.expect("expression")
}

fn printed(source: &str) -> String {
    print(&parse_one(source))
}

fn eval(source: &str) -> Result<Value, RuntimeError> {
    Evaluator::new().evaluate(&parse_one(source))
}

fn number(n: f64) -> Expr {
    Expr::literal(LiteralValue::Double(n))
}

fn int(n: i32) -> Expr {
    Expr::literal(LiteralValue::Integer(n))
}

fn op(kind: TokenKind, lexeme: &str) -> Token {
    Token::synthetic(kind, lexeme)
}

// ============================================================================
// Lexer
// ============================================================================

#[test]
fn lexing_always_ends_with_a_single_eof() {
    for source in ["", "1 + 2", "\"open", "/* open", "@@@", "a\nb\n", "(((", "1 // tail"] {
        let (tokens, _) = tokens_of(source);
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1, "source {:?}", source);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}

#[test]
fn tokens_carry_lexeme_literal_and_position() {
    let (tokens, diagnostics) = tokens_of("1 + 2.5");
    assert!(diagnostics.is_empty());

    let summary: Vec<_> = tokens
        .iter()
        .map(|t| (t.kind, t.lexeme.as_str(), t.literal.clone(), t.line, t.column))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TokenKind::Integer, "1", Some(TokenLiteral::Integer(1)), 1, 1),
            (TokenKind::Plus, "+", None, 1, 3),
            (TokenKind::Double, "2.5", Some(TokenLiteral::Double(2.5)), 1, 5),
            (TokenKind::Eof, "", None, 1, 8),
        ]
    );
    assert!(tokens.iter().all(|t| &*t.source_line == "1 + 2.5"));
}

#[test]
fn two_character_operators_are_greedy() {
    assert_eq!(
        kinds_of("!= == <= >= << >> ** ! = < > * ? : / ;"),
        vec![
            TokenKind::BangEqual,
            TokenKind::EqualEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::LeftShift,
            TokenKind::RightShift,
            TokenKind::StarStar,
            TokenKind::Bang,
            TokenKind::Equal,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::Star,
            TokenKind::Question,
            TokenKind::Colon,
            TokenKind::Slash,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn dot_is_punctuation_unless_a_digit_follows() {
    assert_eq!(
        kinds_of(". 5"),
        vec![TokenKind::Dot, TokenKind::Integer, TokenKind::Eof]
    );

    let (tokens, _) = tokens_of(".5");
    assert_eq!(tokens[0].kind, TokenKind::Double);
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Double(0.5)));
}

#[test]
fn integer_overflow_becomes_double() {
    let (tokens, _) = tokens_of("99999999999999999999");
    assert_eq!(tokens[0].kind, TokenKind::Double);
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Double(1e20)));
}

#[test]
fn integer_literals_are_32_bit() {
    let (tokens, _) = tokens_of("2147483647 2147483648");
    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Integer(i32::MAX)));
    assert_eq!(tokens[1].kind, TokenKind::Double);
    assert_eq!(tokens[1].literal, Some(TokenLiteral::Double(2147483648.0)));
}

#[test]
fn escaped_quote_does_not_close_a_string() {
    let (tokens, diagnostics) = tokens_of(r#""say \"hi\"" 1"#);
    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Text("say \"hi\"".to_string())));
    assert_eq!(tokens[1].kind, TokenKind::Integer);

    let (tokens, diagnostics) = tokens_of(r#""a\" + "b""#);
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![TokenKind::String, TokenKind::Identifier, TokenKind::Eof]
    );
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Text("a\" + ".to_string())));
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::UnterminatedString]);
}

#[test]
fn strings_span_lines_and_decode_escapes() {
    let (tokens, diagnostics) = tokens_of("\"a\nb\\t\" 1");
    assert!(diagnostics.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].lexeme, "\"a\nb\\t\"");
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Text("a\nb\t".to_string())));
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));

    assert_eq!(tokens[1].kind, TokenKind::Integer);
    assert_eq!((tokens[1].line, tokens[1].column), (2, 6));
}

#[test]
fn nested_block_comment_is_skipped_entirely() {
    let (tokens, diagnostics) = tokens_of("/* a /* b */ c */ 5");
    assert!(diagnostics.is_empty());
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Integer(5)));
}

#[test]
fn line_comment_runs_to_end_of_line() {
    assert_eq!(
        kinds_of("1 // 2 3\n4"),
        vec![TokenKind::Integer, TokenKind::Integer, TokenKind::Eof]
    );
}

#[test]
fn unterminated_string_is_recoverable() {
    let (tokens, diagnostics) = tokens_of("\"abc");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);

    let reported: Vec<_> = diagnostics.iter().collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].kind, DiagnosticKind::UnterminatedString);
    assert_eq!(reported[0].severity, Severity::Recoverable);
    assert_eq!((reported[0].line, reported[0].column), (1, 1));
}

#[test]
fn unterminated_block_comment_is_recoverable() {
    let (tokens, diagnostics) = tokens_of("1 /* a /* b */");
    assert_eq!(tokens.len(), 2);
    let reported: Vec<_> = diagnostics.iter().collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].kind, DiagnosticKind::UnterminatedBlockComment);
    assert!(!diagnostics.has_fatal());
}

#[test]
fn unexpected_character_is_skipped() {
    let (tokens, diagnostics) = tokens_of("1 @ 2");
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![TokenKind::Integer, TokenKind::Integer, TokenKind::Eof]
    );

    let reported: Vec<_> = diagnostics.iter().collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].kind, DiagnosticKind::UnexpectedCharacter);
    assert_eq!((reported[0].line, reported[0].column), (1, 3));
    assert_eq!(reported[0].details, vec!["@".to_string(), "1 @ 2".to_string()]);
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(
        kinds_of("true false nil and or not b_or b_and b_not b_xor b_nand class var"),
        vec![
            TokenKind::True,
            TokenKind::False,
            TokenKind::Nil,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Bang,
            TokenKind::BitOr,
            TokenKind::BitAnd,
            TokenKind::BitNot,
            TokenKind::BitXor,
            TokenKind::BitNand,
            TokenKind::Class,
            TokenKind::Var,
            TokenKind::Eof,
        ]
    );

    let (tokens, _) = tokens_of("_foo1 truthy");
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].literal, Some(TokenLiteral::Text("_foo1".to_string())));
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
}

#[test]
fn keyword_spellings_are_configurable() {
    let mut keywords = Keywords::new();
    keywords.set_spelling("true", "wahr");

    let mut diagnostics = Diagnostics::new();
    let tokens = Lexer::new("wahr true", &keywords).scan_tokens(&mut diagnostics);
    assert_eq!(tokens[0].kind, TokenKind::True);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
}

// ============================================================================
// Parser and printer
// ============================================================================

#[test]
fn multiplication_binds_tighter_than_addition() {
    let expr = parse_one("1 + 2 * 3");
    let expected = Expr::binary(
        int(1),
        op(TokenKind::Plus, "+"),
        Expr::binary(int(2), op(TokenKind::Star, "*"), int(3)),
    );
    assert!(expr.same_shape(&expected), "got {:?}", expr);
    assert_eq!(print(&expr), "(+ 1 (* 2 3))");
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(printed("8 - 3 - 2"), "(- (- 8 3) 2)");
    assert_eq!(eval("8 - 3 - 2"), Ok(Value::Number(3.0)));
}

#[test]
fn exponent_folds_left() {
    assert_eq!(printed("2 ** 3 ** 2"), "(** (** 2 3) 2)");
    assert_eq!(eval("2 ** 3 ** 2"), Ok(Value::Number(64.0)));
    assert_eq!(printed("2 * 3 ** 2"), "(* 2 (** 3 2))");
}

#[test]
fn precedence_ladder() {
    assert_eq!(printed("1 < 2 == true"), "(== (< 1 2) true)");
    assert_eq!(printed("1 + 2 b_or 3 < 4"), "(< (b_or (+ 1 2) 3) 4)");
    assert_eq!(printed("true and false or nil"), "(or (and true false) nil)");
    assert_eq!(printed("-!true"), "(- (! true))");
    assert_eq!(printed("(1 + 2) * 3"), "(* (group (+ 1 2)) 3)");
    assert_eq!(printed("\"hi\" + 1.5"), "(+ hi 1.5)");
    assert_eq!(printed("b_not 2.0"), "(b_not 2.0)");
}

#[test]
fn ternary_parses_with_equality_branches() {
    assert_eq!(printed("1 < 2 ? 10 : 20"), "(?: (< 1 2) 10 20)");
    assert_eq!(printed("true ? (false ? 1 : 2) : 3"), "(?: true (group (?: false 1 2)) 3)");
}

#[test]
fn unclosed_parenthesis_is_fatal() {
    let (tokens, mut diagnostics) = tokens_of("(1 + 2");
    let expr = Parser::new(tokens).parse(&mut diagnostics);
    assert!(expr.is_none());

    let reported: Vec<_> = diagnostics.iter().collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].kind, DiagnosticKind::UnclosedParenthesis);
    assert_eq!(reported[0].severity, Severity::Fatal);
    assert_eq!((reported[0].line, reported[0].column), (1, 7));
    assert_eq!(reported[0].details[0], "(1 + 2");
}

#[test]
fn missing_colon_is_unterminated_ternary() {
    let (tokens, mut diagnostics) = tokens_of("1 ? 2 3");
    assert!(Parser::new(tokens).parse(&mut diagnostics).is_none());
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::UnterminatedTernary]);
}

#[test]
fn single_expression_parse_ignores_trailing_input() {
    let (tokens, mut diagnostics) = tokens_of("1 2");
    let expr = Parser::new(tokens).parse(&mut diagnostics);
    assert!(diagnostics.is_empty());
    assert_eq!(expr.map(|e| print(&e)), Some("1".to_string()));
}

#[test]
fn program_mode_recovers_after_errors() {
    let (tokens, mut diagnostics) = tokens_of("1 +; 2 * 3; (4");
    let expressions = Parser::new(tokens).parse_program(&mut diagnostics);

    let printed: Vec<_> = expressions.iter().map(print).collect();
    assert_eq!(printed, vec!["(* 2 3)".to_string()]);

    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::ExpectedExpression, DiagnosticKind::UnclosedParenthesis]
    );
    assert!(diagnostics.has_fatal());
}

#[test]
fn nesting_limit_is_configurable() {
    let (tokens, mut diagnostics) = tokens_of("((1))");
    assert!(Parser::new(tokens).with_max_depth(3).parse(&mut diagnostics).is_some());

    let (tokens, mut diagnostics) = tokens_of("(((1)))");
    assert!(Parser::new(tokens).with_max_depth(3).parse(&mut diagnostics).is_none());
    assert_eq!(
        diagnostics.first_fatal().map(|d| d.kind),
        Some(DiagnosticKind::NestingTooDeep)
    );
}

/// Fully parenthesized infix text for a tree whose shape already respects
/// precedence; groupings become parentheses.
fn to_infix(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value } => match value {
            LiteralValue::Nil => "nil".to_string(),
            LiteralValue::Bool(b) => b.to_string(),
            LiteralValue::Integer(n) => n.to_string(),
            LiteralValue::Double(n) => format!("{:?}", n),
            LiteralValue::String(s) => format!("\"{}\"", s),
        },
        Expr::Grouping { expr } => format!("({})", to_infix(expr)),
        Expr::Unary { operator, operand } => format!("{} {}", operator.lexeme, to_infix(operand)),
        Expr::Binary {
            left,
            operator,
            right,
        } => format!("{} {} {}", to_infix(left), operator.lexeme, to_infix(right)),
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
            ..
        } => format!(
            "{} ? {} : {}",
            to_infix(condition),
            to_infix(then_branch),
            to_infix(else_branch)
        ),
    }
}

#[test]
fn printed_trees_survive_a_reparse() {
    let trees = vec![
        Expr::binary(
            Expr::grouping(Expr::binary(int(1), op(TokenKind::Plus, "+"), int(2))),
            op(TokenKind::Star, "*"),
            number(3.5),
        ),
        Expr::conditional(
            Expr::binary(int(1), op(TokenKind::Less, "<"), int(2)),
            Expr::literal(LiteralValue::String("yes".to_string())),
            Expr::grouping(Expr::conditional(
                Expr::literal(LiteralValue::Bool(false)),
                Expr::literal(LiteralValue::Nil),
                Expr::unary(op(TokenKind::Minus, "-"), int(4)),
            )),
        ),
        Expr::binary(
            Expr::binary(int(6), op(TokenKind::BitAnd, "b_and"), int(3)),
            op(TokenKind::EqualEqual, "=="),
            Expr::unary(op(TokenKind::BitNot, "b_not"), int(0)),
        ),
    ];

    for tree in trees {
        let reparsed = parse_one(&to_infix(&tree));
        assert!(reparsed.same_shape(&tree), "{} reparsed as {:?}", to_infix(&tree), reparsed);
        assert_eq!(print(&reparsed), print(&tree));
    }
}

// ============================================================================
// Evaluator
// ============================================================================

#[test]
fn ternary_picks_one_branch() {
    assert_eq!(eval("1 < 2 ? 10 : 20"), Ok(Value::Number(10.0)));
    assert_eq!(eval("1 > 2 ? 10 : 20"), Ok(Value::Number(20.0)));
}

#[test]
fn ternary_never_evaluates_the_other_branch() {
    // A comma has no evaluation rule, so evaluating this branch would fail.
    let poisoned = || Expr::binary(int(1), op(TokenKind::Comma, ","), int(2));
    let evaluator = Evaluator::new();

    let take_then = Expr::conditional(Expr::literal(LiteralValue::Bool(true)), int(1), poisoned());
    assert_eq!(evaluator.evaluate(&take_then), Ok(Value::Number(1.0)));

    let take_else = Expr::conditional(Expr::literal(LiteralValue::Nil), poisoned(), int(2));
    assert_eq!(evaluator.evaluate(&take_else), Ok(Value::Number(2.0)));

    let take_poison = Expr::conditional(Expr::literal(LiteralValue::Bool(true)), poisoned(), int(2));
    assert!(matches!(
        evaluator.evaluate(&take_poison),
        Err(RuntimeError::UnsupportedOperator { .. })
    ));
}

#[test]
fn plus_concatenates_when_text_is_involved() {
    let evaluator = Evaluator::new();
    let text = Expr::binary(
        Expr::literal(LiteralValue::String("n=".to_string())),
        op(TokenKind::Plus, "+"),
        number(5.0),
    );
    assert_eq!(evaluator.evaluate(&text), Ok(Value::String("n=5.0".to_string())));

    let sum = Expr::binary(number(5.0), op(TokenKind::Plus, "+"), number(3.0));
    let value = evaluator.evaluate(&sum);
    assert_eq!(value, Ok(Value::Number(8.0)));
    assert_eq!(value.map(|v| v.to_string()), Ok("8.0".to_string()));

    assert_eq!(eval("2.5 + \"x\""), Ok(Value::String("2.5x".to_string())));
    assert_eq!(eval("\"a\" + \"b\""), Ok(Value::String("ab".to_string())));
}

#[test]
fn equality_never_errors_on_mismatched_types() {
    assert_eq!(eval("\"5\" == 5.0"), Ok(Value::Bool(false)));
    assert_eq!(eval("\"5\" != 5"), Ok(Value::Bool(true)));
    assert_eq!(eval("nil == nil"), Ok(Value::Bool(true)));
    assert_eq!(eval("nil == false"), Ok(Value::Bool(false)));
    assert_eq!(eval("1 == 1.0"), Ok(Value::Bool(true)));
    assert_eq!(eval("\"a\" == \"a\""), Ok(Value::Bool(true)));
}

#[test]
fn truthiness_rules() {
    assert_eq!(eval("!nil"), Ok(Value::Bool(true)));
    assert_eq!(eval("!false"), Ok(Value::Bool(true)));
    assert_eq!(eval("!0"), Ok(Value::Bool(false)));
    assert_eq!(eval("!\"\""), Ok(Value::Bool(false)));
    assert_eq!(eval("0 ? 1 : 2"), Ok(Value::Number(1.0)));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(eval("nil or \"x\""), Ok(Value::String("x".to_string())));
    assert_eq!(eval("1 or 2"), Ok(Value::Number(1.0)));
    assert_eq!(eval("false and 1"), Ok(Value::Bool(false)));
    assert_eq!(eval("1 and 2"), Ok(Value::Number(2.0)));
}

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(eval("7 / 2"), Ok(Value::Number(3.5)));
    assert_eq!(eval("2 ** -1"), Ok(Value::Number(0.5)));
    assert_eq!(eval("9 ** 0.5"), Ok(Value::Number(3.0)));
    assert_eq!(eval("-(1 + 2)"), Ok(Value::Number(-3.0)));
    assert_eq!(eval("3 >= 3"), Ok(Value::Bool(true)));
    assert_eq!(eval("3 < 2.5"), Ok(Value::Bool(false)));
    assert_eq!(eval("1 / 0"), Ok(Value::Number(f64::INFINITY)));
}

#[test]
fn bitwise_operators_work_on_truncated_integers() {
    assert_eq!(eval("b_not 5"), Ok(Value::Number(-6.0)));
    assert_eq!(eval("b_not 2.9"), Ok(Value::Number(-3.0)));
    assert_eq!(eval("6 b_and 3"), Ok(Value::Number(2.0)));
    assert_eq!(eval("6 b_or 3"), Ok(Value::Number(7.0)));
    assert_eq!(eval("6 b_xor 3"), Ok(Value::Number(5.0)));
    assert_eq!(eval("6 b_nand 3"), Ok(Value::Number(-3.0)));
}

#[test]
fn operand_mismatch_is_a_typed_error() {
    assert_eq!(
        eval("\"a\" - 1"),
        Err(RuntimeError::OperandMismatch {
            operator: "-".to_string(),
            expected: "two numbers",
            found: "string and number".to_string(),
            line: 1,
            column: 5,
            span: yak::Span::new(4, 5),
        })
    );

    assert!(matches!(eval("-\"a\""), Err(RuntimeError::OperandMismatch { .. })));
    assert!(matches!(eval("true + 1"), Err(RuntimeError::OperandMismatch { .. })));
    assert!(matches!(eval("nil < 1"), Err(RuntimeError::OperandMismatch { .. })));
    assert!(matches!(eval("b_not \"x\""), Err(RuntimeError::OperandMismatch { .. })));
    assert!(matches!(eval("1 b_or true"), Err(RuntimeError::OperandMismatch { .. })));
}

// ============================================================================
// Pipeline and diagnostics
// ============================================================================

#[test]
fn evaluate_source_runs_every_expression() {
    let values = evaluate_source("1 + 1; \"a\" + \"b\"; nil", &Config::default());
    assert_eq!(
        values,
        Ok(vec![
            Value::Number(2.0),
            Value::String("ab".to_string()),
            Value::Nil,
        ])
    );
}

#[test]
fn evaluate_source_stops_on_fatal_diagnostics() {
    let err = evaluate_source("(1", &Config::default()).unwrap_err();
    assert_eq!(err.exit_code(), DiagnosticKind::UnclosedParenthesis.code());
    assert_eq!(err.to_string(), "1 diagnostic(s), first fatal: unclosed-parenthesis");
    match err {
        PipelineError::Diagnostics(diagnostics) => {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, DiagnosticKind::UnclosedParenthesis);
        }
        other => panic!("expected diagnostics, got {:?}", other),
    }
}

#[test]
fn evaluate_source_continues_past_recoverable_diagnostics() {
    let err = evaluate_source("1 # 2", &Config::default()).unwrap_err();
    assert_eq!(err.exit_code(), DiagnosticKind::ExpectedSemicolon.code());
    assert_eq!(err.to_string(), "2 diagnostic(s), first fatal: expected-semicolon");
    assert_eq!(
        evaluate_source("1 + 2 // fine\n\"open", &Config::default()),
        Ok(vec![Value::Number(3.0)])
    );
}

#[test]
fn long_operator_chain_is_rejected_not_overflowed() {
    let source = format!("{}1", "1 + ".repeat(100_000));
    let err = evaluate_source(&source, &Config::default()).unwrap_err();
    assert_eq!(err.exit_code(), DiagnosticKind::NestingTooDeep.code());

    let source = format!("{}1", "2 * ".repeat(50_000));
    assert!(evaluate_source(&source, &Config::default()).is_err());
}

#[test]
fn operator_chain_within_the_limit_evaluates() {
    let source = format!("{}1", "1 + ".repeat(99));
    assert_eq!(evaluate_source(&source, &Config::default()), Ok(vec![Value::Number(100.0)]));
}

#[test]
fn operator_folds_count_toward_nesting() {
    let (tokens, mut diagnostics) = tokens_of("1 + 2 + 3");
    assert!(Parser::new(tokens).with_max_depth(3).parse(&mut diagnostics).is_some());

    let (tokens, mut diagnostics) = tokens_of("1 + 2 + 3 + 4");
    assert!(Parser::new(tokens).with_max_depth(3).parse(&mut diagnostics).is_none());
    assert_eq!(
        diagnostics.first_fatal().map(|d| d.kind),
        Some(DiagnosticKind::NestingTooDeep)
    );

    // The charge for a finished chain is released.
    let (tokens, mut diagnostics) = tokens_of("(1 + 2) * (3 + 4)");
    assert!(Parser::new(tokens).with_max_depth(4).parse(&mut diagnostics).is_some());
}

#[test]
fn evaluate_source_reports_runtime_errors() {
    let err = evaluate_source("1; 1 - nil", &Config::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Runtime(RuntimeError::OperandMismatch { .. })));
}

#[test]
fn evaluate_source_uses_configured_keywords() {
    let mut config = Config::default();
    config.keywords.set_spelling("true", "wahr");
    config.keywords.set_spelling("nil", "nichts");
    assert_eq!(
        evaluate_source("wahr ? nichts : 1", &config),
        Ok(vec![Value::Nil])
    );
}

#[test]
fn diagnostic_text_points_at_the_column() {
    let (tokens, mut diagnostics) = tokens_of("(1 + 2");
    Parser::new(tokens).parse(&mut diagnostics);
    let text = diagnostics.iter().next().map(|d| d.to_string()).unwrap_or_default();

    assert!(text.starts_with("error[7]:"), "{}", text);
    assert!(text.contains("line 1, column 7"), "{}", text);
    assert!(text.ends_with("(1 + 2\n~~~~~~^"), "{}", text);
    assert_eq!(squiggle(1), "^");
}
