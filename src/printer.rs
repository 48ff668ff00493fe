use crate::ast::{Expr, LiteralValue};
use crate::value::format_number;

/// Renders an expression in fully parenthesized prefix form, e.g.
/// `1 + 2 * 3` becomes `(+ 1 (* 2 3))`.
pub fn print(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal { value } => write_literal(out, value),
        Expr::Grouping { expr } => parenthesize(out, "group", &[expr.as_ref()]),
        Expr::Unary { operator, operand } => parenthesize(out, &operator.lexeme, &[operand.as_ref()]),
        Expr::Binary {
            left,
            operator,
            right,
        } => parenthesize(out, &operator.lexeme, &[left.as_ref(), right.as_ref()]),
        Expr::Ternary {
            kind,
            condition,
            then_branch,
            else_branch,
        } => parenthesize(
            out,
            kind.symbol(),
            &[condition.as_ref(), then_branch.as_ref(), else_branch.as_ref()],
        ),
    }
}

fn write_literal(out: &mut String, value: &LiteralValue) {
    match value {
        LiteralValue::Nil => out.push_str("nil"),
        LiteralValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        LiteralValue::Integer(n) => out.push_str(&n.to_string()),
        LiteralValue::Double(n) => out.push_str(&format_number(*n)),
        LiteralValue::String(s) => out.push_str(s),
    }
}

fn parenthesize(out: &mut String, name: &str, children: &[&Expr]) {
    out.push('(');
    out.push_str(name);
    for child in children {
        out.push(' ');
        write_expr(out, child);
    }
    out.push(')');
}
