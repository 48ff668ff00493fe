use crate::ast::{Expr, LiteralValue, TernaryKind};
use crate::error::RuntimeError;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Tree-walking evaluator. Holds no state: there are no variables at this
/// layer, so every evaluation is a pure function of the tree.
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Value, RuntimeError> {
        tracing::trace!(node = expr.node_name(), "evaluating");

        match expr {
            Expr::Literal { value } => Ok(literal_value(value)),
            Expr::Grouping { expr } => self.evaluate(expr),
            Expr::Unary { operator, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(operator, operand_val)
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                match operator.kind {
                    TokenKind::Or => {
                        if left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                    TokenKind::And => {
                        if !left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                    _ => {
                        let right_val = self.evaluate(right)?;
                        self.evaluate_binary_op(operator, left_val, right_val)
                    }
                }
            }
            Expr::Ternary {
                kind,
                condition,
                then_branch,
                else_branch,
            } => match kind {
                TernaryKind::Conditional => {
                    if self.evaluate(condition)?.is_truthy() {
                        self.evaluate(then_branch)
                    } else {
                        self.evaluate(else_branch)
                    }
                }
            },
        }
    }

    fn evaluate_binary_op(
        &self,
        operator: &Token,
        left: Value,
        right: Value,
    ) -> Result<Value, RuntimeError> {
        tracing::trace!(
            operator = %operator.lexeme,
            left = left.type_name(),
            right = right.type_name(),
            "binary"
        );

        match operator.kind {
            TokenKind::Plus => match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
                (Value::String(l), r @ Value::Number(_)) => Ok(Value::String(format!("{}{}", l, r))),
                (l @ Value::Number(_), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
                (l, r) => Err(mismatch(
                    operator,
                    "two numbers or a string",
                    format!("{} and {}", l.type_name(), r.type_name()),
                )),
            },
            TokenKind::Minus => numeric(operator, left, right, |l, r| Value::Number(l - r)),
            TokenKind::Slash => numeric(operator, left, right, |l, r| Value::Number(l / r)),
            TokenKind::Star => numeric(operator, left, right, |l, r| Value::Number(l * r)),
            TokenKind::StarStar => numeric(operator, left, right, |l, r| Value::Number(l.powf(r))),
            TokenKind::Greater => numeric(operator, left, right, |l, r| Value::Bool(l > r)),
            TokenKind::GreaterEqual => numeric(operator, left, right, |l, r| Value::Bool(l >= r)),
            TokenKind::Less => numeric(operator, left, right, |l, r| Value::Bool(l < r)),
            TokenKind::LessEqual => numeric(operator, left, right, |l, r| Value::Bool(l <= r)),
            TokenKind::BitAnd => bitwise(operator, left, right, |l, r| l & r),
            TokenKind::BitOr => bitwise(operator, left, right, |l, r| l | r),
            TokenKind::BitXor => bitwise(operator, left, right, |l, r| l ^ r),
            TokenKind::BitNand => bitwise(operator, left, right, |l, r| !(l & r)),
            TokenKind::EqualEqual => Ok(Value::Bool(left.is_equal(&right))),
            TokenKind::BangEqual => Ok(Value::Bool(!left.is_equal(&right))),
            _ => Err(unsupported(operator)),
        }
    }

    fn evaluate_unary_op(&self, operator: &Token, operand: Value) -> Result<Value, RuntimeError> {
        match operator.kind {
            TokenKind::Minus => match operand {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(mismatch(operator, "a number", other.type_name().to_string())),
            },
            TokenKind::Bang => Ok(Value::Bool(!operand.is_truthy())),
            TokenKind::BitNot => match operand {
                Value::Number(n) => Ok(Value::Number(f64::from(!to_i32(n)))),
                other => Err(mismatch(operator, "a number", other.type_name().to_string())),
            },
            _ => Err(unsupported(operator)),
        }
    }
}

fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Nil => Value::Nil,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Integer(n) => Value::Number(f64::from(*n)),
        LiteralValue::Double(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::String(s.clone()),
    }
}

fn numeric(
    operator: &Token,
    left: Value,
    right: Value,
    apply: impl FnOnce(f64, f64) -> Value,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(apply(l, r)),
        (l, r) => Err(mismatch(
            operator,
            "two numbers",
            format!("{} and {}", l.type_name(), r.type_name()),
        )),
    }
}

fn bitwise(
    operator: &Token,
    left: Value,
    right: Value,
    apply: impl FnOnce(i32, i32) -> i32,
) -> Result<Value, RuntimeError> {
    numeric(operator, left, right, |l, r| {
        Value::Number(f64::from(apply(to_i32(l), to_i32(r))))
    })
}

/// Saturating truncation; NaN becomes 0.
fn to_i32(n: f64) -> i32 {
    n as i32
}

fn mismatch(operator: &Token, expected: &'static str, found: String) -> RuntimeError {
    RuntimeError::OperandMismatch {
        operator: operator.lexeme.clone(),
        expected,
        found,
        line: operator.line,
        column: operator.column,
        span: operator.span,
    }
}

fn unsupported(operator: &Token) -> RuntimeError {
    RuntimeError::UnsupportedOperator {
        operator: operator.lexeme.clone(),
        line: operator.line,
        column: operator.column,
        span: operator.span,
    }
}
