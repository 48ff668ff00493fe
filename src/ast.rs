use crate::token::Token;

/// Constant carried by a `Literal` node. Integers and doubles stay distinct
/// so the printer can show what was written; both evaluate to a number.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Nil,
    Bool(bool),
    Integer(i32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TernaryKind {
    Conditional,
}

impl TernaryKind {
    pub fn symbol(self) -> &'static str {
        match self {
            TernaryKind::Conditional => "?:",
        }
    }
}

/// Closed set of expression shapes. Every traversal matches on it
/// exhaustively, so a new shape has to be handled everywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: LiteralValue,
    },
    Grouping {
        expr: Box<Expr>,
    },
    Unary {
        operator: Token,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Ternary {
        kind: TernaryKind,
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: LiteralValue) -> Self {
        Expr::Literal { value }
    }

    pub fn grouping(expr: Expr) -> Self {
        Expr::Grouping {
            expr: Box::new(expr),
        }
    }

    pub fn unary(operator: Token, operand: Expr) -> Self {
        Expr::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::Ternary {
            kind: TernaryKind::Conditional,
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn node_name(&self) -> &'static str {
        match self {
            Expr::Literal { .. } => "literal",
            Expr::Grouping { .. } => "grouping",
            Expr::Unary { .. } => "unary",
            Expr::Binary { .. } => "binary",
            Expr::Ternary { .. } => "ternary",
        }
    }

    /// Compares shape, operator kinds/lexemes and literals, ignoring source
    /// positions.
    pub fn same_shape(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Literal { value: a }, Expr::Literal { value: b }) => a == b,
            (Expr::Grouping { expr: a }, Expr::Grouping { expr: b }) => a.same_shape(b),
            (
                Expr::Unary { operator: op_a, operand: a },
                Expr::Unary { operator: op_b, operand: b },
            ) => same_operator(op_a, op_b) && a.same_shape(b),
            (
                Expr::Binary { left: la, operator: op_a, right: ra },
                Expr::Binary { left: lb, operator: op_b, right: rb },
            ) => same_operator(op_a, op_b) && la.same_shape(lb) && ra.same_shape(rb),
            (
                Expr::Ternary { kind: ka, condition: ca, then_branch: ta, else_branch: ea },
                Expr::Ternary { kind: kb, condition: cb, then_branch: tb, else_branch: eb },
            ) => ka == kb && ca.same_shape(cb) && ta.same_shape(tb) && ea.same_shape(eb),
            _ => false,
        }
    }
}

fn same_operator(a: &Token, b: &Token) -> bool {
    a.kind == b.kind && a.lexeme == b.lexeme
}
