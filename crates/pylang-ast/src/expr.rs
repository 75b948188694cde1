//! Expression definitions for the AST

use super::*;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EXPR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique expression identity used to key inferred types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExprId(pub u64);

impl ExprId {
    /// Allocate an id never handed out before in this process.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Expression node. Ids are assigned on construction and never read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(rename = "location")]
    pub span: Span,
    #[serde(rename = "exprId", skip_deserializing, default = "ExprId::fresh")]
    pub id: ExprId,
    #[serde(flatten)]
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            span,
            id: ExprId::fresh(),
            kind,
        }
    }

    /// Name of a plain identifier expression.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier { name } => Some(name),
            _ => None,
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExprKind {
    IntegerLiteral {
        value: i32,
    },

    StringLiteral {
        value: String,
    },

    BooleanLiteral {
        value: bool,
    },

    NoneLiteral,

    /// Variable reference
    Identifier {
        name: String,
    },

    BinaryExpr {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },

    UnaryExpr {
        operator: UnaryOp,
        operand: Box<Expr>,
    },

    /// `then_expr if condition else else_expr`
    IfExpr {
        condition: Box<Expr>,
        #[serde(rename = "thenExpr")]
        then_expr: Box<Expr>,
        #[serde(rename = "elseExpr")]
        else_expr: Box<Expr>,
    },

    /// Call of a global function or class constructor; `function` is an identifier
    CallExpr {
        function: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `obj.m(args)`; `method` is a member expression
    MethodCallExpr {
        method: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `obj.member`
    MemberExpr {
        object: Box<Expr>,
        member: Identifier,
    },

    /// `list[index]`
    IndexExpr {
        list: Box<Expr>,
        index: Box<Expr>,
    },

    /// `[e1, e2, ...]`
    ListExpr {
        elements: Vec<Expr>,
    },
}

impl ExprKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            ExprKind::IntegerLiteral { .. }
                | ExprKind::StringLiteral { .. }
                | ExprKind::BooleanLiteral { .. }
                | ExprKind::NoneLiteral
        )
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "//")]
    FloorDiv,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
    #[serde(rename = "is")]
    Is,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Sub | BinaryOp::Mul | BinaryOp::FloorDiv | BinaryOp::Mod)
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Is => "is",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "not")]
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
