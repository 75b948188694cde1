//! Statement definitions for the AST

use super::*;

/// Statement kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    /// Expression evaluated for effect
    ExprStmt { expr: Expr },

    /// `t1 = t2 = ... = value`
    AssignStmt { targets: Vec<Expr>, value: Expr },

    IfStmt {
        condition: Expr,
        #[serde(rename = "thenBody")]
        then_body: Vec<Node<Stmt>>,
        #[serde(rename = "elseBody", default)]
        else_body: Vec<Node<Stmt>>,
    },

    WhileStmt {
        condition: Expr,
        body: Vec<Node<Stmt>>,
    },

    /// `for identifier in iterable:`; `identifier` is an identifier expression
    ForStmt {
        identifier: Expr,
        iterable: Expr,
        body: Vec<Node<Stmt>>,
    },

    ReturnStmt {
        #[serde(default)]
        value: Option<Expr>,
    },
}

impl Stmt {
    pub fn is_return(&self) -> bool {
        matches!(self, Stmt::ReturnStmt { .. })
    }
}
