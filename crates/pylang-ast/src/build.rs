//! Programmatic AST construction, mainly for tests of later passes.
//!
//! Every node gets its own synthetic span (line 0, distinct column) so
//! that diagnostics on different nodes never collapse into one.

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_COL: AtomicU32 = AtomicU32::new(1);

pub fn span() -> Span {
    let col = NEXT_COL.fetch_add(1, Ordering::Relaxed);
    Span::new(0, col, 0, col)
}

pub fn ident(name: &str) -> Identifier {
    Identifier::new(name, span())
}

// =============================================================================
// Types
// =============================================================================

pub fn class_ty(name: &str) -> Node<TypeAnnotation> {
    Node::new(TypeAnnotation::class(name), span())
}

pub fn list_ty(element: Node<TypeAnnotation>) -> Node<TypeAnnotation> {
    Node::new(
        TypeAnnotation::ListType {
            element_type: Box::new(element),
        },
        span(),
    )
}

/// Return annotation of a function written without `->`.
pub fn no_return() -> Node<TypeAnnotation> {
    class_ty("<None>")
}

pub fn typed_var(name: &str, ty: Node<TypeAnnotation>) -> TypedVar {
    TypedVar {
        span: span(),
        identifier: ident(name),
        annotation: ty,
    }
}

// =============================================================================
// Declarations
// =============================================================================

pub fn var_def(name: &str, ty: Node<TypeAnnotation>, value: Expr) -> Node<Decl> {
    Node::new(
        Decl::VarDef {
            var: typed_var(name, ty),
            value,
        },
        span(),
    )
}

pub fn func_def(
    name: &str,
    params: Vec<TypedVar>,
    return_type: Node<TypeAnnotation>,
    declarations: Vec<Node<Decl>>,
    statements: Vec<Node<Stmt>>,
) -> Node<Decl> {
    Node::new(
        Decl::FuncDef(FuncDef {
            name: ident(name),
            params,
            return_type,
            declarations,
            statements,
        }),
        span(),
    )
}

pub fn class_def(name: &str, super_class: &str, declarations: Vec<Node<Decl>>) -> Node<Decl> {
    Node::new(
        Decl::ClassDef(ClassDef {
            name: ident(name),
            super_class: ident(super_class),
            declarations,
        }),
        span(),
    )
}

pub fn global_decl(name: &str) -> Node<Decl> {
    Node::new(Decl::GlobalDecl { variable: ident(name) }, span())
}

pub fn nonlocal_decl(name: &str) -> Node<Decl> {
    Node::new(Decl::NonLocalDecl { variable: ident(name) }, span())
}

// =============================================================================
// Expressions
// =============================================================================

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, span())
}

pub fn int(value: i32) -> Expr {
    expr(ExprKind::IntegerLiteral { value })
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::StringLiteral {
        value: value.to_string(),
    })
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::BooleanLiteral { value })
}

pub fn none() -> Expr {
    expr(ExprKind::NoneLiteral)
}

pub fn id(name: &str) -> Expr {
    expr(ExprKind::Identifier {
        name: name.to_string(),
    })
}

pub fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    expr(ExprKind::BinaryExpr {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    })
}

pub fn unary(operator: UnaryOp, operand: Expr) -> Expr {
    expr(ExprKind::UnaryExpr {
        operator,
        operand: Box::new(operand),
    })
}

pub fn if_expr(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
    expr(ExprKind::IfExpr {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

pub fn call(function: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::CallExpr {
        function: Box::new(id(function)),
        args,
    })
}

pub fn member(object: Expr, name: &str) -> Expr {
    expr(ExprKind::MemberExpr {
        object: Box::new(object),
        member: ident(name),
    })
}

pub fn method_call(object: Expr, method: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::MethodCallExpr {
        method: Box::new(member(object, method)),
        args,
    })
}

pub fn index(list: Expr, index: Expr) -> Expr {
    expr(ExprKind::IndexExpr {
        list: Box::new(list),
        index: Box::new(index),
    })
}

pub fn list(elements: Vec<Expr>) -> Expr {
    expr(ExprKind::ListExpr { elements })
}

// =============================================================================
// Statements
// =============================================================================

pub fn expr_stmt(expr: Expr) -> Node<Stmt> {
    Node::new(Stmt::ExprStmt { expr }, span())
}

pub fn assign(targets: Vec<Expr>, value: Expr) -> Node<Stmt> {
    Node::new(Stmt::AssignStmt { targets, value }, span())
}

pub fn if_stmt(condition: Expr, then_body: Vec<Node<Stmt>>, else_body: Vec<Node<Stmt>>) -> Node<Stmt> {
    Node::new(
        Stmt::IfStmt {
            condition,
            then_body,
            else_body,
        },
        span(),
    )
}

pub fn while_stmt(condition: Expr, body: Vec<Node<Stmt>>) -> Node<Stmt> {
    Node::new(Stmt::WhileStmt { condition, body }, span())
}

pub fn for_stmt(name: &str, iterable: Expr, body: Vec<Node<Stmt>>) -> Node<Stmt> {
    Node::new(
        Stmt::ForStmt {
            identifier: id(name),
            iterable,
            body,
        },
        span(),
    )
}

pub fn ret(value: Option<Expr>) -> Node<Stmt> {
    Node::new(Stmt::ReturnStmt { value }, span())
}

pub fn program(declarations: Vec<Node<Decl>>, statements: Vec<Node<Stmt>>) -> Program {
    Program::new(declarations, statements)
}
