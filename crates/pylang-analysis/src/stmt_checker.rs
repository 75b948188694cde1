//! Statement checking methods

use crate::checker::TypeChecker;
use crate::declarations::RETURN_VAL;
use crate::error::SemanticError;
use crate::types::Type;
use pylang_ast::{Expr, ExprKind, Node, Span, Stmt};

impl<'a> TypeChecker<'a> {
    pub(crate) fn check_stmt(&mut self, stmt: &Node<Stmt>) {
        match &stmt.value {
            Stmt::ExprStmt { expr } => {
                self.check_expr(expr);
            }
            Stmt::AssignStmt { targets, value } => self.check_assign(stmt.span, targets, value),
            Stmt::IfStmt {
                condition,
                then_body,
                else_body,
            } => {
                self.check_condition(condition);
                self.check_block(then_body);
                self.check_block(else_body);
            }
            Stmt::WhileStmt { condition, body } => {
                self.check_condition(condition);
                self.check_block(body);
            }
            Stmt::ForStmt {
                identifier,
                iterable,
                body,
            } => {
                self.check_for(identifier, iterable);
                self.check_block(body);
            }
            Stmt::ReturnStmt { value } => self.check_return(stmt.span, value.as_ref()),
        }
    }

    fn check_block(&mut self, body: &[Node<Stmt>]) {
        for stmt in body {
            self.check_stmt(stmt);
        }
    }

    pub(crate) fn check_condition(&mut self, condition: &Expr) {
        let found = self.check_expr(condition);
        if found != Type::Bool {
            SemanticError::TypeMismatch {
                expected: Type::Bool,
                found,
            }
            .report(condition.span, self.errors);
        }
    }

    fn check_assign(&mut self, span: Span, targets: &[Expr], value: &Expr) {
        let found = self.check_expr(value);
        if targets.len() > 1 && found == Type::list(Type::None) {
            SemanticError::NoneListMultipleAssign.report(span, self.errors);
        }
        for target in targets {
            let expected = self.check_expr(target);
            if let ExprKind::IndexExpr { list, .. } = &target.kind {
                if self.types.get(list.id) == Some(&Type::Str) {
                    SemanticError::NotAList(Type::Str).report(target.span, self.errors);
                    continue;
                }
            }
            if !self.compatible(&expected, &found) {
                SemanticError::TypeMismatch {
                    expected,
                    found: found.clone(),
                }
                .report(span, self.errors);
            }
        }
    }

    fn check_for(&mut self, identifier: &Expr, iterable: &Expr) {
        let var_ty = self.check_expr(identifier);
        let iter_ty = self.check_expr(iterable);
        let element = match &iter_ty {
            Type::Str => Some(Type::Str),
            Type::List(element) => Some((**element).clone()),
            Type::Empty => None,
            other => {
                SemanticError::NotIterable(other.clone()).report(iterable.span, self.errors);
                None
            }
        };
        if let Some(element) = element {
            if !self.compatible(&var_ty, &element) {
                SemanticError::TypeMismatch {
                    expected: var_ty,
                    found: element,
                }
                .report(identifier.span, self.errors);
            }
        }
    }

    fn check_return(&mut self, span: Span, value: Option<&Expr>) {
        let Some(expected) = self.scopes.get_local(self.current, RETURN_VAL).cloned() else {
            if let Some(value) = value {
                self.check_expr(value);
            }
            SemanticError::TopLevelReturn.report(span, self.errors);
            return;
        };
        match value {
            Some(value) => {
                let found = self.check_expr(value);
                if !self.compatible(&expected, &found) {
                    SemanticError::TypeMismatch { expected, found }.report(span, self.errors);
                }
            }
            None if expected != Type::None => {
                SemanticError::MissingReturnValue(expected).report(span, self.errors);
            }
            None => {}
        }
    }
}
