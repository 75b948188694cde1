//! Declaration checking methods

use crate::checker::TypeChecker;
use crate::error::SemanticError;
use crate::types::Type;
use pylang_ast::{Decl, Node};

impl<'a> TypeChecker<'a> {
    pub(crate) fn check_decl(&mut self, decl: &Node<Decl>) {
        match &decl.value {
            Decl::VarDef { var, value } => {
                let declared = Type::from_annotation(&var.annotation.value);
                let found = self.check_expr(value);
                if !self.compatible(&declared, &found) {
                    SemanticError::TypeMismatch {
                        expected: declared,
                        found,
                    }
                    .report(decl.span, self.errors);
                }
            }
            Decl::FuncDef(func) => {
                let Some(scope) = self.scopes.child(self.current, &func.name.name) else {
                    return;
                };
                self.in_scope(scope, |checker| {
                    for inner in &func.declarations {
                        checker.check_decl(inner);
                    }
                    for stmt in &func.statements {
                        checker.check_stmt(stmt);
                    }
                });
            }
            Decl::ClassDef(class) => {
                let Some(&scope) = self.class_scopes.get(&class.name.name) else {
                    return;
                };
                self.in_scope(scope, |checker| {
                    for member in &class.declarations {
                        checker.check_decl(member);
                    }
                });
            }
            Decl::GlobalDecl { .. } | Decl::NonLocalDecl { .. } => {}
        }
    }
}
