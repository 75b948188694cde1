//! Main type checker struct

use crate::declarations::Declarations;
use crate::helpers::TypeHelpers;
use crate::hierarchy::ClassHierarchy;
use crate::scope::{ScopeId, ScopeTree};
use crate::types::Type;
use pylang_ast::{Errors, Expr, ExprId, Program};
use std::collections::HashMap;

/// Inferred type of every expression, keyed by expression id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTable {
    types: HashMap<ExprId, Type>,
}

impl TypeTable {
    pub fn get(&self, id: ExprId) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn insert(&mut self, id: ExprId, ty: Type) {
        self.types.insert(id, ty);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Main type checker
pub struct TypeChecker<'a> {
    pub(crate) scopes: &'a ScopeTree<Type>,
    pub(crate) class_scopes: &'a HashMap<String, ScopeId>,
    pub(crate) hierarchy: &'a ClassHierarchy,
    pub(crate) errors: &'a mut Errors,
    pub(crate) types: TypeTable,
    /// Scope whose declarations are being checked
    pub(crate) current: ScopeId,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        declarations: &'a Declarations,
        hierarchy: &'a ClassHierarchy,
        errors: &'a mut Errors,
    ) -> Self {
        Self {
            scopes: &declarations.scopes,
            class_scopes: &declarations.class_scopes,
            hierarchy,
            errors,
            types: TypeTable::default(),
            current: declarations.scopes.root(),
        }
    }

    /// Type-check every declaration and statement, consuming the checker.
    pub fn check_program(mut self, program: &Program) -> TypeTable {
        for decl in &program.declarations {
            self.check_decl(decl);
        }
        for stmt in &program.statements {
            self.check_stmt(stmt);
        }
        tracing::debug!(
            expressions = self.types.len(),
            errors = self.errors.len(),
            "type checking done"
        );
        self.types
    }

    /// Store `ty` for `expr` and hand it back.
    pub(crate) fn record(&mut self, expr: &Expr, ty: Type) -> Type {
        self.types.insert(expr.id, ty.clone());
        ty
    }

    /// Run `f` with `scope` as the current scope.
    pub(crate) fn in_scope<R>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> R) -> R {
        let parent = std::mem::replace(&mut self.current, scope);
        let result = f(self);
        self.current = parent;
        result
    }

    pub(crate) fn compatible(&self, def: &Type, val: &Type) -> bool {
        TypeHelpers::is_assignment_compatible(self.hierarchy, def, val)
    }

    pub(crate) fn join(&self, a: &Type, b: &Type) -> Type {
        TypeHelpers::join(self.hierarchy, a, b)
    }

    /// Attribute or method `name` of instances of `ty`, most-derived first.
    pub(crate) fn find_member(&self, ty: &Type, name: &str) -> Option<Type> {
        let class = ty.class_name()?;
        self.hierarchy
            .ancestors(class)
            .into_iter()
            .filter_map(|ancestor| self.class_scopes.get(ancestor))
            .find_map(|&scope| self.scopes.get_local(scope, name))
            .cloned()
    }
}
