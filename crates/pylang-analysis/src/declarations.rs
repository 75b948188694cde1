//! Declaration analysis: builds the scope arena

use crate::builtins;
use crate::error::SemanticError;
use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use crate::types::Type;
use pylang_ast::{ClassDef, Decl, Errors, FuncDef, Node, Program};
use std::collections::HashMap;

/// Name of the entry holding a function's declared return type.
pub const RETURN_VAL: &str = "return_val";

/// Scopes produced by the declaration pass
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub scopes: ScopeTree<Type>,
    /// Body scope of every class, builtin `object` included
    pub class_scopes: HashMap<String, ScopeId>,
}

/// Bind every declared name of `program` in its scope.
///
/// Duplicates within one scope are reported and the first binding kept.
pub fn analyze_declarations(program: &Program, errors: &mut Errors) -> Declarations {
    let mut analyzer = DeclarationAnalyzer::new(errors);
    for decl in &program.declarations {
        analyzer.declare(decl);
    }
    tracing::debug!(scopes = analyzer.result.scopes.len(), errors = analyzer.errors.len(), "declarations analyzed");
    analyzer.result
}

struct DeclarationAnalyzer<'e> {
    result: Declarations,
    current: ScopeId,
    errors: &'e mut Errors,
}

impl<'e> DeclarationAnalyzer<'e> {
    fn new(errors: &'e mut Errors) -> Self {
        let mut result = Declarations::default();
        let root = result.scopes.root();
        for (name, ty) in builtins::builtin_functions()
            .into_iter()
            .chain(builtins::builtin_classes())
        {
            result.scopes.insert(root, name, ty);
        }
        let object = result.scopes.add_child(root, "object", ScopeKind::Class);
        for (name, ty) in builtins::object_members() {
            result.scopes.insert(object, name, ty);
        }
        result.class_scopes.insert("object".to_string(), object);
        Self {
            result,
            current: root,
            errors,
        }
    }

    fn declare(&mut self, decl: &Node<Decl>) {
        let ty = match &decl.value {
            Decl::VarDef { var, .. } => Type::from_annotation(&var.annotation.value),
            Decl::FuncDef(func) => self.analyze_func(func),
            Decl::ClassDef(class) => self.analyze_class(class),
            // aliases are bound by the semantics pass
            Decl::GlobalDecl { .. } | Decl::NonLocalDecl { .. } => return,
        };
        let id = decl.value.identifier();
        self.bind(&id.name, id.span, ty);
    }

    fn bind(&mut self, name: &str, span: pylang_ast::Span, ty: Type) {
        if self.result.scopes.declares(self.current, name) {
            SemanticError::DuplicateDeclaration(name.to_string()).report(span, self.errors);
        } else {
            self.result.scopes.insert(self.current, name, ty);
        }
    }

    fn analyze_func(&mut self, func: &FuncDef) -> Type {
        let ret = Type::from_annotation(&func.return_type.value);
        let params: Vec<Type> = func
            .params
            .iter()
            .map(|p| Type::from_annotation(&p.annotation.value))
            .collect();

        let scope = self
            .result
            .scopes
            .add_child(self.current, &func.name.name, ScopeKind::Function);
        let parent = std::mem::replace(&mut self.current, scope);
        self.result.scopes.insert(scope, RETURN_VAL, ret.clone());
        for (param, ty) in func.params.iter().zip(&params) {
            self.bind(param.name(), param.identifier.span, ty.clone());
        }
        for decl in &func.declarations {
            self.declare(decl);
        }
        self.current = parent;

        Type::Func {
            params,
            ret: Box::new(ret),
        }
    }

    fn analyze_class(&mut self, class: &ClassDef) -> Type {
        let name = &class.name.name;
        let scope = self
            .result
            .scopes
            .add_child(self.current, name, ScopeKind::Class);
        self.result.class_scopes.entry(name.clone()).or_insert(scope);

        let parent = std::mem::replace(&mut self.current, scope);
        for decl in &class.declarations {
            self.declare(decl);
        }
        self.current = parent;

        Type::UserDefinedClass {
            name: name.clone(),
            superclass: Some(class.super_class.name.clone()),
        }
    }
}
