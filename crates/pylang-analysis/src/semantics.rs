//! Scoping, override and shadowing rules.
//!
//! Runs over the scopes built by the declaration pass, re-entering each by
//! name. `global` and `nonlocal` declarations that pass their checks are
//! bound as aliases in the declaring function's scope.

use crate::builtins;
use crate::declarations::Declarations;
use crate::error::SemanticError;
use crate::hierarchy::ClassHierarchy;
use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use crate::types::Type;
use pylang_ast::{ClassDef, Decl, Errors, FuncDef, Identifier, Node, Program, Stmt, TypeAnnotation};
use std::collections::{HashMap, HashSet};

pub fn check_semantics(
    program: &Program,
    declarations: &mut Declarations,
    hierarchy: &ClassHierarchy,
    errors: &mut Errors,
) {
    let mut checker = SemanticsChecker::new(declarations, hierarchy, errors);
    checker.check_program(program);
    tracing::debug!(errors = checker.errors.len(), "semantic checks done");
}

struct SemanticsChecker<'a> {
    scopes: &'a mut ScopeTree<Type>,
    class_scopes: &'a HashMap<String, ScopeId>,
    hierarchy: &'a ClassHierarchy,
    errors: &'a mut Errors,
    current: ScopeId,
    /// Every class name usable in an annotation
    classes: HashSet<String>,
    /// Module-level names declared before the declaration being checked
    declared_so_far: HashSet<String>,
}

impl<'a> SemanticsChecker<'a> {
    fn new(
        declarations: &'a mut Declarations,
        hierarchy: &'a ClassHierarchy,
        errors: &'a mut Errors,
    ) -> Self {
        let root = declarations.scopes.root();
        let mut classes: HashSet<String> = hierarchy.classes().map(str::to_string).collect();
        classes.insert("<None>".to_string());
        let declared_so_far = builtins::builtin_functions()
            .into_iter()
            .chain(builtins::builtin_classes())
            .map(|(name, _)| name.to_string())
            .collect();
        Self {
            scopes: &mut declarations.scopes,
            class_scopes: &declarations.class_scopes,
            hierarchy,
            errors,
            current: root,
            classes,
            declared_so_far,
        }
    }

    fn check_program(&mut self, program: &Program) {
        for decl in &program.declarations {
            match &decl.value {
                Decl::VarDef { var, .. } => self.check_annotation(&var.annotation),
                Decl::FuncDef(func) => self.check_func(func),
                Decl::ClassDef(class) => self.check_class(class),
                Decl::GlobalDecl { .. } | Decl::NonLocalDecl { .. } => {}
            }
            self.declared_so_far.insert(decl.value.name().to_string());
        }
        for stmt in &program.statements {
            if stmt.value.is_return() {
                SemanticError::TopLevelReturn.report(stmt.span, self.errors);
            }
        }
    }

    fn is_class_name(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    fn check_annotation(&mut self, annotation: &Node<TypeAnnotation>) {
        let name = annotation.value.base_class_name();
        if !self.is_class_name(name) {
            SemanticError::UnknownClass(name.to_string()).report(annotation.span, self.errors);
        }
    }

    fn check_shadowing(&mut self, id: &Identifier) {
        if self.is_class_name(&id.name) {
            SemanticError::ShadowsClass(id.name.clone()).report(id.span, self.errors);
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn check_func(&mut self, func: &FuncDef) {
        let Some(scope) = self.scopes.child(self.current, &func.name.name) else {
            return;
        };
        self.check_shadowing(&func.name);
        for param in &func.params {
            self.check_annotation(&param.annotation);
            self.check_shadowing(&param.identifier);
        }
        self.check_annotation(&func.return_type);

        let parent = std::mem::replace(&mut self.current, scope);
        for decl in &func.declarations {
            match &decl.value {
                Decl::NonLocalDecl { variable } => self.check_nonlocal(variable, scope),
                Decl::GlobalDecl { variable } => self.check_global(variable, scope),
                Decl::VarDef { var, .. } => {
                    self.check_annotation(&var.annotation);
                    self.check_shadowing(&var.identifier);
                }
                Decl::FuncDef(inner) => self.check_func(inner),
                Decl::ClassDef(_) => {}
            }
        }
        self.check_assign_targets(&func.statements, scope);
        if Type::from_annotation(&func.return_type.value).is_primitive() {
            self.check_returns(func);
        }
        self.current = parent;
    }

    fn bind_alias(&mut self, variable: &Identifier, scope: ScopeId, ty: Type) {
        if self.scopes.declares(scope, &variable.name) {
            SemanticError::DuplicateDeclaration(variable.name.clone()).report(variable.span, self.errors);
        } else {
            self.scopes.insert(scope, &variable.name, ty);
        }
    }

    fn check_nonlocal(&mut self, variable: &Identifier, scope: ScopeId) {
        let enclosing = self
            .scopes
            .parent(scope)
            .filter(|&p| self.scopes.kind(p) == ScopeKind::Function);
        let binding = enclosing
            .and_then(|p| self.scopes.get_local(p, &variable.name))
            .filter(|ty| ty.is_value_type())
            .cloned();
        match binding {
            Some(ty) => self.bind_alias(variable, scope, ty),
            None => SemanticError::NotNonlocal(variable.name.clone()).report(variable.span, self.errors),
        }
    }

    fn check_global(&mut self, variable: &Identifier, scope: ScopeId) {
        let root = self.scopes.root();
        let binding = if builtins::is_primitive_class(&variable.name) {
            None
        } else {
            self.scopes
                .get_local(root, &variable.name)
                .filter(|ty| ty.is_value_type())
                .cloned()
        };
        match binding {
            Some(ty) => self.bind_alias(variable, scope, ty),
            None => SemanticError::NotGlobal(variable.name.clone()).report(variable.span, self.errors),
        }
    }

    fn check_assign_targets(&mut self, stmts: &[Node<Stmt>], scope: ScopeId) {
        for stmt in stmts {
            match &stmt.value {
                Stmt::AssignStmt { targets, .. } => {
                    for target in targets {
                        self.check_local_target(target, scope);
                    }
                }
                Stmt::ForStmt { identifier, body, .. } => {
                    self.check_local_target(identifier, scope);
                    self.check_assign_targets(body, scope);
                }
                Stmt::IfStmt {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.check_assign_targets(then_body, scope);
                    self.check_assign_targets(else_body, scope);
                }
                Stmt::WhileStmt { body, .. } => self.check_assign_targets(body, scope),
                Stmt::ExprStmt { .. } | Stmt::ReturnStmt { .. } => {}
            }
        }
    }

    fn check_local_target(&mut self, target: &pylang_ast::Expr, scope: ScopeId) {
        if let Some(name) = target.as_identifier() {
            if !self.scopes.declares(scope, name) {
                SemanticError::UndeclaredAssignTarget(name.to_string()).report(target.span, self.errors);
            }
        }
    }

    /// Only `if` statements directly in the body are inspected.
    fn check_returns(&mut self, func: &FuncDef) {
        let has_return = |body: &[Node<Stmt>]| body.iter().any(|s| s.value.is_return());
        for stmt in &func.statements {
            if let Stmt::IfStmt {
                then_body,
                else_body,
                ..
            } = &stmt.value
            {
                if !has_return(then_body) || !has_return(else_body) {
                    SemanticError::MissingReturn(func.name.name.clone()).report(func.name.span, self.errors);
                }
            }
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn check_class(&mut self, class: &ClassDef) {
        let super_id = &class.super_class;
        let super_name = super_id.name.as_str();
        if !self.declared_so_far.contains(super_name) {
            SemanticError::SuperclassNotDefined(super_name.to_string()).report(super_id.span, self.errors);
        } else if builtins::is_primitive_class(super_name) {
            SemanticError::SpecialSuperclass(super_name.to_string()).report(super_id.span, self.errors);
        } else if !matches!(
            self.scopes.get_local(self.scopes.root(), super_name),
            Some(Type::UserDefinedClass { .. })
        ) {
            SemanticError::SuperclassNotClass(super_name.to_string()).report(super_id.span, self.errors);
        }

        let Some(&scope) = self.class_scopes.get(&class.name.name) else {
            return;
        };
        let parent = std::mem::replace(&mut self.current, scope);
        for decl in &class.declarations {
            let member = decl.value.identifier();
            let inherited = self.inherited_member(super_name, &member.name);
            match &decl.value {
                Decl::VarDef { var, .. } => {
                    self.check_annotation(&var.annotation);
                    if inherited.is_some() {
                        SemanticError::AttributeRedefined(member.name.clone()).report(member.span, self.errors);
                    }
                }
                Decl::FuncDef(method) => {
                    if matches!(inherited, Some(ref ty) if !ty.is_func()) {
                        SemanticError::AttributeRedefined(member.name.clone()).report(member.span, self.errors);
                    }
                    self.check_method(method, &class.name.name, inherited.as_ref());
                    self.check_func(method);
                }
                _ => {}
            }
        }
        self.current = parent;
    }

    /// Member `name` as declared by `class` or its nearest ancestor.
    fn inherited_member(&self, class: &str, name: &str) -> Option<Type> {
        self.hierarchy
            .ancestors(class)
            .into_iter()
            .filter_map(|ancestor| self.class_scopes.get(ancestor))
            .find_map(|&scope| self.scopes.get_local(scope, name))
            .cloned()
    }

    fn check_method(&mut self, method: &FuncDef, class: &str, inherited: Option<&Type>) {
        let name = &method.name;
        let receiver_ok = method.params.first().is_some_and(|receiver| {
            matches!(&receiver.annotation.value,
                TypeAnnotation::ClassType { class_name } if class_name == class)
        });
        if !receiver_ok {
            SemanticError::BadReceiver(name.name.clone()).report(name.span, self.errors);
        }
        if name.name == "__init__" && method.params.len() > 1 {
            SemanticError::BadOverride(name.name.clone()).report(name.span, self.errors);
        }

        if let Some(Type::Func { params, ret }) = inherited {
            let own_params: Vec<Type> = method
                .params
                .iter()
                .map(|p| Type::from_annotation(&p.annotation.value))
                .collect();
            let own_ret = Type::from_annotation(&method.return_type.value);
            let same_shape = params.len() == own_params.len()
                && **ret == own_ret
                && params.iter().zip(&own_params).skip(1).all(|(a, b)| a == b);
            if !same_shape {
                SemanticError::BadOverride(name.name.clone()).report(name.span, self.errors);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::analyze_declarations;
    use pylang_ast::build::*;
    use pylang_ast::{BinaryOp, TypedVar};
    use rstest::rstest;

    fn run(p: &Program) -> (Declarations, Vec<String>) {
        let mut errors = Errors::new();
        let hierarchy = ClassHierarchy::build(p);
        let mut decls = analyze_declarations(p, &mut errors);
        check_semantics(p, &mut decls, &hierarchy, &mut errors);
        (decls, errors.iter().map(|e| e.message.clone()).collect())
    }

    fn method(name: &str, class: &str, extra: Vec<TypedVar>, ret: Node<TypeAnnotation>) -> Node<Decl> {
        let mut params = vec![typed_var("self", class_ty(class))];
        params.extend(extra);
        func_def(name, params, ret, vec![], vec![])
    }

    #[test]
    fn unknown_annotation_is_reported() {
        let (_, errs) = run(&program(vec![var_def("x", list_ty(class_ty("Foo")), none())], vec![]));
        assert_eq!(errs, vec!["Invalid type annotation; there is no class named: Foo"]);
    }

    #[test]
    fn nested_list_annotation_checks_innermost_class() {
        let ann = list_ty(list_ty(class_ty("int")));
        let (_, errs) = run(&program(vec![var_def("x", ann, none())], vec![]));
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn global_rules() {
        let p = program(
            vec![
                var_def("x", class_ty("int"), int(0)),
                func_def("foo", vec![], no_return(), vec![], vec![]),
                func_def(
                    "f",
                    vec![],
                    no_return(),
                    vec![
                        global_decl("x"),
                        global_decl("foo"),
                        global_decl("int"),
                        global_decl("missing"),
                    ],
                    vec![assign(vec![id("x")], int(1))],
                ),
            ],
            vec![],
        );
        let (decls, errs) = run(&p);
        assert_eq!(
            errs,
            vec![
                "Not a global variable: foo",
                "Not a global variable: int",
                "Not a global variable: missing",
            ]
        );
        let f = decls.scopes.child(decls.scopes.root(), "f").unwrap();
        assert_eq!(decls.scopes.get_local(f, "x"), Some(&Type::Int));
    }

    #[test]
    fn nonlocal_binds_enclosing_function_variable() {
        let p = program(
            vec![
                var_def("g", class_ty("int"), int(0)),
                func_def(
                    "outer",
                    vec![],
                    no_return(),
                    vec![
                        var_def("count", class_ty("int"), int(0)),
                        func_def(
                            "inner",
                            vec![],
                            no_return(),
                            vec![nonlocal_decl("count"), nonlocal_decl("g")],
                            vec![assign(vec![id("count")], int(1))],
                        ),
                    ],
                    vec![],
                ),
            ],
            vec![],
        );
        let (decls, errs) = run(&p);
        assert_eq!(errs, vec!["Not a nonlocal variable: g"]);
        let outer = decls.scopes.child(decls.scopes.root(), "outer").unwrap();
        let inner = decls.scopes.child(outer, "inner").unwrap();
        assert_eq!(decls.scopes.get_local(inner, "count"), Some(&Type::Int));
    }

    #[test]
    fn nonlocal_at_function_level_one_is_rejected() {
        let p = program(
            vec![
                var_def("x", class_ty("int"), int(0)),
                func_def("f", vec![], no_return(), vec![nonlocal_decl("x")], vec![]),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec!["Not a nonlocal variable: x"]);
    }

    #[test]
    fn assignment_to_outer_variable_needs_declaration() {
        let p = program(
            vec![
                var_def("x", class_ty("int"), int(0)),
                func_def(
                    "f",
                    vec![typed_var("p", class_ty("int"))],
                    no_return(),
                    vec![],
                    vec![
                        assign(vec![id("p")], int(1)),
                        while_stmt(boolean(true), vec![assign(vec![id("x")], int(1))]),
                    ],
                ),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(
            errs,
            vec!["Cannot assign to variable that is not explicitly declared in this scope: x"]
        );
    }

    #[test]
    fn missing_return_on_one_branch() {
        let p = program(
            vec![func_def(
                "f",
                vec![typed_var("a", class_ty("bool"))],
                class_ty("int"),
                vec![],
                vec![if_stmt(id("a"), vec![ret(Some(int(1)))], vec![expr_stmt(int(2))])],
            )],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(
            errs,
            vec!["All paths in this function/method must have a return statement: f"]
        );
    }

    #[test]
    fn missing_return_ignores_loops() {
        let p = program(
            vec![func_def(
                "f",
                vec![],
                class_ty("int"),
                vec![],
                vec![while_stmt(
                    boolean(true),
                    vec![if_stmt(boolean(true), vec![], vec![])],
                )],
            )],
            vec![],
        );
        let (_, errs) = run(&p);
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn top_level_return_is_rejected() {
        let (_, errs) = run(&program(vec![], vec![ret(None)]));
        assert_eq!(errs, vec!["Return statement cannot appear at the top level"]);
    }

    #[rstest]
    #[case("Missing", "Super-class not defined: Missing")]
    #[case("int", "Cannot extend special class: int")]
    #[case("str", "Cannot extend special class: str")]
    #[case("f", "Super-class must be a class: f")]
    #[case("Later", "Super-class not defined: Later")]
    fn superclass_rules(#[case] superclass: &str, #[case] expected: &str) {
        let p = program(
            vec![
                func_def("f", vec![], no_return(), vec![], vec![]),
                class_def("A", superclass, vec![]),
                class_def("Later", "object", vec![]),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec![expected.to_string()]);
    }

    #[test]
    fn receiver_must_be_enclosing_class() {
        let p = program(
            vec![class_def(
                "A",
                "object",
                vec![
                    func_def("m", vec![typed_var("self", class_ty("object"))], no_return(), vec![], vec![]),
                    func_def("n", vec![], no_return(), vec![], vec![]),
                ],
            )],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(
            errs,
            vec![
                "First parameter of the following method must be of the enclosing class: m",
                "First parameter of the following method must be of the enclosing class: n",
            ]
        );
    }

    #[test]
    fn init_takes_only_receiver() {
        let p = program(
            vec![class_def(
                "A",
                "object",
                vec![method("__init__", "A", vec![typed_var("x", class_ty("int"))], no_return())],
            )],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec!["Method overridden with different type signature: __init__"]);
    }

    #[rstest]
    #[case::identical(vec![("int", "int")], "bool", "bool", true)]
    #[case::param_type(vec![("int", "str")], "bool", "bool", false)]
    #[case::return_type(vec![("int", "int")], "bool", "int", false)]
    #[case::arity(vec![], "bool", "bool", false)]
    fn override_signatures(
        #[case] params: Vec<(&str, &str)>,
        #[case] base_ret: &str,
        #[case] derived_ret: &str,
        #[case] ok: bool,
    ) {
        let base_params = vec![typed_var("x", class_ty("int"))];
        let derived_params: Vec<TypedVar> = params
            .iter()
            .map(|(_, derived)| typed_var("x", class_ty(derived)))
            .collect();
        let p = program(
            vec![
                class_def("A", "object", vec![method("m", "A", base_params, class_ty(base_ret))]),
                class_def("B", "A", vec![method("m", "B", derived_params, class_ty(derived_ret))]),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        if ok {
            assert!(errs.is_empty(), "{:?}", errs);
        } else {
            assert_eq!(errs, vec!["Method overridden with different type signature: m"]);
        }
    }

    #[test]
    fn receiver_type_difference_is_not_an_override_error() {
        let p = program(
            vec![
                class_def("A", "object", vec![method("m", "A", vec![], no_return())]),
                class_def("B", "A", vec![]),
                class_def("C", "B", vec![method("m", "C", vec![], no_return())]),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn attribute_cannot_redefine_inherited_member() {
        let p = program(
            vec![
                class_def(
                    "A",
                    "object",
                    vec![
                        var_def("x", class_ty("int"), int(0)),
                        method("m", "A", vec![], no_return()),
                    ],
                ),
                class_def(
                    "B",
                    "A",
                    vec![
                        var_def("x", class_ty("int"), int(1)),
                        var_def("m", class_ty("int"), int(1)),
                    ],
                ),
                class_def("C", "A", vec![method("x", "C", vec![], no_return())]),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(
            errs,
            vec![
                "Cannot re-define attribute: x",
                "Cannot re-define attribute: m",
                "Cannot re-define attribute: x",
            ]
        );
    }

    #[test]
    fn names_may_not_shadow_classes() {
        let p = program(
            vec![
                class_def("A", "object", vec![]),
                func_def(
                    "f",
                    vec![typed_var("A", class_ty("int"))],
                    no_return(),
                    vec![var_def("str", class_ty("int"), int(0))],
                    vec![expr_stmt(binary(int(1), BinaryOp::Add, int(2)))],
                ),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec!["Cannot shadow class name: A", "Cannot shadow class name: str"]);
    }
}
