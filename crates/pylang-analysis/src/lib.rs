//! # Pylang Analysis
//!
//! Semantic analysis for the pylang compiler: class hierarchy, declaration
//! analysis, scoping and override rules, and type inference.
//!
//! Passes run in order and share one error sink. Type inference only runs
//! on a program the earlier passes accepted.

mod error;
mod types;
mod scope;
mod hierarchy;
mod builtins;
mod declarations;
mod semantics;
mod helpers;
mod checker;
mod decl_checker;
mod stmt_checker;
mod expr_checker;
mod annotate;

// Re-export public API
pub use error::SemanticError;
pub use types::Type;
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use hierarchy::ClassHierarchy;
pub use builtins::{is_builtin_class, BUILTIN_CLASSES};
pub use declarations::{analyze_declarations, Declarations, RETURN_VAL};
pub use semantics::check_semantics;
pub use helpers::TypeHelpers;
pub use checker::{TypeChecker, TypeTable};
pub use annotate::annotated_json;

use pylang_ast::{Errors, Expr, Program};

// =============================================================================
// Public API
// =============================================================================

/// Everything the analysis passes learned about one program
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub hierarchy: ClassHierarchy,
    pub declarations: Declarations,
    pub types: TypeTable,
    /// Diagnostics in the sink once analysis finished; code generation requires zero
    pub error_count: usize,
}

impl Analysis {
    pub fn scopes(&self) -> &ScopeTree<Type> {
        &self.declarations.scopes
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn type_of(&self, expr: &Expr) -> Option<&Type> {
        self.types.get(expr.id)
    }

    pub fn annotated_json(&self, program: &Program) -> serde_json::Result<String> {
        annotated_json(program, &self.types)
    }
}

/// Run every analysis pass over `program`, reporting into `errors`.
///
/// A program arriving with errors (from the parser) is not analyzed at all.
pub fn analyze(program: &Program, errors: &mut Errors) -> Analysis {
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "skipping analysis of erroneous program");
        return Analysis {
            error_count: errors.len(),
            ..Analysis::default()
        };
    }
    let hierarchy = ClassHierarchy::build(program);
    let mut declarations = analyze_declarations(program, errors);
    check_semantics(program, &mut declarations, &hierarchy, errors);
    let types = if errors.is_empty() {
        TypeChecker::new(&declarations, &hierarchy, errors).check_program(program)
    } else {
        tracing::debug!(errors = errors.len(), "skipping type checking");
        TypeTable::default()
    };
    Analysis {
        hierarchy,
        declarations,
        types,
        error_count: errors.len(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pylang_ast::build::*;
    use pylang_ast::{BinaryOp, Decl, Node, Span, Stmt, UnaryOp};
    use rstest::rstest;

    fn run(p: &Program) -> (Analysis, Vec<String>) {
        let mut errors = Errors::new();
        let analysis = analyze(p, &mut errors);
        let messages = errors.iter().map(|e| e.message.clone()).collect();
        (analysis, messages)
    }

    fn expr_of(stmt: &Node<Stmt>) -> &Expr {
        match &stmt.value {
            Stmt::ExprStmt { expr } => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    /// Type of a single top-level expression statement evaluated after `decls`.
    fn infer(decls: Vec<Node<Decl>>, expr: Expr) -> (Type, Vec<String>) {
        let p = program(decls, vec![expr_stmt(expr)]);
        let (analysis, errs) = run(&p);
        let ty = analysis
            .type_of(expr_of(&p.statements[0]))
            .cloned()
            .unwrap_or(Type::Object);
        (ty, errs)
    }

    fn classes_a_b() -> Vec<Node<Decl>> {
        vec![class_def("A", "object", vec![]), class_def("B", "A", vec![])]
    }

    // -------------------------------------------------------------------------
    // end-to-end scenarios
    // -------------------------------------------------------------------------

    #[test]
    fn none_initializes_int() {
        let (_, errs) = run(&program(vec![var_def("x", class_ty("int"), none())], vec![]));
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn duplicate_variable_reports_once_and_keeps_int() {
        let p = program(
            vec![
                var_def("x", class_ty("int"), int(1)),
                var_def("x", class_ty("int"), int(2)),
            ],
            vec![],
        );
        let (analysis, errs) = run(&p);
        assert_eq!(errs, vec!["Duplicate declaration of identifier in same scope: x"]);
        let root = analysis.scopes().root();
        assert_eq!(analysis.scopes().get_local(root, "x"), Some(&Type::Int));
    }

    #[test]
    fn list_concat_joins_element_classes() {
        let mut decls = classes_a_b();
        decls.push(var_def("la", list_ty(class_ty("A")), none()));
        decls.push(var_def("lb", list_ty(class_ty("B")), none()));
        let (ty, errs) = infer(decls, binary(id("lb"), BinaryOp::Add, id("la")));
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(ty, Type::list(Type::Class("A".into())));
    }

    #[test]
    fn method_missing_return_on_if_branch() {
        let p = program(
            vec![class_def(
                "C",
                "object",
                vec![func_def(
                    "f",
                    vec![typed_var("self", class_ty("C"))],
                    class_ty("int"),
                    vec![],
                    vec![if_stmt(boolean(true), vec![expr_stmt(int(1))], vec![ret(Some(int(2)))])],
                )],
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
    fn call_with_too_many_arguments() {
        let decls = vec![func_def(
            "foo",
            vec![typed_var("a", class_ty("int"))],
            no_return(),
            vec![],
            vec![],
        )];
        let (_, errs) = infer(decls, call("foo", vec![int(1), int(2)]));
        assert_eq!(errs, vec!["Expected 1 arguments; got 2"]);
    }

    // -------------------------------------------------------------------------
    // pass gating
    // -------------------------------------------------------------------------

    #[test]
    fn parser_errors_stop_analysis() {
        let p = program(vec![var_def("x", class_ty("int"), string("no"))], vec![]);
        let mut errors = Errors::new();
        errors.push(pylang_ast::CompilerError {
            span: Span::new(1, 1, 1, 2),
            message: "Parse error".into(),
            syntax: true,
        });
        let analysis = analyze(&p, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(analysis.types.is_empty());
    }

    #[test]
    fn semantic_errors_skip_type_checking() {
        let p = program(
            vec![
                var_def("x", class_ty("Nope"), none()),
                var_def("y", class_ty("int"), string("wrong")),
            ],
            vec![],
        );
        let (analysis, errs) = run(&p);
        assert_eq!(errs, vec!["Invalid type annotation; there is no class named: Nope"]);
        assert!(analysis.types.is_empty());
    }

    // -------------------------------------------------------------------------
    // expressions
    // -------------------------------------------------------------------------

    #[rstest]
    #[case(int(1), Type::Int)]
    #[case(string("s"), Type::Str)]
    #[case(boolean(false), Type::Bool)]
    #[case(none(), Type::None)]
    #[case(list(vec![]), Type::Empty)]
    #[case(list(vec![int(1), int(2)]), Type::list(Type::Int))]
    #[case(list(vec![int(1), string("a")]), Type::list(Type::Object))]
    #[case(list(vec![none()]), Type::list(Type::None))]
    #[case(index(string("abc"), int(0)), Type::Str)]
    #[case(index(list(vec![boolean(true)]), int(0)), Type::Bool)]
    #[case(if_expr(boolean(true), int(1), int(2)), Type::Int)]
    #[case(if_expr(boolean(true), int(1), string("a")), Type::Object)]
    #[case(unary(UnaryOp::Neg, int(1)), Type::Int)]
    #[case(unary(UnaryOp::Not, boolean(true)), Type::Bool)]
    #[case(call("len", vec![string("abc")]), Type::Int)]
    #[case(call("input", vec![]), Type::Str)]
    #[case(call("print", vec![int(1)]), Type::None)]
    #[case(call("object", vec![]), Type::Object)]
    fn infers_well_typed_expressions(#[case] expr: Expr, #[case] expected: Type) {
        let (ty, errs) = infer(vec![], expr);
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(ty, expected);
    }

    #[rstest]
    #[case(BinaryOp::Add, int(1), int(2), Type::Int)]
    #[case(BinaryOp::Add, string("a"), string("b"), Type::Str)]
    #[case(BinaryOp::Sub, int(1), int(2), Type::Int)]
    #[case(BinaryOp::FloorDiv, int(1), int(2), Type::Int)]
    #[case(BinaryOp::Mod, int(1), int(2), Type::Int)]
    #[case(BinaryOp::Lt, int(1), int(2), Type::Bool)]
    #[case(BinaryOp::GtEq, int(1), int(2), Type::Bool)]
    #[case(BinaryOp::Eq, string("a"), string("b"), Type::Bool)]
    #[case(BinaryOp::NotEq, boolean(true), boolean(false), Type::Bool)]
    #[case(BinaryOp::And, boolean(true), boolean(false), Type::Bool)]
    #[case(BinaryOp::Is, none(), none(), Type::Bool)]
    #[case(BinaryOp::Add, list(vec![int(1)]), list(vec![int(2)]), Type::list(Type::Int))]
    fn accepts_operator_operands(
        #[case] op: BinaryOp,
        #[case] left: Expr,
        #[case] right: Expr,
        #[case] expected: Type,
    ) {
        let (ty, errs) = infer(vec![], binary(left, op, right));
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(ty, expected);
    }

    #[rstest]
    #[case(BinaryOp::Add, int(1), string("a"), Type::Int, "Cannot apply operator `+` on types `int` and `str`")]
    #[case(BinaryOp::Add, boolean(true), string("a"), Type::Object, "Cannot apply operator `+` on types `bool` and `str`")]
    #[case(BinaryOp::Mul, string("a"), int(2), Type::Int, "Cannot apply operator `*` on types `str` and `int`")]
    #[case(BinaryOp::Lt, string("a"), string("b"), Type::Bool, "Cannot apply operator `<` on types `str` and `str`")]
    #[case(BinaryOp::Eq, int(1), boolean(true), Type::Bool, "Cannot apply operator `==` on types `int` and `bool`")]
    #[case(BinaryOp::Or, boolean(true), int(0), Type::Bool, "Cannot apply operator `or` on types `bool` and `int`")]
    #[case(BinaryOp::Is, int(1), int(1), Type::Bool, "Cannot apply operator `is` on types `int` and `int`")]
    #[case(BinaryOp::Add, list(vec![]), list(vec![int(1)]), Type::Object, "Cannot apply operator `+` on types `<Empty>` and `[int]`")]
    fn rejects_operator_operands(
        #[case] op: BinaryOp,
        #[case] left: Expr,
        #[case] right: Expr,
        #[case] expected: Type,
        #[case] message: &str,
    ) {
        let (ty, errs) = infer(vec![], binary(left, op, right));
        assert_eq!(errs, vec![message.to_string()]);
        assert_eq!(ty, expected);
    }

    #[test]
    fn unary_operand_errors() {
        let (_, errs) = infer(vec![], unary(UnaryOp::Not, int(1)));
        assert_eq!(errs, vec!["Cannot apply operator `not` on type `int`"]);
    }

    #[test]
    fn unknown_identifier_is_object() {
        let (ty, errs) = infer(vec![], id("ghost"));
        assert_eq!(errs, vec!["Not a variable: ghost"]);
        assert_eq!(ty, Type::Object);
    }

    #[test]
    fn argument_type_mismatch_names_position() {
        let decls = vec![func_def(
            "f",
            vec![typed_var("a", class_ty("int")), typed_var("b", class_ty("str"))],
            no_return(),
            vec![],
            vec![],
        )];
        let (_, errs) = infer(decls, call("f", vec![int(1), int(2)]));
        assert_eq!(errs, vec!["Expected type `str`; got type `int` in parameter 1"]);
    }

    #[test]
    fn calling_a_variable_is_an_error() {
        let decls = vec![var_def("x", class_ty("int"), int(0))];
        let (ty, errs) = infer(decls, call("x", vec![]));
        assert_eq!(errs, vec!["Not a function or class: x"]);
        assert_eq!(ty, Type::Object);
    }

    #[test]
    fn constructor_takes_no_arguments() {
        let (ty, errs) = infer(classes_a_b(), call("B", vec![int(1)]));
        assert_eq!(errs, vec!["Expected 0 arguments; got 1"]);
        assert_eq!(ty, Type::Class("B".into()));
    }

    fn counter_class() -> Vec<Node<Decl>> {
        vec![
            class_def(
                "Counter",
                "object",
                vec![
                    var_def("n", class_ty("int"), int(0)),
                    func_def(
                        "add",
                        vec![typed_var("self", class_ty("Counter")), typed_var("k", class_ty("int"))],
                        class_ty("int"),
                        vec![],
                        vec![ret(Some(member(id("self"), "n")))],
                    ),
                ],
            ),
            class_def("Sub", "Counter", vec![]),
            var_def("c", class_ty("Sub"), none()),
        ]
    }

    #[test]
    fn inherited_method_call_skips_receiver() {
        let (ty, errs) = infer(counter_class(), method_call(id("c"), "add", vec![int(3)]));
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(ty, Type::Int);
    }

    #[test]
    fn method_argument_errors() {
        let (_, errs) = infer(counter_class(), method_call(id("c"), "add", vec![]));
        assert_eq!(errs, vec!["Expected 1 arguments; got 0"]);
        let (_, errs) = infer(counter_class(), method_call(id("c"), "add", vec![string("x")]));
        assert_eq!(errs, vec!["Expected type `int`; got type `str` in parameter 1"]);
    }

    #[test]
    fn missing_members_are_reported() {
        let (ty, errs) = infer(counter_class(), method_call(id("c"), "sub", vec![]));
        assert_eq!(errs, vec!["There is no method named `sub` in class `Sub`"]);
        assert_eq!(ty, Type::Object);
        let (ty, errs) = infer(counter_class(), member(id("c"), "m"));
        assert_eq!(errs, vec!["There is no attribute named `m` in class `Sub`"]);
        assert_eq!(ty, Type::Object);
        let (ty, errs) = infer(counter_class(), member(id("c"), "n"));
        assert!(errs.is_empty());
        assert_eq!(ty, Type::Int);
    }

    #[test]
    fn indexing_errors() {
        let (ty, errs) = infer(vec![], index(int(1), int(0)));
        assert_eq!(errs, vec!["Cannot index into type `int`"]);
        assert_eq!(ty, Type::Object);
        let (ty, errs) = infer(vec![], index(string("ab"), string("0")));
        assert_eq!(errs, vec!["Index is of non-integer type `str`"]);
        assert_eq!(ty, Type::Str);
    }

    // -------------------------------------------------------------------------
    // statements
    // -------------------------------------------------------------------------

    #[test]
    fn var_def_value_must_conform() {
        let (_, errs) = run(&program(vec![var_def("x", class_ty("int"), string("a"))], vec![]));
        assert_eq!(errs, vec!["Expected type `int`; got type `str`"]);
    }

    #[test]
    fn assignment_checks_every_target() {
        let p = program(
            vec![
                var_def("x", class_ty("int"), int(0)),
                var_def("s", class_ty("str"), string("")),
            ],
            vec![assign(vec![id("x"), id("s")], int(1))],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec!["Expected type `str`; got type `int`"]);
    }

    #[test]
    fn none_list_multiple_assignment() {
        let p = program(
            vec![
                var_def("a", list_ty(class_ty("int")), none()),
                var_def("b", list_ty(class_ty("int")), none()),
            ],
            vec![assign(vec![id("a"), id("b")], list(vec![none()]))],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec!["Special error case of [<None>] multiple assignment"]);
    }

    #[test]
    fn string_index_is_not_assignable() {
        let p = program(
            vec![var_def("s", class_ty("str"), string("abc"))],
            vec![assign(vec![index(id("s"), int(0))], string("x"))],
        );
        let (_, errs) = run(&p);
        assert_eq!(errs, vec!["`str` is not a list type"]);
    }

    #[test]
    fn return_rules() {
        let p = program(
            vec![
                func_def("f", vec![], class_ty("int"), vec![], vec![ret(Some(string("a")))]),
                func_def("g", vec![], class_ty("str"), vec![], vec![ret(None)]),
                func_def("h", vec![], no_return(), vec![], vec![ret(None), ret(Some(none()))]),
                func_def("k", vec![], class_ty("int"), vec![], vec![ret(Some(none()))]),
            ],
            vec![],
        );
        let (_, errs) = run(&p);
        assert_eq!(
            errs,
            vec!["Expected type `int`; got type `str`", "Expected type `str`; got `None`"]
        );
    }

    #[test]
    fn loops_check_conditions_and_elements() {
        let p = program(
            vec![
                var_def("i", class_ty("int"), int(0)),
                var_def("c", class_ty("str"), string("")),
            ],
            vec![
                while_stmt(int(1), vec![]),
                for_stmt("i", list(vec![int(1), int(2)]), vec![]),
                for_stmt("c", string("abc"), vec![]),
                for_stmt("i", string("abc"), vec![]),
                for_stmt("i", int(5), vec![]),
            ],
        );
        let (_, errs) = run(&p);
        assert_eq!(
            errs,
            vec![
                "Expected type `bool`; got type `int`",
                "Expected type `int`; got type `str`",
                "Cannot iterate over value of type `int`",
            ]
        );
    }

    #[test]
    fn nested_function_reads_enclosing_and_global_variables() {
        let p = program(
            vec![
                var_def("g", class_ty("int"), int(1)),
                func_def(
                    "outer",
                    vec![typed_var("a", class_ty("int"))],
                    class_ty("int"),
                    vec![func_def(
                        "inner",
                        vec![],
                        class_ty("int"),
                        vec![],
                        vec![ret(Some(binary(id("a"), BinaryOp::Add, id("g"))))],
                    )],
                    vec![ret(Some(call("inner", vec![])))],
                ),
            ],
            vec![expr_stmt(call("outer", vec![int(2)]))],
        );
        let (analysis, errs) = run(&p);
        assert!(errs.is_empty(), "{:?}", errs);
        assert_eq!(analysis.type_of(expr_of(&p.statements[0])), Some(&Type::Int));
    }

    #[test]
    fn every_expression_is_annotated() {
        let p = program(
            vec![var_def("x", class_ty("int"), int(3))],
            vec![expr_stmt(call("print", vec![binary(id("x"), BinaryOp::Mul, int(2))]))],
        );
        let (analysis, errs) = run(&p);
        assert!(errs.is_empty());
        // literal 3, call, callee, binary, x, 2
        assert_eq!(analysis.types.len(), 6);
        let json = analysis.annotated_json(&p).unwrap();
        assert!(json.contains("\"inferredType\""));
        assert!(!json.contains("exprId"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let call = &value["statements"][0]["expr"];
        assert_eq!(call["inferredType"]["className"], "<None>");
        assert_eq!(call["function"]["inferredType"]["kind"], "FuncType");
    }
}
