//! Semantic diagnostics

use crate::types::Type;
use pylang_ast::{BinaryOp, Errors, Span, UnaryOp};
use thiserror::Error;

/// Every user-facing rule violation the analysis passes can report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    // declarations and scoping
    #[error("Duplicate declaration of identifier in same scope: {0}")]
    DuplicateDeclaration(String),
    #[error("Invalid type annotation; there is no class named: {0}")]
    UnknownClass(String),
    #[error("Not a global variable: {0}")]
    NotGlobal(String),
    #[error("Not a nonlocal variable: {0}")]
    NotNonlocal(String),
    #[error("Cannot assign to variable that is not explicitly declared in this scope: {0}")]
    UndeclaredAssignTarget(String),
    #[error("All paths in this function/method must have a return statement: {0}")]
    MissingReturn(String),
    #[error("Cannot shadow class name: {0}")]
    ShadowsClass(String),
    #[error("Return statement cannot appear at the top level")]
    TopLevelReturn,

    // classes
    #[error("First parameter of the following method must be of the enclosing class: {0}")]
    BadReceiver(String),
    #[error("Method overridden with different type signature: {0}")]
    BadOverride(String),
    #[error("Cannot re-define attribute: {0}")]
    AttributeRedefined(String),
    #[error("Super-class not defined: {0}")]
    SuperclassNotDefined(String),
    #[error("Cannot extend special class: {0}")]
    SpecialSuperclass(String),
    #[error("Super-class must be a class: {0}")]
    SuperclassNotClass(String),

    // types
    #[error("Expected type `{expected}`; got type `{found}`")]
    TypeMismatch { expected: Type, found: Type },
    #[error("Expected type `{0}`; got `None`")]
    MissingReturnValue(Type),
    #[error("Not a variable: {0}")]
    NotAVariable(String),
    #[error("Not a function or class: {0}")]
    NotCallable(String),
    #[error("Cannot apply operator `{op}` on types `{left}` and `{right}`")]
    BinaryOperands { op: BinaryOp, left: Type, right: Type },
    #[error("Cannot apply operator `{op}` on type `{operand}`")]
    UnaryOperand { op: UnaryOp, operand: Type },
    #[error("Expected {expected} arguments; got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Expected type `{expected}`; got type `{found}` in parameter {index}")]
    ArgumentMismatch { expected: Type, found: Type, index: usize },
    #[error("There is no method named `{method}` in class `{class}`")]
    NoSuchMethod { method: String, class: Type },
    #[error("There is no attribute named `{attribute}` in class `{class}`")]
    NoSuchAttribute { attribute: String, class: Type },
    #[error("Cannot index into type `{0}`")]
    NotIndexable(Type),
    #[error("Index is of non-integer type `{0}`")]
    NonIntegerIndex(Type),
    #[error("`{0}` is not a list type")]
    NotAList(Type),
    #[error("Cannot iterate over value of type `{0}`")]
    NotIterable(Type),
    #[error("Special error case of [<None>] multiple assignment")]
    NoneListMultipleAssign,
}

impl SemanticError {
    /// Record this error in `errors` at `span`.
    pub fn report(self, span: Span, errors: &mut Errors) {
        errors.report(span, self.to_string());
    }
}
