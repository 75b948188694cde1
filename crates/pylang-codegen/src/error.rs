//! Error types for code generation

use thiserror::Error;

/// Internal fault raised while lowering a program the analysis accepted.
///
/// These signal a compiler defect, never a problem in the user's program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("Codegen error: unresolved symbol `{0}`")]
    UnresolvedSymbol(String),
    #[error("Codegen error: no inferred type for expression at {0}")]
    MissingType(String),
    #[error("Codegen error: malformed tree: {0}")]
    Malformed(String),
    #[error("Codegen error: program has {0} unresolved error(s)")]
    ProgramHasErrors(usize),
    #[error("Codegen error: {0}")]
    Backend(String),
}

impl CodegenError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        CodegenError::Malformed(msg.into())
    }
}
