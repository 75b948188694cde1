//! Type-annotated snapshot of the tree

use crate::checker::TypeTable;
use pylang_ast::{rewrite_expr_ids, Program};

/// Program JSON with each expression's `"inferredType"` filled in from `types`.
///
/// Expressions the type checker never reached carry no annotation.
pub fn annotated_json(program: &Program, types: &TypeTable) -> serde_json::Result<String> {
    let mut value = program.to_value()?;
    let mut inferred = |id| types.get(id).and_then(|ty| serde_json::to_value(ty).ok());
    rewrite_expr_ids(&mut value, &mut inferred);
    serde_json::to_string_pretty(&value)
}
