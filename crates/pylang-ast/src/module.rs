//! Program root and JSON interchange

use super::*;
use serde_json::Value;

/// Whole compilation unit as delivered by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub struct Program {
    #[serde(rename = "location")]
    pub span: Span,
    pub declarations: Vec<Node<Decl>>,
    pub statements: Vec<Node<Stmt>>,
    #[serde(default)]
    pub errors: Errors,
}

impl Program {
    pub fn new(declarations: Vec<Node<Decl>>, statements: Vec<Node<Stmt>>) -> Self {
        Self {
            span: Span::default(),
            declarations,
            statements,
            errors: Errors::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Read a parser-produced AST. Every expression receives a fresh id.
    pub fn from_json(text: &str) -> serde_json::Result<Program> {
        serde_json::from_str(text)
    }

    /// Tree with internal expression ids included.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Untyped JSON form, matching the parser's own output.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut value = self.to_value()?;
        rewrite_expr_ids(&mut value, &mut |_| None);
        serde_json::to_string_pretty(&value)
    }
}

/// Walk a serialized tree and replace every `"exprId"` member.
///
/// `annotate` maps an id to the JSON to store under `"inferredType"`;
/// returning `None` just drops the id.
pub fn rewrite_expr_ids(value: &mut Value, annotate: &mut dyn FnMut(ExprId) -> Option<Value>) {
    match value {
        Value::Object(map) => {
            if let Some(id) = map.remove("exprId") {
                if let Some(ty) = id.as_u64().and_then(|raw| annotate(ExprId(raw))) {
                    map.insert("inferredType".to_string(), ty);
                }
            }
            for child in map.values_mut() {
                rewrite_expr_ids(child, annotate);
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_expr_ids(item, annotate);
            }
        }
        _ => {}
    }
}
