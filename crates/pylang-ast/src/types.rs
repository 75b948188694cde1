//! Type annotations as written in source

use super::*;

/// Type annotation on a variable, parameter, or return position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeAnnotation {
    /// Named class: `int`, `str`, `Foo`
    ClassType {
        #[serde(rename = "className")]
        class_name: String,
    },

    /// List of an element type: `[T]`
    ListType {
        #[serde(rename = "elementType")]
        element_type: Box<Node<TypeAnnotation>>,
    },
}

impl TypeAnnotation {
    pub fn class(name: impl Into<String>) -> Self {
        TypeAnnotation::ClassType {
            class_name: name.into(),
        }
    }

    /// Innermost class name, looking through any number of list brackets.
    pub fn base_class_name(&self) -> &str {
        match self {
            TypeAnnotation::ClassType { class_name } => class_name,
            TypeAnnotation::ListType { element_type } => element_type.value.base_class_name(),
        }
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnotation::ClassType { class_name } => write!(f, "{}", class_name),
            TypeAnnotation::ListType { element_type } => write!(f, "[{}]", element_type.value),
        }
    }
}

/// A name paired with its declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub struct TypedVar {
    #[serde(rename = "location")]
    pub span: Span,
    pub identifier: Identifier,
    #[serde(rename = "type")]
    pub annotation: Node<TypeAnnotation>,
}

impl TypedVar {
    pub fn name(&self) -> &str {
        &self.identifier.name
    }
}
