//! Internal type representation

use pylang_ast::TypeAnnotation;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Semantic type of a binding or an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Str,
    /// Type of the `None` literal
    None,
    Object,
    /// Type of the empty list literal `[]`
    Empty,
    List(Box<Type>),
    /// Instance of a user-defined class
    Class(String),
    /// A class itself, as bound to its name in the module scope
    UserDefinedClass {
        name: String,
        superclass: Option<String>,
    },
    Func {
        params: Vec<Type>,
        ret: Box<Type>,
    },
}

impl Type {
    /// Instance type for a class name; builtin names map to their own variants.
    pub fn class(name: &str) -> Type {
        match name {
            "int" => Type::Int,
            "bool" => Type::Bool,
            "str" => Type::Str,
            "object" => Type::Object,
            "<None>" => Type::None,
            "<Empty>" => Type::Empty,
            _ => Type::Class(name.to_string()),
        }
    }

    pub fn list(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    pub fn from_annotation(annotation: &TypeAnnotation) -> Type {
        match annotation {
            TypeAnnotation::ClassType { class_name } => Type::class(class_name),
            TypeAnnotation::ListType { element_type } => {
                Type::list(Type::from_annotation(&element_type.value))
            }
        }
    }

    /// Class name of an instance type; `None` for lists, functions and classes.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Int => Some("int"),
            Type::Bool => Some("bool"),
            Type::Str => Some("str"),
            Type::None => Some("<None>"),
            Type::Object => Some("object"),
            Type::Empty => Some("<Empty>"),
            Type::Class(name) => Some(name),
            Type::List(_) | Type::UserDefinedClass { .. } | Type::Func { .. } => None,
        }
    }

    /// Special types relax assignment: `None` may be stored anywhere else.
    pub fn is_special(&self) -> bool {
        matches!(self, Type::None)
    }

    /// `int`, `bool` and `str`: unextendable and never compared by identity.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Bool | Type::Str)
    }

    /// Types a variable may hold.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Bool | Type::Str | Type::Object | Type::Empty | Type::List(_) | Type::Class(_)
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Type::Func { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::List(element) => write!(f, "[{}]", element),
            Type::UserDefinedClass { name, .. } => write!(f, "{}", name),
            Type::Func { params, ret } => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", ret)
            }
            other => write!(f, "{}", other.class_name().unwrap_or("object")),
        }
    }
}

/// Serialized as the `inferredType` member of the annotated tree.
impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Type::List(element) => {
                map.serialize_entry("kind", "ListValueType")?;
                map.serialize_entry("elementType", element)?;
            }
            Type::Func { params, ret } => {
                map.serialize_entry("kind", "FuncType")?;
                map.serialize_entry("parameters", params)?;
                map.serialize_entry("returnType", ret)?;
            }
            Type::UserDefinedClass { name, superclass } => {
                map.serialize_entry("kind", "UserDefinedClassType")?;
                map.serialize_entry("className", name)?;
                map.serialize_entry("superClassName", superclass)?;
            }
            other => {
                map.serialize_entry("kind", "ClassValueType")?;
                map.serialize_entry("className", &other.class_name())?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylang_ast::build;

    #[test]
    fn builtin_names_normalize() {
        assert_eq!(Type::class("int"), Type::Int);
        assert_eq!(Type::class("<None>"), Type::None);
        assert_eq!(Type::class("object"), Type::Object);
        assert_eq!(Type::class("Foo"), Type::Class("Foo".into()));
    }

    #[test]
    fn annotation_to_type() {
        let ann = build::list_ty(build::list_ty(build::class_ty("str")));
        assert_eq!(Type::from_annotation(&ann.value), Type::list(Type::list(Type::Str)));
    }

    #[test]
    fn display_matches_source_syntax() {
        assert_eq!(Type::list(Type::Int).to_string(), "[int]");
        assert_eq!(Type::None.to_string(), "<None>");
        assert_eq!(Type::Empty.to_string(), "<Empty>");
        assert_eq!(Type::Class("A".into()).to_string(), "A");
    }

    #[test]
    fn only_none_is_special() {
        assert!(Type::None.is_special());
        assert!(!Type::Int.is_special());
        assert!(!Type::Class("A".into()).is_special());
        assert!(!Type::None.is_value_type());
        assert!(Type::Empty.is_value_type());
    }

    #[test]
    fn serializes_inferred_type_shapes() {
        let value = serde_json::to_value(Type::list(Type::Int)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "ListValueType",
                "elementType": { "kind": "ClassValueType", "className": "int" }
            })
        );
        let func = Type::Func {
            params: vec![Type::Object],
            ret: Box::new(Type::None),
        };
        let value = serde_json::to_value(func).unwrap();
        assert_eq!(value["kind"], "FuncType");
        assert_eq!(value["returnType"]["className"], "<None>");
    }
}
