//! Builtin functions and classes

use crate::types::Type;

/// Names a program may not rebind through `global` and may not extend.
pub const PRIMITIVE_CLASSES: [&str; 3] = ["int", "bool", "str"];

/// Builtin classes, in tag order.
pub const BUILTIN_CLASSES: [&str; 4] = ["object", "int", "bool", "str"];

/// Signatures bound in the module scope before any user declaration.
pub fn builtin_functions() -> Vec<(&'static str, Type)> {
    vec![
        (
            "print",
            Type::Func {
                params: vec![Type::Object],
                ret: Box::new(Type::None),
            },
        ),
        (
            "input",
            Type::Func {
                params: vec![],
                ret: Box::new(Type::Str),
            },
        ),
        (
            "len",
            Type::Func {
                params: vec![Type::Object],
                ret: Box::new(Type::Int),
            },
        ),
    ]
}

/// Class bindings for the builtin type names.
pub fn builtin_classes() -> Vec<(&'static str, Type)> {
    BUILTIN_CLASSES
        .iter()
        .map(|&name| {
            let superclass = (name != "object").then(|| "object".to_string());
            (
                name,
                Type::UserDefinedClass {
                    name: name.to_string(),
                    superclass,
                },
            )
        })
        .collect()
}

/// Members of `object`, inherited by every class.
pub fn object_members() -> Vec<(&'static str, Type)> {
    vec![(
        "__init__",
        Type::Func {
            params: vec![Type::Object],
            ret: Box::new(Type::None),
        },
    )]
}

pub fn is_builtin_class(name: &str) -> bool {
    BUILTIN_CLASSES.contains(&name)
}

pub fn is_primitive_class(name: &str) -> bool {
    PRIMITIVE_CLASSES.contains(&name)
}
