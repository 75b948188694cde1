//! Assignment compatibility and type joins

use crate::hierarchy::ClassHierarchy;
use crate::types::Type;

/// Helper methods for relating types through the class hierarchy
pub struct TypeHelpers;

impl TypeHelpers {
    /// Whether a value of type `val` may be stored where `def` is declared.
    pub fn is_assignment_compatible(hierarchy: &ClassHierarchy, def: &Type, val: &Type) -> bool {
        if val.is_special() && !def.is_special() {
            return true;
        }
        match (def, val) {
            (Type::List(_), Type::Empty) => return true,
            (Type::List(d), Type::List(v)) => return **v == Type::None || d == v,
            _ => {}
        }
        match (def.class_name(), val.class_name()) {
            (Some(target), Some(value)) => hierarchy.conforms_to(target, value),
            (Some("object"), None) => val.is_list(),
            _ => false,
        }
    }

    /// Least upper bound of two instance types.
    pub fn join(hierarchy: &ClassHierarchy, a: &Type, b: &Type) -> Type {
        if a == b {
            return a.clone();
        }
        match (a.class_name(), b.class_name()) {
            (Some(x), Some(y)) => hierarchy
                .lub(Some(x), Some(y))
                .map(|name| Type::class(&name))
                .unwrap_or(Type::Object),
            _ => Type::Object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylang_ast::build::*;
    use rstest::rstest;

    fn hierarchy() -> ClassHierarchy {
        ClassHierarchy::build(&program(
            vec![class_def("A", "object", vec![]), class_def("B", "A", vec![])],
            vec![],
        ))
    }

    fn a() -> Type {
        Type::Class("A".into())
    }

    fn b() -> Type {
        Type::Class("B".into())
    }

    #[rstest]
    #[case(Type::Int, Type::Int, true)]
    #[case(Type::Int, Type::None, true)]
    #[case(Type::Str, Type::None, true)]
    #[case(Type::Int, Type::Str, false)]
    #[case(Type::Int, Type::Bool, false)]
    #[case(Type::Object, Type::Int, true)]
    #[case(Type::Object, Type::list(Type::Int), true)]
    #[case(Type::Int, Type::Object, false)]
    #[case(a(), b(), true)]
    #[case(b(), a(), false)]
    #[case(a(), Type::None, true)]
    #[case(Type::list(Type::Int), Type::Empty, true)]
    #[case(Type::list(Type::Int), Type::list(Type::None), true)]
    #[case(Type::list(Type::Int), Type::list(Type::Int), true)]
    #[case(Type::list(a()), Type::list(b()), false)]
    #[case(Type::list(Type::Int), Type::Int, false)]
    #[case(Type::Int, Type::Empty, false)]
    #[case(Type::None, Type::None, true)]
    fn assignment_compatibility(#[case] def: Type, #[case] val: Type, #[case] expected: bool) {
        assert_eq!(
            TypeHelpers::is_assignment_compatible(&hierarchy(), &def, &val),
            expected,
            "{} <- {}",
            def,
            val
        );
    }

    #[test]
    fn compatibility_is_reflexive_for_value_types() {
        let h = hierarchy();
        for ty in [Type::Int, Type::Bool, Type::Str, Type::Object, a(), Type::list(b()), Type::Empty] {
            assert!(TypeHelpers::is_assignment_compatible(&h, &ty, &ty), "{}", ty);
        }
    }

    #[test]
    fn join_maps_back_to_types() {
        let h = hierarchy();
        assert_eq!(TypeHelpers::join(&h, &a(), &b()), a());
        assert_eq!(TypeHelpers::join(&h, &Type::Int, &Type::Int), Type::Int);
        assert_eq!(TypeHelpers::join(&h, &Type::Int, &Type::Str), Type::Object);
        assert_eq!(TypeHelpers::join(&h, &Type::list(Type::Int), &Type::Int), Type::Object);
    }
}
