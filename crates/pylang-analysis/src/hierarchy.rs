//! Class hierarchy: class name to superclass name

use pylang_ast::{Decl, Program};
use std::collections::{HashMap, HashSet};

/// Single-inheritance hierarchy of every class the program mentions.
///
/// Superclass names are recorded as written; whether they exist is
/// checked later by the semantics pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHierarchy {
    parents: HashMap<String, Option<String>>,
}

impl Default for ClassHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassHierarchy {
    /// Hierarchy holding only the builtin classes.
    pub fn new() -> Self {
        let mut parents = HashMap::new();
        parents.insert("object".to_string(), None);
        for builtin in ["int", "bool", "str"] {
            parents.insert(builtin.to_string(), Some("object".to_string()));
        }
        Self { parents }
    }

    /// Record every top-level class declaration of `program`.
    pub fn build(program: &Program) -> Self {
        let mut hierarchy = Self::new();
        for decl in &program.declarations {
            if let Decl::ClassDef(class) = &decl.value {
                hierarchy.insert(&class.name.name, &class.super_class.name);
            }
        }
        tracing::debug!(classes = hierarchy.parents.len(), "class hierarchy built");
        hierarchy
    }

    pub fn insert(&mut self, class: &str, superclass: &str) {
        self.parents
            .insert(class.to_string(), Some(superclass.to_string()));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.parents.contains_key(class)
    }

    pub fn superclass(&self, class: &str) -> Option<&str> {
        self.parents.get(class).and_then(|parent| parent.as_deref())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// `class` followed by each of its ancestors, most-derived first.
    ///
    /// Stops at an unknown name or at a repeated class, so malformed
    /// hierarchies still terminate.
    pub fn ancestors<'a>(&'a self, class: &'a str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(name) = current {
            if !seen.insert(name) {
                break;
            }
            chain.push(name);
            current = self.superclass(name);
        }
        chain
    }

    /// Whether a value of class `value` may be used where `target` is expected.
    pub fn conforms_to(&self, target: &str, value: &str) -> bool {
        target == "object" || self.ancestors(value).contains(&target)
    }

    /// Nearest common ancestor; with one side absent the other is returned.
    pub fn lub(&self, a: Option<&str>, b: Option<&str>) -> Option<String> {
        match (a, b) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.to_string()),
            (Some(a), Some(b)) => {
                let mut path_a = self.ancestors(a);
                let mut path_b = self.ancestors(b);
                path_a.reverse();
                path_b.reverse();
                let common = path_a
                    .iter()
                    .zip(path_b.iter())
                    .take_while(|(x, y)| x == y)
                    .last()
                    .map(|(x, _)| x.to_string());
                Some(common.unwrap_or_else(|| "object".to_string()))
            }
        }
    }
}
