//! Scope arena shared by the analysis passes.
//!
//! Scopes live in one vector and refer to each other by [`ScopeId`]. A
//! child scope is registered under its parent by the name of the function
//! or class that introduced it, so a later pass can re-enter exactly the
//! scope an earlier pass populated.

use std::collections::HashMap;

/// Handle to a scope inside a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Declarative region kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
}

#[derive(Debug, Clone)]
pub struct Scope<T> {
    pub kind: ScopeKind,
    pub name: String,
    parent: Option<ScopeId>,
    symbols: HashMap<String, T>,
    order: Vec<String>,
    children: HashMap<String, ScopeId>,
}

/// Arena of nested symbol tables
#[derive(Debug, Clone)]
pub struct ScopeTree<T> {
    scopes: Vec<Scope<T>>,
}

impl<T> Default for ScopeTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeTree<T> {
    /// A tree holding only the module scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                name: "<module>".to_string(),
                parent: None,
                symbols: HashMap::new(),
                order: Vec::new(),
                children: HashMap::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Create a scope nested in `parent`. The first scope registered under a
    /// name is the one [`ScopeTree::child`] finds later.
    pub fn add_child(&mut self, parent: ScopeId, name: &str, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            name: name.to_string(),
            parent: Some(parent),
            symbols: HashMap::new(),
            order: Vec::new(),
            children: HashMap::new(),
        });
        self.scopes[parent.0]
            .children
            .entry(name.to_string())
            .or_insert(id);
        id
    }

    pub fn child(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.scopes[scope.0].children.get(name).copied()
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0].kind
    }

    pub fn name(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.0].name
    }

    pub fn declares(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0].symbols.contains_key(name)
    }

    pub fn get_local(&self, scope: ScopeId, name: &str) -> Option<&T> {
        self.scopes[scope.0].symbols.get(name)
    }

    /// Bind `name` in `scope`, replacing any previous binding.
    pub fn insert(&mut self, scope: ScopeId, name: &str, value: T) {
        let scope = &mut self.scopes[scope.0];
        if scope.symbols.insert(name.to_string(), value).is_none() {
            scope.order.push(name.to_string());
        }
    }

    /// Resolve through enclosing scopes, skipping class bodies: their
    /// members are reachable only through an instance.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&T> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let entry = &self.scopes[id.0];
            if entry.kind != ScopeKind::Class || id == scope {
                if let Some(value) = entry.symbols.get(name) {
                    return Some(value);
                }
            }
            current = entry.parent;
        }
        None
    }

    /// Bindings of one scope in insertion order.
    pub fn symbols(&self, scope: ScopeId) -> impl Iterator<Item = (&str, &T)> + '_ {
        let entry = &self.scopes[scope.0];
        entry
            .order
            .iter()
            .filter_map(move |name| entry.symbols.get(name).map(|value| (name.as_str(), value)))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
