//! Run-time locations of every name in a program
//!
//! Symbols are collected in two phases per nesting level: first every
//! binding a scope introduces (parameters, locals, nested functions),
//! then the `global`/`nonlocal` aliases, which copy an outer binding.
//! Nested functions are filled in only after their parent is complete.

use crate::backend::Label;
use crate::error::CodegenError;
use pylang_analysis::{ScopeId, ScopeKind, ScopeTree};
use pylang_ast::{Decl, Expr, FuncDef, Program};
use std::collections::HashMap;

// =============================================================================
// Object layout
// =============================================================================

pub const OBJECT_TAG: i32 = 0;
pub const INT_TAG: i32 = 1;
pub const BOOL_TAG: i32 = 2;
pub const STR_TAG: i32 = 3;
pub const LIST_TAG: i32 = -1;

/// Words before the first attribute: tag, size, dispatch table.
pub const HEADER_WORDS: i32 = 3;

/// Byte offset of the first attribute (and of int/bool/str/list payloads).
pub const PAYLOAD_OFFSET: i32 = 4 * HEADER_WORDS;

/// Byte offset of the first element of a list, or first byte of a string.
pub const ELEMENTS_OFFSET: i32 = PAYLOAD_OFFSET + 4;

pub fn prototype_label(class: &str) -> Label {
    Label::new(format!("${}$prototype", class))
}

pub fn dispatch_table_label(class: &str) -> Label {
    Label::new(format!("${}$dispatchTable", class))
}

pub fn list_prototype_label() -> Label {
    prototype_label(".list")
}

// =============================================================================
// Symbol kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassId(pub usize);

/// Where a name lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolInfo {
    /// Module variable stored at a data label
    Global(Label),
    /// Parameter or local of the function at nesting `level`,
    /// `offset` bytes from that function's frame pointer
    Stack { level: u32, offset: i32 },
    Func(FuncId),
    Class(ClassId),
}

#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    pub name: String,
    /// Literal initializer; builtin payload slots have none and start zeroed.
    pub init: Option<&'a Expr>,
}

#[derive(Debug, Clone)]
pub struct ClassInfo<'a> {
    pub name: String,
    pub tag: i32,
    /// Inherited attributes first, in ancestor declaration order
    pub attributes: Vec<Attribute<'a>>,
    /// Dispatch table; `__init__` is always slot 0 and overrides keep the
    /// slot of the method they replace
    pub methods: Vec<(String, Label)>,
}

impl ClassInfo<'_> {
    pub fn prototype(&self) -> Label {
        prototype_label(&self.name)
    }

    pub fn dispatch_table(&self) -> Label {
        dispatch_table_label(&self.name)
    }

    pub fn size_words(&self) -> i32 {
        HEADER_WORDS + self.attributes.len() as i32
    }

    pub fn attribute_offset(&self, name: &str) -> Option<i32> {
        self.attributes
            .iter()
            .position(|attr| attr.name == name)
            .map(|i| PAYLOAD_OFFSET + 4 * i as i32)
    }

    pub fn method_index(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|(method, _)| method == name)
    }
}

#[derive(Debug, Clone)]
pub struct FuncInfo<'a> {
    /// Dotted path: `f`, `f.g`, `C.m`
    pub name: String,
    pub label: Label,
    /// 1 for top-level functions and methods, parent + 1 when nested
    pub level: u32,
    pub params: Vec<String>,
    pub locals: Vec<(String, &'a Expr)>,
    pub scope: ScopeId,
    /// `None` for routines provided by the runtime
    pub def: Option<&'a FuncDef>,
}

impl FuncInfo<'_> {
    /// Bytes between the frame pointer and the first temporary.
    pub fn frame_size(&self) -> i32 {
        8 + 4 * self.locals.len() as i32
    }

    /// Nested functions receive their parent's frame as a hidden last argument.
    pub fn has_static_link(&self) -> bool {
        self.level >= 2
    }
}

#[derive(Debug, Clone)]
pub struct GlobalVar<'a> {
    pub name: String,
    pub label: Label,
    pub init: &'a Expr,
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug)]
pub struct Symbols<'a> {
    pub scopes: ScopeTree<SymbolInfo>,
    pub classes: Vec<ClassInfo<'a>>,
    pub functions: Vec<FuncInfo<'a>>,
    pub globals: Vec<GlobalVar<'a>>,
    class_index: HashMap<String, ClassId>,
}

impl<'a> Symbols<'a> {
    pub fn collect(program: &'a Program) -> Result<Self, CodegenError> {
        let mut symbols = Self::with_builtins();
        let root = symbols.scopes.root();
        let mut pending = Vec::new();

        for decl in &program.declarations {
            match &decl.value {
                Decl::VarDef { var, value } => {
                    let name = var.name().to_string();
                    let label = Label::new(format!("${}", name));
                    symbols.scopes.insert(root, &name, SymbolInfo::Global(label.clone()));
                    symbols.globals.push(GlobalVar {
                        name,
                        label,
                        init: value,
                    });
                }
                Decl::FuncDef(def) => {
                    let id = symbols.add_function(def, root, 1, def.name.name.clone());
                    symbols.scopes.insert(root, &def.name.name, SymbolInfo::Func(id));
                    pending.push(id);
                }
                Decl::ClassDef(def) => {
                    let methods = symbols.add_class(def)?;
                    pending.extend(methods);
                }
                Decl::GlobalDecl { .. } | Decl::NonLocalDecl { .. } => {}
            }
        }

        for id in pending {
            symbols.fill_function(id)?;
        }
        tracing::debug!(
            classes = symbols.classes.len(),
            functions = symbols.functions.len(),
            globals = symbols.globals.len(),
            "collected symbols"
        );
        Ok(symbols)
    }

    fn with_builtins() -> Self {
        let mut symbols = Self {
            scopes: ScopeTree::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            class_index: HashMap::new(),
        };
        let root = symbols.scopes.root();

        let init = symbols.add_builtin_function("object.__init__", &["self"]);
        let init_label = symbols.functions[init.0].label.clone();
        for (name, tag, payload) in [
            ("object", OBJECT_TAG, &[][..]),
            ("int", INT_TAG, &["__int__"][..]),
            ("bool", BOOL_TAG, &["__bool__"][..]),
            ("str", STR_TAG, &["__len__", "__str__"][..]),
        ] {
            let id = ClassId(symbols.classes.len());
            symbols.classes.push(ClassInfo {
                name: name.to_string(),
                tag,
                attributes: payload
                    .iter()
                    .map(|attr| Attribute {
                        name: attr.to_string(),
                        init: None,
                    })
                    .collect(),
                methods: vec![("__init__".to_string(), init_label.clone())],
            });
            symbols.class_index.insert(name.to_string(), id);
            symbols.scopes.insert(root, name, SymbolInfo::Class(id));
        }

        for (name, params) in [("print", &["arg"][..]), ("len", &["arg"][..]), ("input", &[][..])] {
            let id = symbols.add_builtin_function(name, params);
            symbols.scopes.insert(root, name, SymbolInfo::Func(id));
        }
        symbols
    }

    fn add_builtin_function(&mut self, name: &str, params: &[&str]) -> FuncId {
        let root = self.scopes.root();
        let scope = self.scopes.add_child(root, name, ScopeKind::Function);
        let id = FuncId(self.functions.len());
        self.functions.push(FuncInfo {
            name: name.to_string(),
            label: Label::new(format!("${}", name)),
            level: 1,
            params: params.iter().map(|p| p.to_string()).collect(),
            locals: Vec::new(),
            scope,
            def: None,
        });
        id
    }

    fn add_function(&mut self, def: &'a FuncDef, parent: ScopeId, level: u32, name: String) -> FuncId {
        let scope = self.scopes.add_child(parent, &name, ScopeKind::Function);
        let id = FuncId(self.functions.len());
        self.functions.push(FuncInfo {
            label: Label::new(format!("${}", name)),
            name,
            level,
            params: def.params.iter().map(|p| p.name().to_string()).collect(),
            locals: Vec::new(),
            scope,
            def: Some(def),
        });
        id
    }

    /// Register a class and its methods; returns the methods to fill.
    fn add_class(&mut self, def: &'a pylang_ast::ClassDef) -> Result<Vec<FuncId>, CodegenError> {
        let root = self.scopes.root();
        let parent = self
            .class(&def.super_class.name)
            .ok_or_else(|| CodegenError::UnresolvedSymbol(def.super_class.name.clone()))?;
        let mut attributes = parent.attributes.clone();
        let mut methods = parent.methods.clone();
        let mut method_ids = Vec::new();
        let class_name = def.name.name.clone();

        for decl in &def.declarations {
            match &decl.value {
                Decl::VarDef { var, value } => attributes.push(Attribute {
                    name: var.name().to_string(),
                    init: Some(value),
                }),
                Decl::FuncDef(method) => {
                    let qualified = format!("{}.{}", class_name, method.name.name);
                    let id = self.add_function(method, root, 1, qualified);
                    let label = self.functions[id.0].label.clone();
                    match methods.iter_mut().find(|(name, _)| *name == method.name.name) {
                        Some(slot) => slot.1 = label,
                        None => methods.push((method.name.name.clone(), label)),
                    }
                    method_ids.push(id);
                }
                _ => {}
            }
        }

        let id = ClassId(self.classes.len());
        self.classes.push(ClassInfo {
            name: class_name.clone(),
            tag: self.classes.len() as i32,
            attributes,
            methods,
        });
        self.class_index.insert(class_name.clone(), id);
        self.scopes.insert(root, &class_name, SymbolInfo::Class(id));
        Ok(method_ids)
    }

    fn fill_function(&mut self, id: FuncId) -> Result<(), CodegenError> {
        let (def, scope, level, qualified) = {
            let func = &self.functions[id.0];
            let def = func
                .def
                .ok_or_else(|| CodegenError::malformed(format!("`{}` has no body", func.name)))?;
            (def, func.scope, func.level, func.name.clone())
        };

        let count = def.params.len() as i32;
        let link = if level >= 2 { 4 } else { 0 };
        for (i, param) in def.params.iter().enumerate() {
            let offset = 4 * (count - 1 - i as i32) + link;
            self.scopes.insert(scope, param.name(), SymbolInfo::Stack { level, offset });
        }

        let mut nested = Vec::new();
        for decl in &def.declarations {
            match &decl.value {
                Decl::VarDef { var, value } => {
                    let locals = &mut self.functions[id.0].locals;
                    let offset = -(12 + 4 * locals.len() as i32);
                    locals.push((var.name().to_string(), value));
                    self.scopes.insert(scope, var.name(), SymbolInfo::Stack { level, offset });
                }
                Decl::FuncDef(inner) => {
                    let name = format!("{}.{}", qualified, inner.name.name);
                    let inner_id = self.add_function(inner, scope, level + 1, name);
                    self.scopes.insert(scope, &inner.name.name, SymbolInfo::Func(inner_id));
                    nested.push(inner_id);
                }
                _ => {}
            }
        }

        for decl in &def.declarations {
            match &decl.value {
                Decl::GlobalDecl { variable } => {
                    let root = self.scopes.root();
                    let target = self
                        .scopes
                        .get_local(root, &variable.name)
                        .cloned()
                        .ok_or_else(|| CodegenError::UnresolvedSymbol(variable.name.clone()))?;
                    self.scopes.insert(scope, &variable.name, target);
                }
                Decl::NonLocalDecl { variable } => {
                    let target = self
                        .scopes
                        .parent(scope)
                        .and_then(|outer| self.scopes.lookup(outer, &variable.name))
                        .cloned()
                        .ok_or_else(|| CodegenError::UnresolvedSymbol(variable.name.clone()))?;
                    if !matches!(target, SymbolInfo::Stack { .. }) {
                        return Err(CodegenError::malformed(format!(
                            "nonlocal `{}` is not a local of an enclosing function",
                            variable.name
                        )));
                    }
                    self.scopes.insert(scope, &variable.name, target);
                }
                _ => {}
            }
        }

        for inner in nested {
            self.fill_function(inner)?;
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn class(&self, name: &str) -> Option<&ClassInfo<'a>> {
        self.class_index.get(name).map(|id| &self.classes[id.0])
    }

    pub fn function(&self, id: FuncId) -> &FuncInfo<'a> {
        &self.functions[id.0]
    }

    pub fn class_by_id(&self, id: ClassId) -> &ClassInfo<'a> {
        &self.classes[id.0]
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Result<&SymbolInfo, CodegenError> {
        self.scopes
            .lookup(scope, name)
            .ok_or_else(|| CodegenError::UnresolvedSymbol(name.to_string()))
    }

    /// Functions with bodies to compile, in registration order.
    pub fn user_functions(&self) -> impl Iterator<Item = &FuncInfo<'a>> {
        self.functions.iter().filter(|f| f.def.is_some())
    }
}
