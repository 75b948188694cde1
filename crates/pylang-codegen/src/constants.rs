//! Constant pool for boxed literals
//!
//! Every integer, string, and boolean literal in the program lives in the
//! data section as a pre-built object. `False` and `True` always occupy
//! the first two slots.

use crate::backend::{Label, RiscVBackend};
use crate::error::CodegenError;
use crate::symbols::{dispatch_table_label, BOOL_TAG, INT_TAG, STR_TAG};
use pylang_ast::ExprKind;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Constant {
    Bool(bool),
    Int(i32),
    Str(String),
}

#[derive(Debug)]
pub struct Constants {
    entries: Vec<Constant>,
    index: HashMap<Constant, usize>,
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}

impl Constants {
    pub fn new() -> Self {
        let mut pool = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        pool.intern(Constant::Bool(false));
        pool.intern(Constant::Bool(true));
        pool
    }

    fn intern(&mut self, constant: Constant) -> Label {
        let slot = match self.index.get(&constant) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.entries.push(constant.clone());
                self.index.insert(constant, slot);
                slot
            }
        };
        label_for(slot)
    }

    pub fn int(&mut self, value: i32) -> Label {
        self.intern(Constant::Int(value))
    }

    pub fn str(&mut self, value: &str) -> Label {
        self.intern(Constant::Str(value.to_string()))
    }

    pub fn bool(&mut self, value: bool) -> Label {
        self.intern(Constant::Bool(value))
    }

    /// Label of a literal's boxed object; `None` for the `None` literal,
    /// which is the null pointer.
    pub fn literal(&mut self, kind: &ExprKind) -> Result<Option<Label>, CodegenError> {
        match kind {
            ExprKind::IntegerLiteral { value } => Ok(Some(self.int(*value))),
            ExprKind::StringLiteral { value } => Ok(Some(self.str(value))),
            ExprKind::BooleanLiteral { value } => Ok(Some(self.bool(*value))),
            ExprKind::NoneLiteral => Ok(None),
            _ => Err(CodegenError::malformed("initializer is not a literal")),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn emit(&self, backend: &mut RiscVBackend) -> Result<(), CodegenError> {
        let int_table = dispatch_table_label("int");
        let bool_table = dispatch_table_label("bool");
        let str_table = dispatch_table_label("str");
        for (slot, constant) in self.entries.iter().enumerate() {
            backend.emit_align(2);
            backend.emit_label(&label_for(slot), "")?;
            match constant {
                Constant::Bool(value) => {
                    backend.emit_word(BOOL_TAG, "type tag");
                    backend.emit_word(4, "object size");
                    backend.emit_word_address(&bool_table, "");
                    backend.emit_word(*value as i32, if *value { "True" } else { "False" });
                }
                Constant::Int(value) => {
                    backend.emit_word(INT_TAG, "type tag");
                    backend.emit_word(4, "object size");
                    backend.emit_word_address(&int_table, "");
                    backend.emit_word(*value, "");
                }
                Constant::Str(value) => {
                    backend.emit_word(STR_TAG, "type tag");
                    backend.emit_word(str_object_words(value.len()), "object size");
                    backend.emit_word_address(&str_table, "");
                    backend.emit_word(value.len() as i32, "length");
                    backend.emit_string(value, "");
                }
            }
        }
        Ok(())
    }
}

fn label_for(slot: usize) -> Label {
    Label::new(format!("const_{}", slot))
}

/// Words occupied by a string object of `len` bytes, header included.
pub fn str_object_words(len: usize) -> i32 {
    (4 + (len + 1).div_ceil(4)) as i32
}
