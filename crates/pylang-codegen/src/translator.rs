//! Lowering of one routine (a function body or the top-level program)
//!
//! Frame layout, relative to `fp` (the stack pointer at entry):
//!
//! ```text
//!   4*(n-1-i)(fp)   parameter i of n (shifted by 4 when a static link is passed)
//!   0(fp)           static link, for nested functions
//!  -4(fp)           saved return address
//!  -8(fp)           saved caller frame pointer
//! -12(fp) ...       locals, one word each
//! -(S+4k)(fp)       k-th temporary, where S is the frame size
//! ```
//!
//! Temporaries are tracked statically, so `sp` always equals
//! `fp - S - 4*depth` between statements and around calls.

use crate::backend::{Label, Register, Register::*, RiscVBackend};
use crate::constants::Constants;
use crate::error::CodegenError;
use crate::runtime::{RuntimeLabels, ECALL_EXIT};
use crate::symbols::{FuncInfo, SymbolInfo, Symbols, ELEMENTS_OFFSET, PAYLOAD_OFFSET};
use pylang_analysis::{ScopeId, Type, TypeTable};
use pylang_ast::{Expr, ExprKind, Node, Stmt};

/// Context for translating a single routine
pub(crate) struct FunctionTranslator<'g, 'a> {
    /// Assembly output shared by all routines
    pub(crate) backend: &'g mut RiscVBackend,
    /// Literal pool shared by all routines
    pub(crate) constants: &'g mut Constants,
    /// Run-time locations of names
    pub(crate) symbols: &'g Symbols<'a>,
    /// Types inferred by analysis, keyed by expression id
    pub(crate) types: &'g TypeTable,
    pub(crate) runtime: &'g RuntimeLabels,
    /// Static nesting depth; 0 for top-level code
    pub(crate) level: u32,
    /// Scope names are resolved in
    pub(crate) scope: ScopeId,
    /// Bytes from `fp` to the first temporary
    pub(crate) frame_size: i32,
    /// Temporaries currently on the stack
    pub(crate) depth: i32,
    /// Where `return` jumps; absent at top level
    epilogue: Option<Label>,
}

impl<'g, 'a> FunctionTranslator<'g, 'a> {
    pub(crate) fn new(
        backend: &'g mut RiscVBackend,
        constants: &'g mut Constants,
        symbols: &'g Symbols<'a>,
        types: &'g TypeTable,
        runtime: &'g RuntimeLabels,
    ) -> Self {
        Self {
            backend,
            constants,
            scope: symbols.scopes.root(),
            symbols,
            types,
            runtime,
            level: 0,
            frame_size: 8,
            depth: 0,
            epilogue: None,
        }
    }

    // =========================================================================
    // Routines
    // =========================================================================

    /// Entry point: heap setup, top-level statements, exit.
    pub(crate) fn translate_main(&mut self, statements: &[Node<Stmt>], heap_bytes: i32) -> Result<(), CodegenError> {
        self.backend.emit_global_label(&Label::new("main"))?;
        self.backend.emit_li(A0, heap_bytes, "Initial heap size");
        self.backend.emit_jal(&self.runtime.heap_init, "Request heap");
        self.backend.emit_mv(Gp, A0, "Heap bottom");
        self.backend.emit_li(T0, heap_bytes, "");
        self.backend.emit_add(S11, Gp, T0, "Heap limit");
        self.backend.emit_addi(Sp, Sp, -self.frame_size, "Top-level frame");
        self.backend.emit_sw(Zero, Sp, self.frame_size - 4, "No return address");
        self.backend.emit_sw(Zero, Sp, self.frame_size - 8, "No caller frame");
        self.backend.emit_addi(Fp, Sp, self.frame_size, "");
        for stmt in statements {
            self.translate_stmt(stmt)?;
        }
        self.backend.emit_li(A0, ECALL_EXIT, "Code for ecall: exit");
        self.backend.emit_ecall("");
        Ok(())
    }

    pub(crate) fn translate_function(&mut self, func: &FuncInfo<'a>) -> Result<(), CodegenError> {
        let def = func
            .def
            .ok_or_else(|| CodegenError::malformed(format!("`{}` has no body", func.name)))?;
        tracing::trace!(function = %func.name, level = func.level, "translating function");

        self.level = func.level;
        self.scope = func.scope;
        self.frame_size = func.frame_size();
        self.depth = 0;
        let epilogue = self.backend.fresh_label();
        self.epilogue = Some(epilogue.clone());
        let size = self.frame_size;

        self.backend.emit_label(&func.label, &format!("Implementation for function: {}", func.name))?;
        self.backend.emit_addi(Sp, Sp, -size, "Reserve space for stack frame");
        self.backend.emit_sw(Ra, Sp, size - 4, "Return address");
        self.backend.emit_sw(Fp, Sp, size - 8, "Control link");
        self.backend.emit_addi(Fp, Sp, size, "New frame pointer");

        for (j, (name, init)) in func.locals.iter().enumerate() {
            self.load_literal(init)?;
            self.backend
                .emit_sw(A0, Fp, -(12 + 4 * j as i32), &format!("Local variable {}", name));
        }

        for stmt in &def.statements {
            self.translate_stmt(stmt)?;
        }
        self.backend.emit_mv(A0, Zero, "Implicit return of None");

        self.backend.emit_label(&epilogue, "Epilogue")?;
        self.backend.emit_lw(Ra, Fp, -4, "Get return address");
        self.backend.emit_mv(Sp, Fp, "Restore stack pointer");
        self.backend.emit_lw(Fp, Fp, -8, "Restore caller frame");
        self.backend.emit_jr(Ra, "Return to caller");
        self.epilogue = None;
        Ok(())
    }

    // =========================================================================
    // Temporaries
    // =========================================================================

    /// Push `reg` as a new temporary; returns its slot number.
    pub(crate) fn push(&mut self, reg: Register, comment: &str) -> i32 {
        self.backend.emit_push(reg, comment);
        self.depth += 1;
        self.depth
    }

    pub(crate) fn pop(&mut self, count: i32) {
        self.backend.emit_addi(Sp, Sp, 4 * count, "Pop temporaries");
        self.depth -= count;
    }

    pub(crate) fn load_temp(&mut self, reg: Register, slot: i32) {
        let offset = -(self.frame_size + 4 * slot);
        self.backend.emit_lw(reg, Fp, offset, "Reload temporary");
    }

    fn store_temp(&mut self, reg: Register, slot: i32) {
        let offset = -(self.frame_size + 4 * slot);
        self.backend.emit_sw(reg, Fp, offset, "");
    }

    /// Discard every temporary above `depth`, including call arguments.
    pub(crate) fn reset_stack(&mut self, depth: i32) {
        self.backend
            .emit_addi(Sp, Fp, -(self.frame_size + 4 * depth), "Set SP to stack frame top");
        self.depth = depth;
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub(crate) fn type_of(&self, expr: &Expr) -> Result<&'g Type, CodegenError> {
        let types: &'g TypeTable = self.types;
        types
            .get(expr.id)
            .ok_or_else(|| CodegenError::MissingType(expr.span.to_string()))
    }

    /// Register holding the frame pointer of the function at `level`.
    /// Clobbers `t0` when following static links.
    pub(crate) fn frame_of(&mut self, level: u32) -> Result<Register, CodegenError> {
        if level == self.level {
            return Ok(Fp);
        }
        if level > self.level {
            return Err(CodegenError::malformed(format!(
                "frame of level {} is not visible from level {}",
                level, self.level
            )));
        }
        self.backend.emit_mv(T0, Fp, "");
        for _ in level..self.level {
            self.backend.emit_lw(T0, T0, 0, "Follow static link");
        }
        Ok(T0)
    }

    pub(crate) fn load_var(&mut self, name: &str) -> Result<(), CodegenError> {
        let symbols = self.symbols;
        match symbols.lookup(self.scope, name)? {
            SymbolInfo::Global(label) => {
                self.backend.emit_lw_global(A0, label, &format!("Load global: {}", name));
            }
            SymbolInfo::Stack { level, offset } => {
                let (level, offset) = (*level, *offset);
                let base = self.frame_of(level)?;
                self.backend.emit_lw(A0, base, offset, &format!("Load var: {}", name));
            }
            SymbolInfo::Func(_) | SymbolInfo::Class(_) => {
                return Err(CodegenError::malformed(format!("`{}` is not a variable", name)));
            }
        }
        Ok(())
    }

    /// Store `a0` into the variable `name`.
    pub(crate) fn store_var(&mut self, name: &str) -> Result<(), CodegenError> {
        let symbols = self.symbols;
        match symbols.lookup(self.scope, name)? {
            SymbolInfo::Global(label) => {
                self.backend
                    .emit_sw_global(A0, label, T0, &format!("Assign global: {}", name));
            }
            SymbolInfo::Stack { level, offset } => {
                let (level, offset) = (*level, *offset);
                let base = self.frame_of(level)?;
                self.backend.emit_sw(A0, base, offset, &format!("Assign var: {}", name));
            }
            SymbolInfo::Func(_) | SymbolInfo::Class(_) => {
                return Err(CodegenError::malformed(format!("`{}` is not a variable", name)));
            }
        }
        Ok(())
    }

    /// Byte offset of attribute `name` in the static class of `object`.
    pub(crate) fn attribute_offset(&self, object: &Expr, name: &str) -> Result<i32, CodegenError> {
        let class = self.class_of(object)?;
        let info = self
            .symbols
            .class(class)
            .ok_or_else(|| CodegenError::UnresolvedSymbol(class.to_string()))?;
        info.attribute_offset(name)
            .ok_or_else(|| CodegenError::UnresolvedSymbol(format!("{}.{}", class, name)))
    }

    pub(crate) fn class_of(&self, object: &Expr) -> Result<&'g str, CodegenError> {
        let ty = self.type_of(object)?;
        ty.class_name()
            .ok_or_else(|| CodegenError::malformed(format!("value of type `{}` has no members", ty)))
    }

    pub(crate) fn load_literal(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match self.constants.literal(&expr.kind)? {
            Some(label) => self.backend.emit_la(A0, &label, "Load constant"),
            None => self.backend.emit_mv(A0, Zero, "Load None"),
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn translate_stmt(&mut self, stmt: &Node<Stmt>) -> Result<(), CodegenError> {
        match &stmt.value {
            Stmt::ExprStmt { expr } => self.translate_expr(expr),
            Stmt::AssignStmt { targets, value } => {
                self.translate_expr(value)?;
                let slot = self.push(A0, "Push assigned value");
                for target in targets {
                    self.assign_to(target, slot)?;
                }
                self.pop(1);
                Ok(())
            }
            Stmt::IfStmt {
                condition,
                then_body,
                else_body,
            } => {
                let otherwise = self.backend.fresh_label();
                let end = self.backend.fresh_label();
                self.translate_condition(condition)?;
                self.backend.emit_beqz(T0, &otherwise, "Branch on false");
                for stmt in then_body {
                    self.translate_stmt(stmt)?;
                }
                self.backend.emit_j(&end, "");
                self.backend.emit_label(&otherwise, "Else branch")?;
                for stmt in else_body {
                    self.translate_stmt(stmt)?;
                }
                self.backend.emit_label(&end, "End of if")
            }
            Stmt::WhileStmt { condition, body } => {
                let top = self.backend.fresh_label();
                let end = self.backend.fresh_label();
                self.backend.emit_label(&top, "Loop condition")?;
                self.translate_condition(condition)?;
                self.backend.emit_beqz(T0, &end, "Exit loop");
                for stmt in body {
                    self.translate_stmt(stmt)?;
                }
                self.backend.emit_j(&top, "");
                self.backend.emit_label(&end, "End of while")
            }
            Stmt::ForStmt {
                identifier,
                iterable,
                body,
            } => self.translate_for(identifier, iterable, body),
            Stmt::ReturnStmt { value } => {
                let epilogue = self
                    .epilogue
                    .clone()
                    .ok_or_else(|| CodegenError::malformed("return outside of a function"))?;
                match value {
                    Some(value) => self.translate_expr(value)?,
                    None => self.backend.emit_mv(A0, Zero, "Return None"),
                }
                self.backend.emit_j(&epilogue, "Go to return");
                Ok(())
            }
        }
    }

    /// Evaluate a boolean condition, leaving its raw value in `t0`.
    pub(crate) fn translate_condition(&mut self, condition: &Expr) -> Result<(), CodegenError> {
        self.translate_expr(condition)?;
        self.backend.emit_beqz(A0, &self.runtime.error_none, "");
        self.backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "Unbox condition");
        Ok(())
    }

    fn assign_to(&mut self, target: &Expr, slot: i32) -> Result<(), CodegenError> {
        match &target.kind {
            ExprKind::Identifier { name } => {
                self.load_temp(A0, slot);
                self.store_var(name)
            }
            ExprKind::MemberExpr { object, member } => {
                let offset = self.attribute_offset(object, &member.name)?;
                self.translate_expr(object)?;
                self.backend.emit_beqz(A0, &self.runtime.error_none, "Operation on None");
                self.load_temp(T0, slot);
                self.backend
                    .emit_sw(T0, A0, offset, &format!("Set attribute: {}", member.name));
                Ok(())
            }
            ExprKind::IndexExpr { list, index } => {
                self.translate_expr(list)?;
                let list_slot = self.push(A0, "Push list");
                self.translate_expr(index)?;
                self.backend.emit_beqz(A0, &self.runtime.error_none, "");
                self.backend.emit_lw(T1, A0, PAYLOAD_OFFSET, "Unbox index");
                self.load_temp(A0, list_slot);
                self.pop(1);
                self.emit_bounds_check()?;
                self.backend.emit_slli(T1, T1, 2, "Index in bytes");
                self.backend.emit_add(T1, A0, T1, "");
                self.load_temp(T0, slot);
                self.backend.emit_sw(T0, T1, ELEMENTS_OFFSET, "Store list element");
                Ok(())
            }
            _ => Err(CodegenError::malformed("assignment to a non-target expression")),
        }
    }

    /// Check that `a0` is a sequence and `t1` a valid index into it.
    pub(crate) fn emit_bounds_check(&mut self) -> Result<(), CodegenError> {
        self.backend.emit_beqz(A0, &self.runtime.error_none, "Operation on None");
        self.backend.emit_lw(T2, A0, PAYLOAD_OFFSET, "Length");
        self.backend
            .emit_bgeu(T1, T2, &self.runtime.error_oob, "Index out of bounds (also catches negatives)");
        Ok(())
    }

    fn translate_for(&mut self, identifier: &Expr, iterable: &Expr, body: &[Node<Stmt>]) -> Result<(), CodegenError> {
        let name = identifier
            .as_identifier()
            .ok_or_else(|| CodegenError::malformed("loop variable is not an identifier"))?;
        let over_string = matches!(self.type_of(iterable)?, Type::Str);

        self.translate_expr(iterable)?;
        self.backend.emit_beqz(A0, &self.runtime.error_none, "Iterating over None");
        let seq = self.push(A0, "Push sequence");
        self.backend.emit_li(T0, 0, "Loop index");
        let idx = self.push(T0, "Push index");

        let top = self.backend.fresh_label();
        let end = self.backend.fresh_label();
        self.backend.emit_label(&top, "For loop")?;
        self.load_temp(T1, idx);
        self.load_temp(A0, seq);
        self.backend.emit_lw(T2, A0, PAYLOAD_OFFSET, "Length");
        self.backend.emit_bge(T1, T2, &end, "Done when index reaches length");
        if over_string {
            self.backend.emit_mv(A1, T1, "");
            self.backend.emit_jal(&self.runtime.strchar, "Next character");
        } else {
            self.backend.emit_slli(T1, T1, 2, "");
            self.backend.emit_add(T1, A0, T1, "");
            self.backend.emit_lw(A0, T1, ELEMENTS_OFFSET, "Next element");
        }
        self.store_var(name)?;
        self.load_temp(T1, idx);
        self.backend.emit_addi(T1, T1, 1, "Advance index");
        self.store_temp(T1, idx);
        for stmt in body {
            self.translate_stmt(stmt)?;
        }
        self.backend.emit_j(&top, "");
        self.backend.emit_label(&end, "End of for")?;
        self.pop(2);
        Ok(())
    }
}
