//! Expression lowering; every expression leaves its (boxed) value in `a0`

use crate::backend::Register::*;
use crate::error::CodegenError;
use crate::symbols::{list_prototype_label, ClassId, SymbolInfo, ELEMENTS_OFFSET, PAYLOAD_OFFSET};
use crate::translator::FunctionTranslator;
use pylang_analysis::Type;
use pylang_ast::{BinaryOp, Expr, ExprKind, UnaryOp};

impl FunctionTranslator<'_, '_> {
    pub(crate) fn translate_expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::IntegerLiteral { .. }
            | ExprKind::StringLiteral { .. }
            | ExprKind::BooleanLiteral { .. }
            | ExprKind::NoneLiteral => self.load_literal(expr),
            ExprKind::Identifier { name } => self.load_var(name),
            ExprKind::BinaryExpr {
                left,
                operator,
                right,
            } => self.translate_binary(left, *operator, right),
            ExprKind::UnaryExpr { operator, operand } => self.translate_unary(*operator, operand),
            ExprKind::IfExpr {
                condition,
                then_expr,
                else_expr,
            } => {
                let otherwise = self.backend.fresh_label();
                let end = self.backend.fresh_label();
                self.translate_condition(condition)?;
                self.backend.emit_beqz(T0, &otherwise, "");
                self.translate_expr(then_expr)?;
                self.backend.emit_j(&end, "");
                self.backend.emit_label(&otherwise, "")?;
                self.translate_expr(else_expr)?;
                self.backend.emit_label(&end, "End of if-expression")
            }
            ExprKind::CallExpr { function, args } => self.translate_call(function, args),
            ExprKind::MethodCallExpr { method, args } => self.translate_method_call(method, args),
            ExprKind::MemberExpr { object, member } => {
                let offset = self.attribute_offset(object, &member.name)?;
                self.translate_expr(object)?;
                self.backend.emit_beqz(A0, &self.runtime.error_none, "Operation on None");
                self.backend
                    .emit_lw(A0, A0, offset, &format!("Get attribute: {}", member.name));
                Ok(())
            }
            ExprKind::IndexExpr { list, index } => self.translate_index(list, index),
            ExprKind::ListExpr { elements } => self.translate_list(elements),
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn translate_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<(), CodegenError> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let end = self.backend.fresh_label();
            self.translate_condition(left)?;
            if op == BinaryOp::And {
                self.backend.emit_beqz(T0, &end, "Short-circuit on False");
            } else {
                self.backend.emit_bnez(T0, &end, "Short-circuit on True");
            }
            self.translate_expr(right)?;
            return self.backend.emit_label(&end, "");
        }

        let left_ty = self.type_of(left)?;
        self.translate_expr(right)?;
        let slot = self.push(A0, "Push right operand");
        self.translate_expr(left)?;
        self.load_temp(T1, slot);
        self.pop(1);
        // a0: left, t1: right

        match (op, left_ty) {
            (BinaryOp::Is, _) => {
                self.backend.emit_xor(T0, A0, T1, "");
                self.backend.emit_seqz(T0, T0, "Same object");
                self.box_bool()
            }
            (BinaryOp::Add, Type::Str) => {
                self.check_operands_not_none();
                self.backend.emit_mv(A1, T1, "");
                self.backend.emit_jal(&self.runtime.strcat, "Concatenate strings");
                Ok(())
            }
            (BinaryOp::Add, Type::List(_)) => {
                self.check_operands_not_none();
                self.backend.emit_mv(A1, T1, "");
                self.backend.emit_jal(&self.runtime.concat, "Concatenate lists");
                Ok(())
            }
            (BinaryOp::Eq | BinaryOp::NotEq, Type::Str) => {
                self.check_operands_not_none();
                self.backend.emit_mv(A1, T1, "");
                let routine = if op == BinaryOp::Eq {
                    &self.runtime.streql
                } else {
                    &self.runtime.strneql
                };
                self.backend.emit_jal(routine, "Compare strings");
                self.backend.emit_jal(&self.runtime.makebool, "Box result");
                Ok(())
            }
            (BinaryOp::Eq | BinaryOp::NotEq, _) => {
                self.unbox_operands();
                self.backend.emit_xor(T0, T0, T1, "");
                if op == BinaryOp::Eq {
                    self.backend.emit_seqz(T0, T0, "Operands equal");
                } else {
                    self.backend.emit_snez(T0, T0, "Operands differ");
                }
                self.box_bool()
            }
            (BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq, _) => {
                self.unbox_operands();
                match op {
                    BinaryOp::Lt => self.backend.emit_slt(T0, T0, T1, "<"),
                    BinaryOp::Gt => self.backend.emit_slt(T0, T1, T0, ">"),
                    BinaryOp::LtEq => {
                        self.backend.emit_slt(T0, T1, T0, "");
                        self.backend.emit_xori(T0, T0, 1, "<=");
                    }
                    _ => {
                        self.backend.emit_slt(T0, T0, T1, "");
                        self.backend.emit_xori(T0, T0, 1, ">=");
                    }
                }
                self.box_bool()
            }
            (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul, _) => {
                self.unbox_operands();
                match op {
                    BinaryOp::Add => self.backend.emit_add(T0, T0, T1, "+"),
                    BinaryOp::Sub => self.backend.emit_sub(T0, T0, T1, "-"),
                    _ => self.backend.emit_mul(T0, T0, T1, "*"),
                }
                self.box_int()
            }
            (BinaryOp::FloorDiv | BinaryOp::Mod, _) => {
                self.unbox_operands();
                self.backend.emit_beqz(T1, &self.runtime.error_div, "Division by zero");
                let done = self.backend.fresh_label();
                if op == BinaryOp::FloorDiv {
                    self.backend.emit_div(T2, T0, T1, "Truncated quotient");
                    self.backend.emit_rem(T3, T0, T1, "");
                    self.backend.emit_beqz(T3, &done, "Exact");
                    self.backend.emit_xor(T4, T3, T1, "");
                    self.backend.emit_bge(T4, Zero, &done, "Remainder and divisor agree in sign");
                    self.backend.emit_addi(T2, T2, -1, "Round toward negative infinity");
                } else {
                    self.backend.emit_rem(T2, T0, T1, "Truncated remainder");
                    self.backend.emit_beqz(T2, &done, "Exact");
                    self.backend.emit_xor(T4, T2, T1, "");
                    self.backend.emit_bge(T4, Zero, &done, "Remainder and divisor agree in sign");
                    self.backend.emit_add(T2, T2, T1, "Take the sign of the divisor");
                }
                self.backend.emit_label(&done, "")?;
                self.backend.emit_mv(T0, T2, "");
                self.box_int()
            }
            (BinaryOp::And | BinaryOp::Or, _) => Err(CodegenError::malformed("unexpected logical operator")),
        }
    }

    fn translate_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), CodegenError> {
        self.translate_expr(operand)?;
        self.backend.emit_beqz(A0, &self.runtime.error_none, "Operation on None");
        self.backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "Unbox operand");
        match op {
            UnaryOp::Neg => {
                self.backend.emit_sub(T0, Zero, T0, "Negate");
                self.box_int()
            }
            UnaryOp::Not => {
                self.backend.emit_seqz(T0, T0, "Logical not");
                self.box_bool()
            }
        }
    }

    fn check_operands_not_none(&mut self) {
        self.backend.emit_beqz(A0, &self.runtime.error_none, "Left operand is None");
        self.backend.emit_beqz(T1, &self.runtime.error_none, "Right operand is None");
    }

    /// Raw payloads of `a0` and `t1` into `t0` and `t1`.
    fn unbox_operands(&mut self) {
        self.check_operands_not_none();
        self.backend.emit_lw(T0, A0, PAYLOAD_OFFSET, "Unbox left");
        self.backend.emit_lw(T1, T1, PAYLOAD_OFFSET, "Unbox right");
    }

    fn box_int(&mut self) -> Result<(), CodegenError> {
        self.backend.emit_mv(A0, T0, "");
        self.backend.emit_jal(&self.runtime.makeint, "Box int");
        Ok(())
    }

    fn box_bool(&mut self) -> Result<(), CodegenError> {
        self.backend.emit_mv(A0, T0, "");
        self.backend.emit_jal(&self.runtime.makebool, "Box bool");
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn translate_call(&mut self, function: &Expr, args: &[Expr]) -> Result<(), CodegenError> {
        let name = function
            .as_identifier()
            .ok_or_else(|| CodegenError::malformed("callee is not a name"))?;
        let symbols = self.symbols;
        match symbols.lookup(self.scope, name)? {
            SymbolInfo::Class(class) => self.translate_construct(*class),
            SymbolInfo::Func(id) => {
                let callee = symbols.function(*id);
                let base = self.depth;
                for arg in args {
                    self.translate_expr(arg)?;
                    self.push(A0, "Push argument");
                }
                if callee.has_static_link() {
                    let frame = self.frame_of(callee.level - 1)?;
                    self.push(frame, "Push static link");
                }
                self.backend
                    .emit_jal(&callee.label, &format!("Invoke function: {}", callee.name));
                self.reset_stack(base);
                Ok(())
            }
            SymbolInfo::Global(_) | SymbolInfo::Stack { .. } => {
                Err(CodegenError::malformed(format!("`{}` is not callable", name)))
            }
        }
    }

    fn translate_construct(&mut self, class: ClassId) -> Result<(), CodegenError> {
        let info = self.symbols.class_by_id(class);
        let base = self.depth;
        self.backend
            .emit_la(A0, &info.prototype(), &format!("Load pointer to prototype of: {}", info.name));
        self.backend.emit_jal(&self.runtime.alloc, "Allocate new object");
        let object = self.push(A0, "Push object as `self`");
        self.backend.emit_lw(A1, A0, 8, "Load address of dispatch table");
        self.backend.emit_lw(A1, A1, 0, "Load address of method: __init__");
        self.backend.emit_jalr(A1, "Invoke constructor");
        self.load_temp(A0, object);
        self.reset_stack(base);
        Ok(())
    }

    fn translate_method_call(&mut self, method: &Expr, args: &[Expr]) -> Result<(), CodegenError> {
        let ExprKind::MemberExpr { object, member } = &method.kind else {
            return Err(CodegenError::malformed("method callee is not a member expression"));
        };
        let class = self.class_of(object)?;
        let index = self
            .symbols
            .class(class)
            .and_then(|info| info.method_index(&member.name))
            .ok_or_else(|| CodegenError::UnresolvedSymbol(format!("{}.{}", class, member.name)))?;

        let base = self.depth;
        self.translate_expr(object)?;
        let receiver = self.push(A0, "Push receiver as `self`");
        for arg in args {
            self.translate_expr(arg)?;
            self.push(A0, "Push argument");
        }
        self.load_temp(A0, receiver);
        self.backend.emit_beqz(A0, &self.runtime.error_none, "Method call on None");
        self.backend.emit_lw(A1, A0, 8, "Load address of dispatch table");
        self.backend.emit_lw(
            A1,
            A1,
            4 * index as i32,
            &format!("Load address of method: {}.{}", class, member.name),
        );
        self.backend.emit_jalr(A1, "Invoke method");
        self.reset_stack(base);
        Ok(())
    }

    // =========================================================================
    // Sequences
    // =========================================================================

    fn translate_index(&mut self, list: &Expr, index: &Expr) -> Result<(), CodegenError> {
        let is_string = matches!(self.type_of(list)?, Type::Str);
        self.translate_expr(list)?;
        let slot = self.push(A0, "Push sequence");
        self.translate_expr(index)?;
        self.backend.emit_beqz(A0, &self.runtime.error_none, "Index is None");
        self.backend.emit_lw(T1, A0, PAYLOAD_OFFSET, "Unbox index");
        self.load_temp(A0, slot);
        self.pop(1);
        self.emit_bounds_check()?;
        if is_string {
            self.backend.emit_mv(A1, T1, "");
            self.backend.emit_jal(&self.runtime.strchar, "Character at index");
        } else {
            self.backend.emit_slli(T1, T1, 2, "Index in bytes");
            self.backend.emit_add(T1, A0, T1, "");
            self.backend.emit_lw(A0, T1, ELEMENTS_OFFSET, "Load list element");
        }
        Ok(())
    }

    fn translate_list(&mut self, elements: &[Expr]) -> Result<(), CodegenError> {
        let base = self.depth;
        for element in elements {
            self.translate_expr(element)?;
            self.push(A0, "Push list element");
        }
        let count = elements.len() as i32;
        self.backend.emit_la(A0, &list_prototype_label(), "");
        self.backend.emit_li(A1, 4 + count, "List object size in words");
        self.backend.emit_jal(&self.runtime.alloc2, "Allocate list");
        self.backend.emit_li(T0, count, "");
        self.backend.emit_sw(T0, A0, PAYLOAD_OFFSET, "Set length");
        for i in 0..count {
            self.load_temp(T0, base + 1 + i);
            self.backend.emit_sw(T0, A0, ELEMENTS_OFFSET + 4 * i, "");
        }
        self.reset_stack(base);
        Ok(())
    }
}
