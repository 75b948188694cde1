//! Expression checking methods

use crate::checker::TypeChecker;
use crate::error::SemanticError;
use crate::types::Type;
use pylang_ast::{BinaryOp, Expr, ExprKind, Identifier, Span, UnaryOp};

impl<'a> TypeChecker<'a> {
    /// Infer, record and return the type of `expr`.
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> Type {
        let ty = match &expr.kind {
            ExprKind::IntegerLiteral { .. } => Type::Int,
            ExprKind::StringLiteral { .. } => Type::Str,
            ExprKind::BooleanLiteral { .. } => Type::Bool,
            ExprKind::NoneLiteral => Type::None,
            ExprKind::Identifier { name } => match self.scopes.lookup(self.current, name) {
                Some(ty) => ty.clone(),
                None => {
                    SemanticError::NotAVariable(name.clone()).report(expr.span, self.errors);
                    Type::Object
                }
            },
            ExprKind::BinaryExpr {
                left,
                operator,
                right,
            } => self.check_binary(expr.span, left, *operator, right),
            ExprKind::UnaryExpr { operator, operand } => {
                let found = self.check_expr(operand);
                let expected = match operator {
                    UnaryOp::Neg => Type::Int,
                    UnaryOp::Not => Type::Bool,
                };
                if found != expected {
                    SemanticError::UnaryOperand {
                        op: *operator,
                        operand: found,
                    }
                    .report(expr.span, self.errors);
                }
                expected
            }
            ExprKind::IfExpr {
                condition,
                then_expr,
                else_expr,
            } => {
                self.check_condition(condition);
                let then_ty = self.check_expr(then_expr);
                let else_ty = self.check_expr(else_expr);
                self.join(&then_ty, &else_ty)
            }
            ExprKind::CallExpr { function, args } => self.check_call(expr.span, function, args),
            ExprKind::MethodCallExpr { method, args } => {
                self.check_method_call(expr.span, method, args)
            }
            ExprKind::MemberExpr { object, member } => {
                let object_ty = self.check_expr(object);
                self.check_member(expr.span, object_ty, member)
            }
            ExprKind::IndexExpr { list, index } => self.check_index(expr.span, list, index),
            ExprKind::ListExpr { elements } => {
                let mut element_ty: Option<Type> = None;
                for element in elements {
                    let ty = self.check_expr(element);
                    element_ty = Some(match element_ty {
                        Some(acc) => self.join(&acc, &ty),
                        None => ty,
                    });
                }
                element_ty.map(Type::list).unwrap_or(Type::Empty)
            }
        };
        self.record(expr, ty)
    }

    fn check_binary(&mut self, span: Span, left: &Expr, op: BinaryOp, right: &Expr) -> Type {
        let lt = self.check_expr(left);
        let rt = self.check_expr(right);
        let (ok, result) = match op {
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::FloorDiv | BinaryOp::Mod => {
                (lt == Type::Int && rt == Type::Int, Type::Int)
            }
            BinaryOp::Add => match (&lt, &rt) {
                (Type::Int, Type::Int) => (true, Type::Int),
                (Type::Str, Type::Str) => (true, Type::Str),
                (Type::List(a), Type::List(b)) => (true, Type::list(self.join(a, b))),
                _ if lt == Type::Int || rt == Type::Int => (false, Type::Int),
                _ => (false, Type::Object),
            },
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                (lt == Type::Int && rt == Type::Int, Type::Bool)
            }
            BinaryOp::Eq | BinaryOp::NotEq => (lt == rt && lt.is_primitive(), Type::Bool),
            BinaryOp::And | BinaryOp::Or => (lt == Type::Bool && rt == Type::Bool, Type::Bool),
            BinaryOp::Is => (!lt.is_primitive() && !rt.is_primitive(), Type::Bool),
        };
        if !ok {
            SemanticError::BinaryOperands {
                op,
                left: lt,
                right: rt,
            }
            .report(span, self.errors);
        }
        result
    }

    fn check_call(&mut self, span: Span, function: &Expr, args: &[Expr]) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.check_expr(arg)).collect();
        let Some(name) = function.as_identifier() else {
            let callee = self.check_expr(function);
            SemanticError::NotCallable(callee.to_string()).report(span, self.errors);
            return Type::Object;
        };
        match self.scopes.lookup(self.current, name).cloned() {
            Some(Type::Func { params, ret }) => {
                self.record(
                    function,
                    Type::Func {
                        params: params.clone(),
                        ret: ret.clone(),
                    },
                );
                let print_exception = name == "print" && args.len() == 1;
                self.check_arguments(span, &params, &arg_types, 0, print_exception);
                *ret
            }
            Some(class @ Type::UserDefinedClass { .. }) => {
                self.record(function, class);
                if !args.is_empty() {
                    SemanticError::ArityMismatch {
                        expected: 0,
                        found: args.len(),
                    }
                    .report(span, self.errors);
                }
                Type::class(name)
            }
            _ => {
                SemanticError::NotCallable(name.to_string()).report(span, self.errors);
                Type::Object
            }
        }
    }

    fn check_method_call(&mut self, span: Span, method: &Expr, args: &[Expr]) -> Type {
        let ExprKind::MemberExpr { object, member } = &method.kind else {
            self.check_expr(method);
            for arg in args {
                self.check_expr(arg);
            }
            SemanticError::NotCallable(member_name(method)).report(span, self.errors);
            return Type::Object;
        };
        let object_ty = self.check_expr(object);
        let arg_types: Vec<Type> = args.iter().map(|arg| self.check_expr(arg)).collect();
        match self.find_member(&object_ty, &member.name) {
            Some(Type::Func { params, ret }) => {
                self.record(
                    method,
                    Type::Func {
                        params: params.clone(),
                        ret: ret.clone(),
                    },
                );
                let after_receiver = params.get(1..).unwrap_or(&[]);
                self.check_arguments(span, after_receiver, &arg_types, 1, false);
                *ret
            }
            _ => {
                self.record(method, Type::Object);
                SemanticError::NoSuchMethod {
                    method: member.name.clone(),
                    class: object_ty,
                }
                .report(span, self.errors);
                Type::Object
            }
        }
    }

    /// Report an arity error or the first incompatible argument.
    fn check_arguments(
        &mut self,
        span: Span,
        params: &[Type],
        args: &[Type],
        first_index: usize,
        skip_arity: bool,
    ) {
        if params.len() != args.len() {
            if !skip_arity {
                SemanticError::ArityMismatch {
                    expected: params.len(),
                    found: args.len(),
                }
                .report(span, self.errors);
            }
            return;
        }
        for (i, (param, arg)) in params.iter().zip(args).enumerate() {
            if !self.compatible(param, arg) {
                SemanticError::ArgumentMismatch {
                    expected: param.clone(),
                    found: arg.clone(),
                    index: i + first_index,
                }
                .report(span, self.errors);
                break;
            }
        }
    }

    fn check_member(&mut self, span: Span, object_ty: Type, member: &Identifier) -> Type {
        match self.find_member(&object_ty, &member.name) {
            Some(ty) => ty,
            None => {
                SemanticError::NoSuchAttribute {
                    attribute: member.name.clone(),
                    class: object_ty,
                }
                .report(span, self.errors);
                Type::Object
            }
        }
    }

    fn check_index(&mut self, span: Span, list: &Expr, index: &Expr) -> Type {
        let list_ty = self.check_expr(list);
        let index_ty = self.check_expr(index);
        let element = match &list_ty {
            Type::Str => Type::Str,
            Type::List(element) => (**element).clone(),
            other => {
                SemanticError::NotIndexable(other.clone()).report(span, self.errors);
                return Type::Object;
            }
        };
        if index_ty != Type::Int {
            SemanticError::NonIntegerIndex(index_ty).report(index.span, self.errors);
        }
        element
    }
}

fn member_name(expr: &Expr) -> String {
    expr.as_identifier().unwrap_or("<expression>").to_string()
}
