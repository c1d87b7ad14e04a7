use crate::parser::ast::Expr;
use crate::span::{Span, Spanned};
use super::builtins::{BOOLEAN, INT, NOTHING, PGM, STRING};
use super::env::{ClassHierarchy, Ctx, MethodSignature};
use super::errors::{Diagnostic, ErrorKind};
use super::types::{QuackType, TypeTable};

/// Expression typing against the current state of the hierarchy. Never
/// mutates type tables; problems go to the caller's diagnostic list.
pub struct ExprTyper<'h> {
    hierarchy: &'h ClassHierarchy,
}

impl<'h> ExprTyper<'h> {
    pub fn new(hierarchy: &'h ClassHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Best currently known type of `expr`, discarding diagnostics.
    pub fn get_type(&self, expr: &Spanned<Expr>, env: &TypeTable, ctx: &Ctx) -> QuackType {
        let mut discarded = Vec::new();
        self.check_expr(expr, env, ctx, &mut discarded)
    }

    /// Type `expr` and every sub-expression, left to right, recording each
    /// violation found on the way.
    pub fn check_expr(
        &self,
        expr: &Spanned<Expr>,
        env: &TypeTable,
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> QuackType {
        match &expr.node {
            Expr::IntConst { .. } => QuackType::class(INT),
            Expr::StrConst { .. } => QuackType::class(STRING),
            Expr::BoolConst { .. } => QuackType::class(BOOLEAN),
            Expr::Nothing => QuackType::class(NOTHING),
            Expr::This => {
                if ctx.class == PGM {
                    diags.push(Diagnostic::new(
                        ErrorKind::UnknownVariable,
                        "'this' is not available outside a class",
                        expr.span,
                        ctx,
                    ));
                    QuackType::Error
                } else {
                    QuackType::class(&ctx.class)
                }
            }
            Expr::Ident { name } => match env.get(name) {
                Some(ty) => ty.clone(),
                None => {
                    diags.push(Diagnostic::new(
                        ErrorKind::UnknownVariable,
                        format!("'{name}' is not a variable in scope"),
                        expr.span,
                        ctx,
                    ));
                    QuackType::Error
                }
            },
            Expr::Dot { object, field } => {
                let obj = self.check_expr(object, env, ctx, diags);
                self.field_of(&obj, field, ctx, diags)
            }
            Expr::Call { receiver, method, args } => {
                let recv = self.check_expr(receiver, env, ctx, diags);
                let actuals = self.check_args(args, env, ctx, diags);
                self.resolve_call(&recv, method, &actuals, ctx, diags)
            }
            Expr::Construct { class, args } => {
                let actuals = self.check_args(args, env, ctx, diags);
                self.resolve_construct(class, &actuals, ctx, diags)
            }
            Expr::And { lhs, rhs } | Expr::Or { lhs, rhs } => {
                let op = if matches!(expr.node, Expr::And { .. }) { "and" } else { "or" };
                for operand in [lhs, rhs] {
                    let ty = self.check_expr(operand, env, ctx, diags);
                    self.require_boolean(&ty, operand.span, &format!("operand of '{op}'"), ctx, diags);
                }
                QuackType::class(BOOLEAN)
            }
            Expr::Not { operand } => {
                let ty = self.check_expr(operand, env, ctx, diags);
                self.require_boolean(&ty, operand.span, "operand of 'not'", ctx, diags);
                QuackType::class(BOOLEAN)
            }
        }
    }

    fn check_args(
        &self,
        args: &[Spanned<Expr>],
        env: &TypeTable,
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> Vec<(QuackType, Span)> {
        args.iter().map(|a| (self.check_expr(a, env, ctx, diags), a.span)).collect()
    }

    /// True when `ty` may be used where `Boolean` is required. `TypeError`
    /// passes so one defect is reported once. `Bottom` is still pending and
    /// passes too, but is reported if it survives to the final pass.
    pub fn require_boolean(
        &self,
        ty: &QuackType,
        span: Span,
        what: &str,
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> bool {
        if ty.is(BOOLEAN) || ty.is_error() {
            return true;
        }
        if ty.is_bottom() {
            diags.push(Diagnostic::new(
                ErrorKind::ConditionNotBoolean,
                format!("{what} has no inferred type"),
                span,
                ctx,
            ));
            return true;
        }
        diags.push(Diagnostic::new(
            ErrorKind::ConditionNotBoolean,
            format!("{what} must be Boolean, found {ty}"),
            span,
            ctx,
        ));
        false
    }

    /// Type of `object.field` given the object's static type.
    pub fn field_of(
        &self,
        object: &QuackType,
        field: &Spanned<String>,
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> QuackType {
        let class = match object {
            QuackType::Bottom => return QuackType::Bottom,
            QuackType::Error => return QuackType::Error,
            QuackType::Class(class) => class,
        };
        match self.hierarchy.field_type(class, &field.node) {
            Some(ty) => ty.clone(),
            None => {
                diags.push(Diagnostic::new(
                    ErrorKind::FieldNotFound,
                    format!("class '{class}' has no field '{}'", field.node),
                    field.span,
                    ctx,
                ));
                QuackType::Error
            }
        }
    }

    /// Method dispatch on the receiver's static type. Unknown methods and
    /// arity mismatches type as `TypeError`; argument mismatches are
    /// reported but the declared return type still flows out.
    pub fn resolve_call(
        &self,
        receiver: &QuackType,
        method: &Spanned<String>,
        actuals: &[(QuackType, Span)],
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> QuackType {
        let class = match receiver {
            QuackType::Bottom => return QuackType::Bottom,
            QuackType::Error => return QuackType::Error,
            QuackType::Class(class) => class,
        };
        let Some(sig) = self.hierarchy.lookup_method(class, &method.node) else {
            diags.push(Diagnostic::new(
                ErrorKind::MethodNotFound,
                format!("class '{class}' has no method '{}'", method.node),
                method.span,
                ctx,
            ));
            return QuackType::Error;
        };
        let callee = format!("{}.{}", class, method.node);
        if !self.check_arguments(sig, &callee, actuals, method.span, ctx, diags) {
            return QuackType::Error;
        }
        sig.return_type.clone()
    }

    /// Constructor call: no inheritance search, same argument rules.
    pub fn resolve_construct(
        &self,
        class: &Spanned<String>,
        actuals: &[(QuackType, Span)],
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> QuackType {
        let desc = match self.hierarchy.get(&class.node) {
            Some(desc) if desc.name != PGM => desc,
            _ => {
                diags.push(Diagnostic::new(
                    ErrorKind::UnknownType,
                    format!("unknown class '{}'", class.node),
                    class.span,
                    ctx,
                ));
                return QuackType::Error;
            }
        };
        if !self.check_arguments(&desc.constructor, &class.node, actuals, class.span, ctx, diags) {
            return QuackType::Error;
        }
        QuackType::class(&desc.name)
    }

    /// Returns false on an arity mismatch. Subtype mismatches are reported
    /// per argument and do not stop the remaining checks.
    fn check_arguments(
        &self,
        sig: &MethodSignature,
        callee: &str,
        actuals: &[(QuackType, Span)],
        span: Span,
        ctx: &Ctx,
        diags: &mut Vec<Diagnostic>,
    ) -> bool {
        if actuals.len() != sig.arity() {
            diags.push(Diagnostic::new(
                ErrorKind::ArgumentCountMismatch,
                format!("'{callee}' expects {} argument(s), got {}", sig.arity(), actuals.len()),
                span,
                ctx,
            ));
            return false;
        }
        for (i, ((actual, arg_span), formal)) in actuals.iter().zip(&sig.formal_param_types).enumerate() {
            if !self.hierarchy.is_subtype(actual, formal) {
                diags.push(Diagnostic::new(
                    ErrorKind::ArgumentSubtypeViolation,
                    format!("argument {} of '{callee}' has type {actual}, expected {formal}", i + 1),
                    *arg_span,
                    ctx,
                ));
            }
        }
        true
    }
}
