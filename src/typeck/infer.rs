use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace};

use crate::config::InferenceConfig;
use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};
use super::builtins::{NOTHING, PGM};
use super::check::ExprTyper;
use super::env::{ClassHierarchy, Ctx, MethodSignature};
use super::errors::{Diagnostic, ErrorKind};
use super::types::{QuackType, TypeTable};

/// Fixed-point type inference over every constructor, method and the
/// top-level block.
///
/// Each pass walks the whole program and refines the tables owned by the
/// hierarchy in place. Any mutation of a persistent table calls
/// `mark_changed`; passes repeat until one makes no change. A final pass
/// then runs with reporting enabled to collect diagnostics against the
/// converged tables.
pub struct Engine<'a> {
    hierarchy: &'a mut ClassHierarchy,
    classes: Vec<&'a ClassDecl>,
    statements: &'a Block,
    config: &'a InferenceConfig,
    changed: bool,
    /// Nesting depth of branch-local environment copies. Writes made inside
    /// a copy only matter once merged back.
    scratch: usize,
    reporting: bool,
    diagnostics: Vec<Diagnostic>,
    /// Locations whose declared type was violated, with what violated it.
    /// They stay `TypeError` under either policy, so pins only grow.
    pinned: HashMap<String, String>,
}

impl<'a> Engine<'a> {
    pub fn new(program: &'a Program, hierarchy: &'a mut ClassHierarchy, config: &'a InferenceConfig) -> Self {
        let decls: HashMap<&str, &ClassDecl> = program
            .classes
            .iter()
            .map(|c| (c.node.name.node.as_str(), &c.node))
            .collect();
        let classes = hierarchy
            .user_classes()
            .filter_map(|d| decls.get(d.name.as_str()).copied())
            .collect();
        Self {
            hierarchy,
            classes,
            statements: &program.statements.node,
            config,
            changed: false,
            scratch: 0,
            reporting: false,
            diagnostics: Vec::new(),
            pinned: HashMap::new(),
        }
    }

    /// Run to convergence plus the validation pass. Returns the number of
    /// fixed-point passes.
    pub fn run(&mut self) -> Result<usize, CompileError> {
        let max = self.config.max_passes;
        let mut passes = 0;
        loop {
            loop {
                if passes == max {
                    return Err(CompileError::type_err(
                        format!("type inference did not converge after {max} passes"),
                        Span::dummy(),
                    ));
                }
                self.changed = false;
                self.pass();
                passes += 1;
                debug!(pass = passes, changed = self.changed, "inference pass");
                if !self.changed {
                    break;
                }
            }
            if !self.finalize_returns() {
                break;
            }
        }

        self.reporting = true;
        self.pass();
        self.reporting = false;
        self.sync_inherited_returns();

        info!(passes, diagnostics = self.diagnostics.len(), "inference converged");
        Ok(passes)
    }

    /// Whether the last pass changed any table.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// One traversal of the whole program.
    pub fn pass(&mut self) {
        let classes = self.classes.clone();
        for decl in classes {
            self.infer_constructor(decl);
            let mut seen = HashSet::new();
            for method in &decl.methods {
                if seen.insert(method.node.name.node.as_str()) {
                    self.infer_method(&decl.name.node, &method.node);
                }
            }
        }
        self.infer_top_level();
    }

    fn infer_constructor(&mut self, decl: &ClassDecl) {
        let class = decl.name.node.as_str();
        let ctx = Ctx::constructor(class);
        let Some(desc) = self.hierarchy.get_mut(class) else { return };
        let mut env = std::mem::take(&mut desc.constructor.locals);
        trace!(class, "constructor");
        self.infer_block(&decl.constructor.node.body.node, &mut env, &ctx);
        if let Some(desc) = self.hierarchy.get_mut(class) {
            desc.constructor.locals = env;
        }
    }

    fn infer_method(&mut self, class: &str, method: &MethodDecl) {
        let name = method.name.node.as_str();
        let ctx = Ctx::method(class, name);
        let Some(sig) = self.hierarchy.get_mut(class).and_then(|d| d.methods.get_mut(name)) else {
            return;
        };
        let mut env = std::mem::take(&mut sig.locals);
        trace!(class, method = name, "method");
        self.infer_block(&method.body.node, &mut env, &ctx);
        if let Some(sig) = self.hierarchy.get_mut(class).and_then(|d| d.methods.get_mut(name)) {
            sig.locals = env;
        }
    }

    fn infer_top_level(&mut self) {
        let ctx = Ctx::constructor(PGM);
        let Some(desc) = self.hierarchy.get_mut(PGM) else { return };
        let mut env = std::mem::take(&mut desc.instance_vars);
        let statements = self.statements;
        self.infer_block(statements, &mut env, &ctx);
        if let Some(desc) = self.hierarchy.get_mut(PGM) {
            desc.instance_vars = env;
        }
    }

    /// Methods that never produced a return type return `Nothing`.
    fn finalize_returns(&mut self) -> bool {
        let mut finalized = false;
        for desc in self.hierarchy.classes.values_mut() {
            for sig in desc.methods.values_mut() {
                if sig.declared_in == desc.name && !sig.return_declared && sig.return_type.is_bottom() {
                    debug!(class = %desc.name, method = %sig.name, "return type finalized to Nothing");
                    sig.return_type = QuackType::class(NOTHING);
                    finalized = true;
                }
            }
        }
        finalized
    }

    /// Refresh inherited signature copies from their declaring class.
    fn sync_inherited_returns(&mut self) {
        let mut updates = Vec::new();
        for desc in self.hierarchy.classes.values() {
            for sig in desc.methods.values() {
                if sig.declared_in != desc.name {
                    if let Some(live) = self.hierarchy.lookup_method(&sig.declared_in, &sig.name) {
                        updates.push((desc.name.clone(), sig.name.clone(), live.return_type.clone()));
                    }
                }
            }
        }
        for (class, method, ty) in updates {
            if let Some(sig) = self.hierarchy.get_mut(&class).and_then(|d| d.methods.get_mut(&method)) {
                sig.return_type = ty;
            }
        }
    }

    fn report(&mut self, kind: ErrorKind, message: impl Into<String>, span: Span, ctx: &Ctx) {
        if self.reporting {
            self.diagnostics.push(Diagnostic::new(kind, message, span, ctx));
        }
    }

    fn type_expr(&mut self, expr: &Spanned<Expr>, env: &TypeTable, ctx: &Ctx) -> QuackType {
        let typer = ExprTyper::new(&*self.hierarchy);
        if self.reporting {
            let mut found = Vec::new();
            let ty = typer.check_expr(expr, env, ctx, &mut found);
            self.diagnostics.extend(found);
            ty
        } else {
            typer.get_type(expr, env, ctx)
        }
    }

    fn require_boolean(&mut self, ty: &QuackType, span: Span, what: &str, ctx: &Ctx) -> bool {
        let mut found = Vec::new();
        let ok = ExprTyper::new(&*self.hierarchy).require_boolean(ty, span, what, ctx, &mut found);
        if self.reporting {
            self.diagnostics.extend(found);
        }
        ok
    }

    fn resolve_declared(&mut self, name: &Spanned<String>, ctx: &Ctx) -> QuackType {
        match self.hierarchy.resolve_type_name(&name.node) {
            Some(ty) => ty,
            None => {
                self.report(ErrorKind::UnknownType, format!("unknown type '{}'", name.node), name.span, ctx);
                QuackType::Error
            }
        }
    }

    fn lca(&self, a: &QuackType, b: &QuackType) -> QuackType {
        self.hierarchy.lca_with(a, b, self.config.type_error)
    }

    fn write_local(&mut self, env: &mut TypeTable, name: &str, ty: QuackType) {
        if env.get(name) != Some(&ty) {
            trace!(var = name, ty = %ty, "local refined");
            env.insert(name.to_string(), ty);
            if self.scratch == 0 {
                self.mark_changed();
            }
        }
    }

    fn write_field(&mut self, class: &str, field: &str, ty: QuackType) {
        if let Some(slot) = self.hierarchy.get_mut(class).and_then(|d| d.instance_vars.get_mut(field)) {
            if *slot != ty {
                trace!(class, field, ty = %ty, "field refined");
                *slot = ty;
                self.mark_changed();
            }
        }
    }

    fn infer_block(&mut self, block: &Block, env: &mut TypeTable, ctx: &Ctx) {
        for stmt in &block.stmts {
            self.infer_stmt(stmt, env, ctx);
        }
    }

    fn infer_stmt(&mut self, stmt: &Spanned<Stmt>, env: &mut TypeTable, ctx: &Ctx) {
        match &stmt.node {
            Stmt::Assign { target, value } => {
                let rhs = self.type_expr(value, env, ctx);
                self.assign(target, &rhs, None, env, ctx);
            }
            Stmt::AssignDeclare { target, static_type, value } => {
                let rhs = self.type_expr(value, env, ctx);
                let declared = self.resolve_declared(static_type, ctx);
                self.assign(target, &rhs, Some(&declared), env, ctx);
            }
            Stmt::Return { value } => self.infer_return(value.as_ref(), stmt.span, env, ctx),
            Stmt::If { cond, then_block, else_block } => {
                let cond_ty = self.type_expr(cond, env, ctx);
                if !self.require_boolean(&cond_ty, cond.span, "'if' condition", ctx) {
                    return;
                }
                let mut then_env = env.clone();
                let mut else_env = env.clone();
                self.scratch += 1;
                self.infer_block(&then_block.node, &mut then_env, ctx);
                self.infer_block(&else_block.node, &mut else_env, ctx);
                self.scratch -= 1;

                // Only names bound on both paths survive the join.
                for (name, then_ty) in &then_env {
                    let Some(else_ty) = else_env.get(name) else { continue };
                    let mut merged = self.lca(then_ty, else_ty);
                    if let Some(outer) = env.get(name) {
                        merged = self.lca(&merged, outer);
                    }
                    self.write_local(env, name, merged);
                }
            }
            Stmt::While { cond, body } => {
                let cond_ty = self.type_expr(cond, env, ctx);
                if !self.require_boolean(&cond_ty, cond.span, "'while' condition", ctx) {
                    return;
                }
                self.infer_block(&body.node, env, ctx);
            }
            Stmt::Typecase { scrutinee, alternatives } => {
                self.type_expr(scrutinee, env, ctx);
                for alt in alternatives {
                    let bound = self.resolve_declared(&alt.class_name, ctx);
                    let mut alt_env = env.clone();
                    alt_env.insert(alt.ident.node.clone(), bound);
                    self.scratch += 1;
                    self.infer_block(&alt.block.node, &mut alt_env, ctx);
                    self.scratch -= 1;
                }
            }
            Stmt::Expr { expr } => {
                self.type_expr(expr, env, ctx);
            }
        }
    }

    /// New type for an assigned location: the rhs on first sighting (or the
    /// declared type when there is one), otherwise the LCA with what is
    /// already known. A declared type bounds the result.
    #[allow(clippy::too_many_arguments)]
    fn join(
        &mut self,
        location: &str,
        current: Option<&QuackType>,
        rhs: &QuackType,
        declared: Option<&QuackType>,
        what: &str,
        span: Span,
        ctx: &Ctx,
    ) -> QuackType {
        if let Some(detail) = self.pinned.get(location).cloned() {
            if let Some(declared) = declared {
                self.report(
                    ErrorKind::AssignmentSubtypeViolation,
                    format!("{what} is declared {declared} but {detail}"),
                    span,
                    ctx,
                );
            }
            return QuackType::Error;
        }
        let merged = match current {
            None => declared.unwrap_or(rhs).clone(),
            Some(cur) => self.lca(cur, rhs),
        };
        if let Some(declared) = declared {
            let detail = if !self.hierarchy.is_subtype(rhs, declared) {
                Some(format!("is assigned {rhs}"))
            } else if !self.hierarchy.is_subtype(&merged, declared) {
                Some(format!("widens to {merged}"))
            } else {
                None
            };
            if let Some(detail) = detail {
                self.report(
                    ErrorKind::AssignmentSubtypeViolation,
                    format!("{what} is declared {declared} but {detail}"),
                    span,
                    ctx,
                );
                debug!(location, "declared type violated");
                self.pinned.insert(location.to_string(), detail);
                return QuackType::Error;
            }
        }
        merged
    }

    fn assign(
        &mut self,
        target: &Spanned<LExpr>,
        rhs: &QuackType,
        declared: Option<&QuackType>,
        env: &mut TypeTable,
        ctx: &Ctx,
    ) {
        match &target.node {
            LExpr::Ident { name } => {
                let location = format!("{}.{}.{name}", ctx.class, ctx.method.as_deref().unwrap_or("<init>"));
                let current = env.get(name).cloned();
                let ty = self.join(&location, current.as_ref(), rhs, declared, &format!("'{name}'"), target.span, ctx);
                self.write_local(env, name, ty);
            }
            LExpr::Field { object, field } if matches!(object.node, Expr::This) && ctx.class != PGM => {
                let current = self
                    .hierarchy
                    .get(&ctx.class)
                    .and_then(|d| d.instance_vars.get(&field.node))
                    .cloned();
                let Some(current) = current else {
                    self.report(
                        ErrorKind::FieldNotFound,
                        format!(
                            "class '{}' has no field '{}'; fields are introduced by direct assignments in the constructor",
                            ctx.class, field.node
                        ),
                        field.span,
                        ctx,
                    );
                    return;
                };
                let location = format!("{}.this.{}", ctx.class, field.node);
                let what = format!("field 'this.{}'", field.node);
                let ty = self.join(&location, Some(&current), rhs, declared, &what, target.span, ctx);
                self.write_field(&ctx.class, &field.node, ty);
            }
            LExpr::Field { object, field } => {
                // Another object's field: checked, never widened.
                let object_ty = self.type_expr(object, env, ctx);
                let mut found = Vec::new();
                let field_ty = ExprTyper::new(&*self.hierarchy).field_of(&object_ty, field, ctx, &mut found);
                if self.reporting {
                    self.diagnostics.extend(found);
                }
                let value = match declared {
                    Some(declared) => {
                        if !self.hierarchy.is_subtype(rhs, declared) {
                            self.report(
                                ErrorKind::AssignmentSubtypeViolation,
                                format!("value of type {rhs} does not conform to declared type {declared}"),
                                target.span,
                                ctx,
                            );
                        }
                        declared.clone()
                    }
                    None => rhs.clone(),
                };
                if !self.hierarchy.is_subtype(&value, &field_ty) {
                    self.report(
                        ErrorKind::AssignmentSubtypeViolation,
                        format!("field '{}' has type {field_ty} but is assigned {value}", field.node),
                        target.span,
                        ctx,
                    );
                }
            }
        }
    }

    fn signature(&self, ctx: &Ctx) -> Option<&MethodSignature> {
        if ctx.class == PGM {
            return None;
        }
        let desc = self.hierarchy.get(&ctx.class)?;
        match &ctx.method {
            Some(m) => desc.methods.get(m),
            None => Some(&desc.constructor),
        }
    }

    fn infer_return(&mut self, value: Option<&Spanned<Expr>>, span: Span, env: &TypeTable, ctx: &Ctx) {
        let ty = match value {
            Some(v) => self.type_expr(v, env, ctx),
            None => QuackType::class(NOTHING),
        };
        let Some(sig) = self.signature(ctx) else {
            self.report(ErrorKind::ReturnSubtypeViolation, "'return' outside of a method", span, ctx);
            return;
        };
        if sig.return_declared {
            if !self.hierarchy.is_subtype(&ty, &sig.return_type) {
                let msg = format!("returns {ty}, which is not a subtype of declared return type {}", sig.return_type);
                self.report(ErrorKind::ReturnSubtypeViolation, msg, span, ctx);
            }
            return;
        }
        let widened = self.lca(&sig.return_type, &ty);
        if widened == sig.return_type {
            return;
        }
        let Some(method) = &ctx.method else { return };
        if let Some(sig) = self.hierarchy.get_mut(&ctx.class).and_then(|d| d.methods.get_mut(method)) {
            trace!(class = %ctx.class, method = %method, ty = %widened, "return type refined");
            sig.return_type = widened;
            self.mark_changed();
        }
    }
}
