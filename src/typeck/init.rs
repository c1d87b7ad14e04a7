//! Definite initialization: every variable must be assigned on all paths
//! before it is read.
//!
//! A single forward pass over each body with a set of initialized names.
//! Branches are walked on copies and met by intersection; loop and typecase
//! bodies may not run, so they leave the incoming set untouched. The first
//! violation aborts the check.

use std::collections::BTreeSet;

use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::Spanned;
use super::builtins::BUILTIN_CLASSES;

const THIS: &str = "this";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct InitState {
    names: BTreeSet<String>,
}

impl InitState {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Keep only what both paths initialized.
    fn meet(&self, other: &InitState) -> InitState {
        InitState { names: self.names.intersection(&other.names).cloned().collect() }
    }
}

struct InitChecker {
    /// Inside a constructor `this.f` must be assigned before it is read.
    /// Methods see a fully constructed object.
    track_fields: bool,
}

pub fn check_initialization(program: &Program) -> Result<(), CompileError> {
    let mut globals = InitState::default();
    for name in BUILTIN_CLASSES {
        globals.insert(name);
    }
    for class in &program.classes {
        globals.insert(class.node.name.node.clone());
        for method in &class.node.methods {
            globals.insert(method.node.name.node.clone());
        }
    }

    for class in &program.classes {
        let c = &class.node;
        let ctor = InitChecker { track_fields: true };
        let mut state = with_params(&globals, &c.constructor.node);
        ctor.check_block(&c.constructor.node.body.node, &mut state)?;

        let method_checker = InitChecker { track_fields: false };
        for method in &c.methods {
            let mut state = with_params(&globals, &method.node);
            method_checker.check_block(&method.node.body.node, &mut state)?;
        }
    }

    let top = InitChecker { track_fields: false };
    let mut state = globals;
    top.check_block(&program.statements.node, &mut state)
}

fn with_params(globals: &InitState, method: &MethodDecl) -> InitState {
    let mut state = globals.clone();
    state.insert(THIS);
    for p in &method.params {
        state.insert(p.name.node.clone());
    }
    state
}

impl InitChecker {
    fn check_block(&self, block: &Block, state: &mut InitState) -> Result<(), CompileError> {
        for stmt in &block.stmts {
            self.check_stmt(stmt, state)?;
        }
        Ok(())
    }

    fn check_stmt(&self, stmt: &Spanned<Stmt>, state: &mut InitState) -> Result<(), CompileError> {
        match &stmt.node {
            Stmt::Assign { target, value } | Stmt::AssignDeclare { target, value, .. } => {
                self.check_expr(value, state)?;
                self.assign(target, state)
            }
            Stmt::Return { value } => match value {
                Some(v) => self.check_expr(v, state),
                None => Ok(()),
            },
            Stmt::If { cond, then_block, else_block } => {
                self.check_expr(cond, state)?;
                let mut then_state = state.clone();
                self.check_block(&then_block.node, &mut then_state)?;
                let mut else_state = state.clone();
                self.check_block(&else_block.node, &mut else_state)?;
                *state = then_state.meet(&else_state);
                Ok(())
            }
            Stmt::While { cond, body } => {
                self.check_expr(cond, state)?;
                let mut body_state = state.clone();
                self.check_block(&body.node, &mut body_state)
            }
            Stmt::Typecase { scrutinee, alternatives } => {
                self.check_expr(scrutinee, state)?;
                for alt in alternatives {
                    let mut alt_state = state.clone();
                    alt_state.insert(alt.ident.node.clone());
                    self.check_block(&alt.block.node, &mut alt_state)?;
                }
                Ok(())
            }
            Stmt::Expr { expr } => self.check_expr(expr, state),
        }
    }

    fn assign(&self, target: &Spanned<LExpr>, state: &mut InitState) -> Result<(), CompileError> {
        match &target.node {
            LExpr::Ident { name } => state.insert(name.clone()),
            LExpr::Field { object, .. } => {
                if let Some(field) = target.node.this_field() {
                    self.require(THIS, object, state)?;
                    state.insert(format!("{THIS}.{field}"));
                } else {
                    self.check_expr(object, state)?;
                }
            }
        }
        Ok(())
    }

    fn require(&self, name: &str, at: &Spanned<Expr>, state: &InitState) -> Result<(), CompileError> {
        if state.contains(name) {
            return Ok(());
        }
        let msg = if name == THIS {
            "'this' is not available outside a class".to_string()
        } else {
            format!("'{name}' may be used before it is initialized")
        };
        Err(CompileError::init(msg, at.span))
    }

    fn check_expr(&self, expr: &Spanned<Expr>, state: &InitState) -> Result<(), CompileError> {
        match &expr.node {
            Expr::IntConst { .. } | Expr::StrConst { .. } | Expr::BoolConst { .. } | Expr::Nothing => Ok(()),
            Expr::This => self.require(THIS, expr, state),
            Expr::Ident { name } => self.require(name, expr, state),
            Expr::Dot { object, field } => {
                self.check_expr(object, state)?;
                if self.track_fields && matches!(object.node, Expr::This) {
                    self.require(&format!("{THIS}.{}", field.node), expr, state)?;
                }
                Ok(())
            }
            Expr::Call { receiver, args, .. } => {
                self.check_expr(receiver, state)?;
                args.iter().try_for_each(|a| self.check_expr(a, state))
            }
            Expr::Construct { args, .. } => args.iter().try_for_each(|a| self.check_expr(a, state)),
            Expr::And { lhs, rhs } | Expr::Or { lhs, rhs } => {
                self.check_expr(lhs, state)?;
                self.check_expr(rhs, state)
            }
            Expr::Not { operand } => self.check_expr(operand, state),
        }
    }
}
