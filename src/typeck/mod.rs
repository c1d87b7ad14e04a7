pub mod builtins;
pub mod check;
pub mod dump;
pub mod env;
pub mod errors;
pub mod hierarchy;
pub mod infer;
pub mod init;
pub mod register;
pub mod types;

use tracing::info;

use crate::config::InferenceConfig;
use crate::diagnostics::CompileError;
use crate::parser::ast::Program;
use crate::span::Span;
use env::ClassHierarchy;
use errors::Diagnostic;
use infer::Engine;

/// Result of a successful run: the finalized hierarchy plus every
/// recoverable diagnostic, in discovery order.
#[derive(Debug)]
pub struct TypeCheckOutput {
    pub hierarchy: ClassHierarchy,
    pub diagnostics: Vec<Diagnostic>,
    /// Fixed-point passes until convergence, excluding the validation pass.
    pub passes: usize,
}

impl TypeCheckOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Fails when any binding of the hierarchy is not a concrete class, so
    /// code generation never sees a `TypeError`.
    pub fn ensure_emittable(&self) -> Result<(), CompileError> {
        let bad = dump::unresolved_bindings(&self.hierarchy);
        if bad.is_empty() {
            return Ok(());
        }
        let list: Vec<String> = bad.iter().map(|(name, ty)| format!("{name}: {ty}")).collect();
        Err(CompileError::type_err(
            format!("cannot emit code, unresolved bindings: {}", list.join(", ")),
            Span::dummy(),
        ))
    }
}

/// Hierarchy build, definite-initialization check, then fixed-point
/// inference. Structural and initialization errors abort; everything else
/// is collected.
pub fn type_check(program: &Program, config: &InferenceConfig) -> Result<TypeCheckOutput, CompileError> {
    let mut diagnostics = Vec::new();
    let mut hierarchy = hierarchy::build_hierarchy(program, config, &mut diagnostics)?;

    init::check_initialization(program)?;

    let (passes, inferred) = {
        let mut engine = Engine::new(program, &mut hierarchy, config);
        let passes = engine.run()?;
        (passes, engine.into_diagnostics())
    };
    diagnostics.extend(inferred);
    hierarchy::check_inferred_override_returns(&hierarchy, &mut diagnostics);

    info!(passes, diagnostics = diagnostics.len(), "type check finished");
    Ok(TypeCheckOutput { hierarchy, diagnostics, passes })
}
