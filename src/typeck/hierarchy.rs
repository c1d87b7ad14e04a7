use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::config::InferenceConfig;
use crate::diagnostics::CompileError;
use crate::parser::ast::Program;
use crate::span::Span;
use super::builtins;
use super::env::{ClassHierarchy, MethodSignature};
use super::errors::{Diagnostic, ErrorKind};
use super::register::{register_class_members, register_class_names};

/// Build the inheritance-consistent registry for `program`. Structural
/// failures are returned as errors; everything else lands in `diags`.
pub fn build_hierarchy(
    program: &Program,
    config: &InferenceConfig,
    diags: &mut Vec<Diagnostic>,
) -> Result<ClassHierarchy, CompileError> {
    let mut hierarchy = builtins::seed();

    register_class_names(program, &mut hierarchy)?;
    register_class_members(program, &mut hierarchy, config, diags);

    check_superclasses(&hierarchy)?;
    detect_cycles(&hierarchy)?;
    hierarchy.order = topological_order(&hierarchy)?;
    propagate_methods(&mut hierarchy);

    check_inherited_fields(&hierarchy, diags);
    check_overrides(&hierarchy, diags);

    debug!(classes = hierarchy.classes.len(), order = ?hierarchy.order, "hierarchy built");
    Ok(hierarchy)
}

fn check_superclasses(hierarchy: &ClassHierarchy) -> Result<(), CompileError> {
    for desc in hierarchy.classes.values() {
        if let Some(parent) = &desc.parent {
            if !hierarchy.contains(parent) || parent == builtins::PGM {
                return Err(CompileError::hierarchy(
                    ErrorKind::UndefinedSuperclass,
                    format!("class '{}' extends undefined class '{}'", desc.name, parent),
                    desc.parent_span,
                ));
            }
        }
    }
    Ok(())
}

fn subclass_graph(hierarchy: &ClassHierarchy) -> BTreeMap<&str, Vec<&str>> {
    let mut graph: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for desc in hierarchy.classes.values() {
        graph.entry(desc.name.as_str()).or_default();
        if let Some(parent) = &desc.parent {
            graph.entry(parent.as_str()).or_default().push(desc.name.as_str());
        }
    }
    graph
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search over the class -> subclasses graph with a recursion
/// stack. Revisiting a class still on the stack means its parent chain loops.
fn detect_cycles(hierarchy: &ClassHierarchy) -> Result<(), CompileError> {
    let graph = subclass_graph(hierarchy);
    let mut marks: BTreeMap<&str, Mark> = graph.keys().map(|k| (*k, Mark::Unvisited)).collect();

    for &start in graph.keys() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // Explicit stack of (node, next child index).
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::OnStack);
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            top.1 += 1;
            let children = &graph[node];
            if next < children.len() {
                let child = children[next];
                match marks[child] {
                    Mark::OnStack => {
                        let span = hierarchy.get(child).map(|d| d.parent_span).unwrap_or(Span::dummy());
                        let mut cycle: Vec<&str> = stack
                            .iter()
                            .map(|(n, _)| *n)
                            .skip_while(|n| *n != child)
                            .collect();
                        cycle.push(child);
                        return Err(CompileError::hierarchy(
                            ErrorKind::CyclicHierarchy,
                            format!("cyclic inheritance: {}", cycle.join(" -> ")),
                            span,
                        ));
                    }
                    Mark::Unvisited => {
                        marks.insert(child, Mark::OnStack);
                        stack.push((child, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
            }
        }
    }
    Ok(())
}

/// Kahn's algorithm over parent -> child edges: every class follows its
/// ancestors.
fn topological_order(hierarchy: &ClassHierarchy) -> Result<Vec<String>, CompileError> {
    let graph = subclass_graph(hierarchy);
    let mut in_degree: BTreeMap<&str, usize> = graph.keys().map(|k| (*k, 0)).collect();
    for children in graph.values() {
        for &child in children {
            *in_degree.entry(child).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());
        for &child in &graph[node] {
            if let Some(deg) = in_degree.get_mut(child) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    if order.len() != graph.len() {
        let remaining: Vec<&str> = graph.keys().copied().filter(|c| !order.iter().any(|o| o.as_str() == *c)).collect();
        return Err(CompileError::hierarchy(
            ErrorKind::CyclicHierarchy,
            format!("cyclic inheritance among: {}", remaining.join(", ")),
            Span::dummy(),
        ));
    }
    Ok(order)
}

/// Copy every ancestor method a class does not override into its table.
/// Local methods come first in `method_order`, then unseen inherited names
/// in the parent's order.
fn propagate_methods(hierarchy: &mut ClassHierarchy) {
    let order = hierarchy.order.clone();
    for name in &order {
        let Some(parent) = hierarchy.get(name).and_then(|d| d.parent.clone()) else {
            if let Some(desc) = hierarchy.get_mut(name) {
                desc.resolved = true;
            }
            continue;
        };
        let inherited: Vec<_> = match hierarchy.get(&parent) {
            Some(p) => p
                .method_order
                .iter()
                .filter_map(|m| p.methods.get(m).cloned())
                .collect(),
            None => continue,
        };
        let Some(desc) = hierarchy.get_mut(name) else { continue };
        for sig in inherited {
            if !desc.methods.contains_key(&sig.name) {
                desc.method_order.push(sig.name.clone());
                desc.methods.insert(sig.name.clone(), sig);
            }
        }
        desc.resolved = true;
    }
}

/// Subclasses must carry every field their parent declares.
fn check_inherited_fields(hierarchy: &ClassHierarchy, diags: &mut Vec<Diagnostic>) {
    for desc in hierarchy.user_classes() {
        let Some(parent) = desc.parent.as_deref().and_then(|p| hierarchy.get(p)) else {
            continue;
        };
        for field in parent.instance_vars.keys() {
            if !desc.instance_vars.contains_key(field) {
                diags.push(Diagnostic::in_class(
                    ErrorKind::MissingInheritedField,
                    format!(
                        "class '{}' does not initialize field '{}' inherited from '{}'",
                        desc.name, field, parent.name
                    ),
                    desc.span,
                    &desc.name,
                ));
            }
        }
    }
}

/// Overrides keep the arity, accept at least the inherited parameter types
/// and return no more than the inherited return type.
fn check_overrides(hierarchy: &ClassHierarchy, diags: &mut Vec<Diagnostic>) {
    for desc in hierarchy.user_classes() {
        let Some(parent) = desc.parent.as_deref() else { continue };
        for sig in desc.own_methods() {
            let Some(inherited) = hierarchy.lookup_method(parent, &sig.name) else { continue };
            let mut report = |msg: String| {
                diags.push(Diagnostic::in_class(ErrorKind::InvalidOverride, msg, sig.span, &desc.name));
            };
            if sig.arity() != inherited.arity() {
                report(format!(
                    "'{}.{}' takes {} argument(s) but overrides '{}.{}' which takes {}",
                    desc.name, sig.name, sig.arity(), inherited.declared_in, sig.name, inherited.arity()
                ));
                continue;
            }
            for (i, (own, base)) in sig.formal_param_types.iter().zip(&inherited.formal_param_types).enumerate() {
                if !hierarchy.is_subtype(base, own) {
                    report(format!(
                        "parameter {} of '{}.{}' has type {} which does not accept inherited type {}",
                        i + 1, desc.name, sig.name, own, base
                    ));
                }
            }
            if sig.return_declared && inherited.return_declared {
                if let Some(diag) = override_return_conflict(hierarchy, &desc.name, sig, inherited) {
                    diags.push(diag);
                }
            }
        }
    }
}

/// Return conformance for overrides where either side infers its return
/// type. Only meaningful once inference has converged.
pub fn check_inferred_override_returns(hierarchy: &ClassHierarchy, diags: &mut Vec<Diagnostic>) {
    for desc in hierarchy.user_classes() {
        let Some(parent) = desc.parent.as_deref() else { continue };
        for sig in desc.own_methods() {
            let Some(inherited) = hierarchy.lookup_method(parent, &sig.name) else { continue };
            if sig.arity() != inherited.arity() || (sig.return_declared && inherited.return_declared) {
                continue;
            }
            if let Some(diag) = override_return_conflict(hierarchy, &desc.name, sig, inherited) {
                diags.push(diag);
            }
        }
    }
}

fn override_return_conflict(
    hierarchy: &ClassHierarchy,
    class: &str,
    sig: &MethodSignature,
    inherited: &MethodSignature,
) -> Option<Diagnostic> {
    if hierarchy.is_subtype(&sig.return_type, &inherited.return_type) {
        return None;
    }
    Some(Diagnostic::in_class(
        ErrorKind::InvalidOverride,
        format!(
            "'{}.{}' returns {} which is not a subtype of inherited return type {}",
            class, sig.name, sig.return_type, inherited.return_type
        ),
        sig.span,
        class,
    ))
}
