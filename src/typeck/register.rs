use std::collections::HashSet;

use crate::config::InferenceConfig;
use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};
use super::env::{ClassDescriptor, ClassHierarchy, MethodSignature};
use super::errors::{Diagnostic, ErrorKind};
use super::types::{QuackType, TypeTable};

/// Resolve a written type name, reporting `UnknownType` and yielding
/// `TypeError` for names that are not classes.
pub(crate) fn resolve_type(
    name: &Spanned<String>,
    hierarchy: &ClassHierarchy,
    class: &str,
    diags: &mut Vec<Diagnostic>,
) -> QuackType {
    match hierarchy.resolve_type_name(&name.node) {
        Some(ty) => ty,
        None => {
            diags.push(Diagnostic::in_class(
                ErrorKind::UnknownType,
                format!("unknown type '{}'", name.node),
                name.span,
                class,
            ));
            QuackType::Error
        }
    }
}

/// Pass 1: create an empty descriptor for every declared class so later
/// passes may refer to classes in any order.
pub(crate) fn register_class_names(
    program: &Program,
    hierarchy: &mut ClassHierarchy,
) -> Result<(), CompileError> {
    for class in &program.classes {
        let c = &class.node;
        if hierarchy.contains(&c.name.node) {
            return Err(CompileError::hierarchy(
                ErrorKind::DuplicateClass,
                format!("class '{}' is already defined", c.name.node),
                c.name.span,
            ));
        }
        let mut desc = ClassDescriptor::new(&c.name.node, Some(&c.superclass.node), class.span);
        desc.parent_span = if c.superclass.span == Span::dummy() {
            c.name.span
        } else {
            c.superclass.span
        };
        hierarchy.insert(desc);
    }
    Ok(())
}

fn signature(
    method: &MethodDecl,
    class: &str,
    hierarchy: &ClassHierarchy,
    span: Span,
    diags: &mut Vec<Diagnostic>,
) -> MethodSignature {
    let mut locals = TypeTable::new();
    let mut formal_param_types = Vec::with_capacity(method.params.len());
    for p in &method.params {
        let ty = resolve_type(&p.ty, hierarchy, class, diags);
        locals.insert(p.name.node.clone(), ty.clone());
        formal_param_types.push(ty);
    }
    let (return_type, return_declared) = match &method.return_type {
        Some(rt) => (resolve_type(rt, hierarchy, class, diags), true),
        None => (QuackType::Bottom, false),
    };
    MethodSignature {
        name: method.name.node.clone(),
        return_type,
        return_declared,
        formal_names: method.params.iter().map(|p| p.name.node.clone()).collect(),
        formal_param_types,
        locals,
        declared_in: class.to_string(),
        span,
    }
}

/// Pass 2: constructor signature, seeded instance variables and declared
/// method signatures for every class.
pub(crate) fn register_class_members(
    program: &Program,
    hierarchy: &mut ClassHierarchy,
    config: &InferenceConfig,
    diags: &mut Vec<Diagnostic>,
) {
    for class in &program.classes {
        let c = &class.node;
        let name = c.name.node.as_str();

        let constructor = signature(&c.constructor.node, name, hierarchy, c.constructor.span, diags);
        let mut instance_vars = TypeTable::new();
        c.constructor.node.body.node.collect_vars(&mut instance_vars, config.seed_nested_fields);

        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        for m in &c.methods {
            if !seen.insert(m.node.name.node.as_str()) {
                diags.push(Diagnostic::in_class(
                    ErrorKind::DuplicateMethod,
                    format!("method '{}' is defined more than once in class '{name}'", m.node.name.node),
                    m.node.name.span,
                    name,
                ));
                continue;
            }
            methods.push(signature(&m.node, name, hierarchy, m.span, diags));
        }

        if let Some(desc) = hierarchy.get_mut(name) {
            desc.constructor = constructor;
            desc.instance_vars = instance_vars;
            for sig in methods {
                desc.add_method(sig);
            }
        }
    }
}
