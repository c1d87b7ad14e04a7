use std::fmt::Write;

use serde::Serialize;

use super::builtins::PGM;
use super::env::{ClassDescriptor, ClassHierarchy, MethodSignature};
use super::types::{QuackType, TypeTable};

fn signature_line(sig: &MethodSignature) -> String {
    let params: Vec<String> = sig
        .formal_names
        .iter()
        .zip(&sig.formal_param_types)
        .map(|(n, t)| format!("{n}: {t}"))
        .collect();
    format!("{}({}): {}", sig.name, params.join(", "), sig.return_type)
}

fn table_line(table: &TypeTable) -> String {
    let entries: Vec<String> = table.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    entries.join(", ")
}

fn write_class(out: &mut String, desc: &ClassDescriptor) {
    let parent = desc.parent.as_deref().unwrap_or("-");
    let _ = writeln!(out, "class {} extends {}", desc.name, parent);
    for (field, ty) in &desc.instance_vars {
        let _ = writeln!(out, "  field {field}: {ty}");
    }
    let _ = writeln!(out, "  constructor {}", signature_line(&desc.constructor));
    if !desc.constructor.locals.is_empty() {
        let _ = writeln!(out, "    locals {}", table_line(&desc.constructor.locals));
    }
    for name in &desc.method_order {
        let Some(sig) = desc.methods.get(name) else { continue };
        if sig.declared_in == desc.name {
            let _ = writeln!(out, "  method {}", signature_line(sig));
            if !sig.locals.is_empty() {
                let _ = writeln!(out, "    locals {}", table_line(&sig.locals));
            }
        } else {
            let _ = writeln!(out, "  method {} (from {})", signature_line(sig), sig.declared_in);
        }
    }
}

/// Human-readable listing of the program's classes, root-first, followed
/// by the top-level variables.
pub fn render_text(hierarchy: &ClassHierarchy) -> String {
    let mut out = String::new();
    for desc in hierarchy.user_classes() {
        write_class(&mut out, desc);
        out.push('\n');
    }
    if let Some(pgm) = hierarchy.get(PGM) {
        let _ = writeln!(out, "program");
        for (name, ty) in &pgm.instance_vars {
            let _ = writeln!(out, "  var {name}: {ty}");
        }
    }
    out
}

#[derive(Serialize)]
struct HierarchyDump<'a> {
    order: Vec<&'a str>,
    classes: Vec<&'a ClassDescriptor>,
    program: Option<&'a TypeTable>,
}

pub fn render_json(hierarchy: &ClassHierarchy) -> serde_json::Result<String> {
    let classes: Vec<&ClassDescriptor> = hierarchy.user_classes().collect();
    let dump = HierarchyDump {
        order: classes.iter().map(|d| d.name.as_str()).collect(),
        classes,
        program: hierarchy.get(PGM).map(|d| &d.instance_vars),
    };
    serde_json::to_string_pretty(&dump)
}

/// Every binding of the finalized hierarchy that is not a concrete class:
/// `TypeError` entries and anything inference never resolved.
pub fn unresolved_bindings(hierarchy: &ClassHierarchy) -> Vec<(String, QuackType)> {
    let mut found = Vec::new();
    let mut scan = |prefix: &str, table: &TypeTable| {
        for (name, ty) in table {
            if ty.class_name().is_none() {
                found.push((format!("{prefix}.{name}"), ty.clone()));
            }
        }
    };
    for desc in hierarchy.user_classes() {
        scan(&desc.name, &desc.instance_vars);
        scan(&desc.name, &desc.constructor.locals);
        for sig in desc.own_methods() {
            scan(&format!("{}.{}", desc.name, sig.name), &sig.locals);
        }
    }
    if let Some(pgm) = hierarchy.get(PGM) {
        scan(PGM, &pgm.instance_vars);
    }
    for desc in hierarchy.user_classes() {
        for sig in desc.own_methods() {
            if sig.return_type.class_name().is_none() {
                found.push((format!("{}.{}()", desc.name, sig.name), sig.return_type.clone()));
            }
        }
    }
    found
}
