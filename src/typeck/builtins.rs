use crate::span::Span;
use super::env::{ClassDescriptor, ClassHierarchy, MethodSignature};

pub const OBJ: &str = "Obj";
pub const INT: &str = "Int";
pub const STRING: &str = "String";
pub const BOOLEAN: &str = "Boolean";
pub const NOTHING: &str = "Nothing";
/// Pseudo-class whose instance variables are the top-level program variables.
pub const PGM: &str = "__pgm__";

pub const BUILTIN_CLASSES: [&str; 6] = [OBJ, INT, STRING, BOOLEAN, NOTHING, PGM];

fn builtin_class(name: &str, parent: Option<&str>, methods: &[(&str, &[&str], &str)]) -> ClassDescriptor {
    let mut desc = ClassDescriptor::new(name, parent, Span::dummy());
    desc.builtin = true;
    for (method, params, ret) in methods {
        desc.add_method(MethodSignature::builtin(name, method, params, ret));
    }
    desc
}

/// A registry holding only the built-in classes and the program pseudo-class.
pub fn seed() -> ClassHierarchy {
    let mut h = ClassHierarchy::new();

    let mut obj = builtin_class(
        OBJ,
        None,
        &[("STRING", &[], STRING), ("PRINT", &[], NOTHING), ("EQUALS", &[OBJ], BOOLEAN)],
    );
    obj.resolved = true;
    h.insert(obj);

    let int_methods: [(&str, &[&str], &str); 10] = [
        ("PLUS", &[INT], INT),
        ("MINUS", &[INT], INT),
        ("TIMES", &[INT], INT),
        ("DIVIDE", &[INT], INT),
        ("LESS", &[INT], BOOLEAN),
        ("ATMOST", &[INT], BOOLEAN),
        ("MORE", &[INT], BOOLEAN),
        ("ATLEAST", &[INT], BOOLEAN),
        ("EQUALS", &[OBJ], BOOLEAN),
        ("STRING", &[], STRING),
    ];
    h.insert(builtin_class(INT, Some(OBJ), &int_methods));

    h.insert(builtin_class(
        STRING,
        Some(OBJ),
        &[
            ("PLUS", &[STRING], STRING),
            ("LESS", &[STRING], BOOLEAN),
            ("ATMOST", &[STRING], BOOLEAN),
            ("MORE", &[STRING], BOOLEAN),
            ("ATLEAST", &[STRING], BOOLEAN),
            ("EQUALS", &[OBJ], BOOLEAN),
            ("STRING", &[], STRING),
        ],
    ));
    h.insert(builtin_class(BOOLEAN, Some(OBJ), &[("STRING", &[], STRING)]));
    h.insert(builtin_class(NOTHING, Some(OBJ), &[("STRING", &[], STRING)]));
    h.insert(builtin_class(PGM, Some(OBJ), &[]));

    h
}
