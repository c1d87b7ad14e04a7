//! Assignment typing: first sighting, LCA widening, declared bounds and
//! field writes.

#[path = "../common.rs"]
mod common;
use common::*;

use quackc::config::{Config, InferenceConfig, TypeErrorPolicy};
use quackc::typeck::errors::ErrorKind;
use quackc::typeck::types::QuackType;

#[test]
fn literal_types() {
    let out = check_clean(r#"i = 42; s = "hi"; t = true; f = false; n = none;"#);
    assert_eq!(pgm_var(&out, "i"), ty("Int"));
    assert_eq!(pgm_var(&out, "s"), ty("String"));
    assert_eq!(pgm_var(&out, "t"), ty("Boolean"));
    assert_eq!(pgm_var(&out, "f"), ty("Boolean"));
    assert_eq!(pgm_var(&out, "n"), ty("Nothing"));
}

#[test]
fn reassignment_widens() {
    let out = check_clean(r#"x = 1; x = "one";"#);
    assert_eq!(pgm_var(&out, "x"), ty("Obj"));
}

#[test]
fn sibling_classes_widen_to_parent() {
    let out = check_clean(
        r#"
        class Shape() { }
        class Square() extends Shape { }
        class Circle() extends Shape { }
        s = Square();
        s = Circle();
        "#,
    );
    assert_eq!(pgm_var(&out, "s"), ty("Shape"));
}

#[test]
fn declared_type_bounds_variable() {
    let out = check_clean(r#"x: Obj = 1; x = "s";"#);
    assert_eq!(pgm_var(&out, "x"), ty("Obj"));
}

#[test]
fn declared_type_violation() {
    let src = r#"x: Int = "s";"#;
    let out = check(src);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::AssignmentSubtypeViolation);
    assert!(out.diagnostics[0].message.contains("declared Int"));
    assert_eq!(pgm_var(&out, "x"), QuackType::Error);
}

#[test]
fn declared_unknown_type() {
    expect_diagnostic("x: Widget = 1;", ErrorKind::UnknownType, "'Widget'");
}

#[test]
fn locals_inside_methods() {
    let out = check_clean(
        r#"
        class C() {
            def f(): Int {
                a = 1;
                b = a + 2;
                return b;
            }
        }
        "#,
    );
    assert_eq!(local(&out, "C", "f", "a"), ty("Int"));
    assert_eq!(local(&out, "C", "f", "b"), ty("Int"));
}

#[test]
fn parameter_types_seed_locals() {
    let out = check_clean("class C() { def f(x: String): String { y = x; return y; } }");
    assert_eq!(local(&out, "C", "f", "x"), ty("String"));
    assert_eq!(local(&out, "C", "f", "y"), ty("String"));
}

#[test]
fn field_widened_by_method() {
    let out = check_clean(
        r#"
        class Box() {
            this.v = 1;
            def put_text() { this.v = "text"; }
        }
        "#,
    );
    assert_eq!(field(&out, "Box", "v"), ty("Obj"));
}

#[test]
fn foreign_field_write_must_conform() {
    let src = r#"
        class Box() { this.v = 1; }
        b = Box();
        b.v = "text";
    "#;
    let out = check(src);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::AssignmentSubtypeViolation);
    assert_eq!(field(&out, "Box", "v"), ty("Int"));
}

#[test]
fn type_error_is_sticky_by_default() {
    let src = "x = 1.nope(); x = 2;";
    let out = check(src);
    assert_eq!(pgm_var(&out, "x"), QuackType::Error);
    assert!(out.ensure_emittable().is_err());
}

#[test]
fn heal_policy_lets_later_assignments_win() {
    let src = "x = 1.nope(); x = 2;";
    let config = Config {
        inference: InferenceConfig { type_error: TypeErrorPolicy::Heal, ..Default::default() },
    };
    let out = quackc::check_source_with(src, &config).unwrap();
    assert_eq!(pgm_var(&out, "x"), ty("Int"));
    // The diagnostic itself is still reported.
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::MethodNotFound);
}

#[test]
fn heal_policy_converges_on_declared_violation() {
    let config = Config {
        inference: InferenceConfig { type_error: TypeErrorPolicy::Heal, ..Default::default() },
    };
    let out = quackc::check_source_with(r#"x: Int = 1; x = "s";"#, &config).unwrap();
    assert_eq!(pgm_var(&out, "x"), QuackType::Error);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::AssignmentSubtypeViolation);
}

#[test]
fn cli_reports_assignment_violation() {
    check_should_fail_with(r#"x: Int = "s";"#, "AssignmentSubtypeViolation");
}
