//! Declared and inferred return types.

#[path = "../common.rs"]
mod common;
use common::*;

use quackc::typeck::errors::ErrorKind;

#[test]
fn declared_return_accepts_subtype() {
    let out = check_clean(r#"class C() { def f(): Obj { return "s"; } } x = C().f();"#);
    assert_eq!(pgm_var(&out, "x"), ty("Obj"));
}

#[test]
fn declared_return_violation() {
    let src = r#"class C() { def f(): Int { return "s"; } }"#;
    let out = check(src);
    assert_eq!(out.diagnostics.len(), 1);
    let diag = &out.diagnostics[0];
    assert_eq!(diag.kind, ErrorKind::ReturnSubtypeViolation);
    assert!(diag.message.contains("returns String, which is not a subtype of declared return type Int"));
    assert_eq!(diag.method.as_deref(), Some("f"));
}

#[test]
fn bare_return_is_nothing() {
    expect_diagnostic(
        "class C() { def f(): Int { return; } }",
        ErrorKind::ReturnSubtypeViolation,
        "returns Nothing",
    );
    let out = check_clean("class C() { def f(): Nothing { return; } }");
    assert_eq!(returns(&out, "C", "f"), ty("Nothing"));
}

#[test]
fn inferred_return_joins_all_returns() {
    let out = check_clean(
        r#"
        class C() {
            def pick(b: Boolean) {
                if b { return 1; }
                return "one";
            }
        }
        "#,
    );
    assert_eq!(returns(&out, "C", "pick"), ty("Obj"));
}

#[test]
fn method_without_return_yields_nothing() {
    let out = check_clean("class C() { def noop() { } } n = C().noop();");
    assert_eq!(returns(&out, "C", "noop"), ty("Nothing"));
    assert_eq!(pgm_var(&out, "n"), ty("Nothing"));
}

#[test]
fn self_recursive_method_without_base_case() {
    let out = check_clean("class C() { def spin() { return this.spin(); } }");
    assert_eq!(returns(&out, "C", "spin"), ty("Nothing"));
}

#[test]
fn mutual_recursion_settles() {
    let out = check_clean(
        r#"
        class Parity() {
            def even(n: Int) {
                if n < 1 { return true; }
                return this.odd(n - 1);
            }
            def odd(n: Int) {
                if n < 1 { return false; }
                return this.even(n - 1);
            }
        }
        e = Parity().even(4);
        "#,
    );
    assert_eq!(returns(&out, "Parity", "even"), ty("Boolean"));
    assert_eq!(returns(&out, "Parity", "odd"), ty("Boolean"));
    assert_eq!(pgm_var(&out, "e"), ty("Boolean"));
}

#[test]
fn return_at_top_level() {
    expect_diagnostic("return 1;", ErrorKind::ReturnSubtypeViolation, "outside of a method");
}

#[test]
fn constructor_return_must_be_the_class() {
    let out = check("class C() { return 1; }");
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::ReturnSubtypeViolation);
    assert_eq!(out.diagnostics[0].method, None);
}

#[test]
fn unknown_return_type() {
    expect_diagnostic("class C() { def f(): Ghost { return 1; } }", ErrorKind::UnknownType, "'Ghost'");
}
