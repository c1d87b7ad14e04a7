//! Structural hierarchy errors: cycles and undefined superclasses abort
//! before any inference runs.

#[path = "../common.rs"]
mod common;
use common::*;

use quackc::typeck::errors::ErrorKind;

#[test]
fn two_class_cycle() {
    let err = fatal("class A() extends B { } class B() extends A { }");
    assert_eq!(err.kind(), Some(ErrorKind::CyclicHierarchy));
    assert!(err.to_string().contains("A -> B -> A"), "{err}");
}

#[test]
fn self_inheritance() {
    let err = fatal("class Loop() extends Loop { }");
    assert_eq!(err.kind(), Some(ErrorKind::CyclicHierarchy));
}

#[test]
fn three_class_cycle_detached_from_root() {
    let err = fatal(
        r#"
        class A() extends C { }
        class B() extends A { }
        class C() extends B { }
        class Fine() { }
        "#,
    );
    assert_eq!(err.kind(), Some(ErrorKind::CyclicHierarchy));
}

#[test]
fn cycle_wins_over_type_errors() {
    // The call would be a MethodNotFound if inference ever ran.
    let err = fatal("class A() extends B { } class B() extends A { } x = 1.nope();");
    assert_eq!(err.kind(), Some(ErrorKind::CyclicHierarchy));
}

#[test]
fn undefined_superclass() {
    let err = fatal("class Dog() extends Animal { }");
    assert_eq!(err.kind(), Some(ErrorKind::UndefinedSuperclass));
    assert!(err.to_string().contains("'Animal'"), "{err}");
}

#[test]
fn program_pseudo_class_is_not_a_superclass() {
    let err = fatal("class Sneaky() extends __pgm__ { }");
    assert_eq!(err.kind(), Some(ErrorKind::UndefinedSuperclass));
}

#[test]
fn duplicate_class_is_fatal() {
    let err = fatal("class A() { } class A() { }");
    assert_eq!(err.kind(), Some(ErrorKind::DuplicateClass));
}

#[test]
fn builtin_cannot_be_redefined() {
    let err = fatal("class Int() { }");
    assert_eq!(err.kind(), Some(ErrorKind::DuplicateClass));
}

#[test]
fn declaration_order_does_not_matter() {
    let out = check_clean(
        r#"
        class C() extends B { }
        class B() extends A { }
        class A() { }
        c = C();
        "#,
    );
    let pos = |n: &str| out.hierarchy.order.iter().position(|o| o == n).unwrap();
    assert!(pos("Obj") < pos("A"));
    assert!(pos("A") < pos("B"));
    assert!(pos("B") < pos("C"));
}

#[test]
fn cli_reports_cycle() {
    check_should_fail_with("class A() extends B { } class B() extends A { }", "CyclicHierarchy");
}
