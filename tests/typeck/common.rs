//! Common test utilities for typeck tests.
//! Library-level helpers plus the binary helpers from tests/integration/common.
#![allow(dead_code)]

#[path = "../integration/common/mod.rs"]
mod integration_common;

pub use integration_common::{check_should_fail_with, check_should_pass};

use quackc::diagnostics::CompileError;
use quackc::typeck::builtins::PGM;
use quackc::typeck::errors::ErrorKind;
use quackc::typeck::types::QuackType;
use quackc::TypeCheckOutput;

/// Run the whole pipeline; panics on a fatal error.
pub fn check(source: &str) -> TypeCheckOutput {
    match quackc::check_source(source) {
        Ok(output) => output,
        Err(err) => panic!("unexpected fatal error: {err}"),
    }
}

/// Program must check with no diagnostics at all.
pub fn check_clean(source: &str) -> TypeCheckOutput {
    let output = check(source);
    assert!(
        output.diagnostics.is_empty(),
        "expected no diagnostics, got: {:#?}",
        output.diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>()
    );
    output
}

/// Kinds of every recoverable diagnostic, in discovery order.
pub fn kinds(source: &str) -> Vec<ErrorKind> {
    check(source).diagnostics.iter().map(|d| d.kind).collect()
}

/// First diagnostic must be `kind` and mention `msg`.
pub fn expect_diagnostic(source: &str, kind: ErrorKind, msg: &str) {
    let output = check(source);
    let Some(found) = output.diagnostics.iter().find(|d| d.kind == kind) else {
        panic!("no {kind} diagnostic, got: {:?}", output.diagnostics);
    };
    assert!(found.message.contains(msg), "'{}' does not mention '{msg}'", found.message);
}

/// Pipeline must abort; returns the fatal error.
pub fn fatal(source: &str) -> CompileError {
    match quackc::check_source(source) {
        Ok(output) => panic!("expected a fatal error, got {:?}", output.diagnostics),
        Err(err) => err,
    }
}

pub fn ty(name: &str) -> QuackType {
    QuackType::class(name)
}

pub fn pgm_var(output: &TypeCheckOutput, name: &str) -> QuackType {
    output.hierarchy.get(PGM).unwrap().instance_vars[name].clone()
}

pub fn field(output: &TypeCheckOutput, class: &str, name: &str) -> QuackType {
    output.hierarchy.get(class).unwrap().instance_vars[name].clone()
}

pub fn returns(output: &TypeCheckOutput, class: &str, method: &str) -> QuackType {
    output.hierarchy.get(class).unwrap().methods[method].return_type.clone()
}

pub fn local(output: &TypeCheckOutput, class: &str, method: &str, name: &str) -> QuackType {
    output.hierarchy.get(class).unwrap().methods[method].locals[name].clone()
}
