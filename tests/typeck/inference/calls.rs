//! Method calls and constructor calls: lookup, arity and argument subtyping.

#[path = "../common.rs"]
mod common;
use common::*;

use quackc::typeck::errors::ErrorKind;
use quackc::typeck::types::QuackType;

const ACCOUNT: &str = r#"
class Account(owner: String, balance: Int) {
    this.owner = owner;
    this.balance = balance;
    def deposit(amount: Int): Int {
        this.balance = this.balance + amount;
        return this.balance;
    }
    def transfer(to: Account, amount: Int): Boolean {
        to.deposit(amount);
        return true;
    }
}
class Savings(owner: String, balance: Int) extends Account {
    this.owner = owner;
    this.balance = balance;
}
"#;

#[test]
fn well_typed_calls() {
    let src = format!(
        r#"{ACCOUNT}
        a = Account("ann", 10);
        s = Savings("sam", 5);
        total = a.deposit(5);
        ok = a.transfer(s, 3);
        "#
    );
    let out = check_clean(&src);
    assert_eq!(pgm_var(&out, "a"), ty("Account"));
    assert_eq!(pgm_var(&out, "s"), ty("Savings"));
    assert_eq!(pgm_var(&out, "total"), ty("Int"));
    assert_eq!(pgm_var(&out, "ok"), ty("Boolean"));
}

#[test]
fn unknown_method() {
    let src = format!(r#"{ACCOUNT} a = Account("ann", 1); r = a.withdraw(1);"#);
    let out = check(&src);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::MethodNotFound);
    assert!(out.diagnostics[0].message.contains("class 'Account' has no method 'withdraw'"));
    assert_eq!(pgm_var(&out, "r"), QuackType::Error);
}

#[test]
fn wrong_argument_count() {
    let src = format!(r#"{ACCOUNT} a = Account("ann", 1); r = a.deposit(1, 2);"#);
    let out = check(&src);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::ArgumentCountMismatch);
    assert!(out.diagnostics[0].message.contains("expects 1 argument(s), got 2"));
    assert_eq!(pgm_var(&out, "r"), QuackType::Error);
}

#[test]
fn wrong_argument_type_still_yields_return_type() {
    let src = format!(r#"{ACCOUNT} a = Account("ann", 1); r = a.deposit("five");"#);
    let out = check(&src);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::ArgumentSubtypeViolation);
    assert!(out.diagnostics[0].message.contains("argument 1 of 'Account.deposit' has type String, expected Int"));
    assert_eq!(pgm_var(&out, "r"), ty("Int"));
}

#[test]
fn subclass_argument_accepted_unrelated_rejected() {
    let src = format!(
        r#"{ACCOUNT}
        class Trust(a: Account) {{ this.a = a; }}
        t = Trust(Savings("x", 1));
        s = Savings("y", 2);
        s.transfer(s, 1);
        bad = Trust(1);
        "#
    );
    let out = check(&src);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, ErrorKind::ArgumentSubtypeViolation);
    assert!(out.diagnostics[0].message.contains("'Trust'"));
}

#[test]
fn constructor_arity() {
    let src = format!(r#"{ACCOUNT} a = Account("ann");"#);
    expect_diagnostic(&src, ErrorKind::ArgumentCountMismatch, "'Account' expects 2 argument(s), got 1");
}

#[test]
fn builtin_constructors_take_no_arguments() {
    let out = check_clean("o = Obj(); i = Int(); s = String();");
    assert_eq!(pgm_var(&out, "o"), ty("Obj"));
    assert_eq!(pgm_var(&out, "i"), ty("Int"));
    assert_eq!(pgm_var(&out, "s"), ty("String"));
    assert_eq!(kinds("i = Int(4);"), vec![ErrorKind::ArgumentCountMismatch]);
}

#[test]
fn unknown_class_construction() {
    expect_diagnostic("w = Widget();", ErrorKind::UnknownType, "unknown class 'Widget'");
}

#[test]
fn call_on_error_receiver_is_not_reported_twice() {
    let src = "x = 1.nope(); y = x.PRINT();";
    assert_eq!(kinds(src), vec![ErrorKind::MethodNotFound]);
}

#[test]
fn forward_reference_to_later_class() {
    let out = check_clean(
        r#"
        class Maker() {
            def make() { return Later(); }
        }
        class Later() {
            def value() { return 1; }
        }
        v = Maker().make().value();
        "#,
    );
    assert_eq!(returns(&out, "Maker", "make"), ty("Later"));
    assert_eq!(pgm_var(&out, "v"), ty("Int"));
}

#[test]
fn diagnostic_carries_location() {
    let src = format!(
        r#"{ACCOUNT}
        class Bank() {{
            def open(): Account {{ return Account(1, 2); }}
        }}
        "#
    );
    let out = check(&src);
    assert_eq!(out.diagnostics.len(), 1);
    let diag = &out.diagnostics[0];
    assert_eq!(diag.class, "Bank");
    assert_eq!(diag.method.as_deref(), Some("open"));
    assert!(diag.to_string().starts_with("[ArgumentSubtypeViolation] Bank.open:"));
}
