mod common;
use common::*;

const PAIR: &str = r#"
class Pair(a: Int, b: Int) {
    this.a = a;
    this.b = b;
    def sum(): Int { return this.a + this.b; }
}
p = Pair(1, 2);
s = p.sum();
"#;

#[test]
fn check_ok_exits_zero() {
    let output = check_should_pass(PAIR);
    assert!(stderr(&output).contains(": ok ("));
    assert!(stdout(&output).is_empty());
}

#[test]
fn check_reports_every_diagnostic() {
    let output = check_should_fail("x = 1.nope(); y = \"s\".nope();");
    let err = stderr(&output);
    assert_eq!(err.matches("MethodNotFound").count(), 2, "{err}");
    assert!(err.contains("2 error(s)"));
}

#[test]
fn check_fails_on_unresolved_binding_without_diagnostic() {
    // The field only ever copies itself, so it never leaves Bottom.
    let output = check_should_fail("class C() { this.v = C().v; }");
    let err = stderr(&output);
    assert!(err.contains("'C.v' ended as Bottom"), "{err}");
    assert!(err.contains("0 error(s), 1 unresolved binding(s)"), "{err}");
    assert!(!err.contains(": ok ("));
}

#[test]
fn check_lists_type_error_bindings() {
    let output = check_should_fail("x = 1.nope();");
    let err = stderr(&output);
    assert!(err.contains("'__pgm__.x' ended as TypeError"), "{err}");
}

#[test]
fn check_dump_hierarchy_text() {
    let text = dump_hierarchy(PAIR);
    assert!(text.contains("class Pair extends Obj"));
    assert!(text.contains("  field a: Int"));
    assert!(text.contains("  method sum(): Int"));
    assert!(text.contains("  var s: Int"));
}

#[test]
fn check_dump_hierarchy_json() {
    let output = run_quackc("check", PAIR, &["--dump-hierarchy", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["order"][0], "Pair");
    assert_eq!(json["program"]["p"], "Pair");
}

#[test]
fn json_requires_dump_flag() {
    let output = run_quackc("check", PAIR, &["--json"]);
    assert!(!output.status.success());
}

#[test]
fn ast_prints_json() {
    let output = run_quackc("ast", "x = 1;", &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let stmt = &json["statements"]["node"]["stmts"][0]["node"];
    assert_eq!(stmt["kind"], "Assign");
    assert_eq!(stmt["value"]["node"]["kind"], "IntConst");
}

#[test]
fn ast_reports_syntax_errors() {
    let output = run_quackc("ast", "x = ;", &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("syntax error"));
}

#[test]
fn hierarchy_shows_pre_inference_state() {
    let output = run_quackc("hierarchy", PAIR, &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    // Fields are seeded but not yet typed.
    assert!(text.contains("  field a: Bottom"), "{text}");
    assert!(text.contains("  method PRINT(): Nothing (from Obj)"));
}

#[test]
fn config_discovered_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "x = 1.nope(); x = 2;");
    std::fs::write(dir.path().join("quack.toml"), "[inference]\ntype_error = \"heal\"\n").unwrap();
    let output = quackc().arg("check").arg(&src).arg("--dump-hierarchy").output().unwrap();
    assert!(!output.status.success());
    assert!(stdout(&output).contains("  var x: Int"), "{}", stdout(&output));
}

#[test]
fn explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "class A() { def f() { return this.g(); } def g() { return 1; } }");
    let config = dir.path().join("strict.toml");
    std::fs::write(&config, "[inference]\nmax_passes = 1\n").unwrap();
    let output = quackc().arg("check").arg(&src).arg("--config").arg(&config).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("did not converge"), "{}", stderr(&output));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "x = 1;");
    std::fs::write(dir.path().join("quack.toml"), "[inference]\nmax_pases = 3\n").unwrap();
    let output = quackc().arg("check").arg(&src).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("quack.toml: invalid syntax"), "{}", stderr(&output));
}

#[test]
fn missing_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = quackc().arg("check").arg(dir.path().join("absent.qk")).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("could not read file"));
}

#[test]
fn verbose_logs_phases() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), PAIR);
    let output = quackc().arg("--verbose").arg("check").arg(&src).output().unwrap();
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("hierarchy built"), "{err}");
    assert!(err.contains("inference pass"), "{err}");
}
