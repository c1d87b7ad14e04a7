mod common;
use common::*;

use quackc::typeck::types::QuackType;

const SHAPES: &str = r#"
/* A small shape library. */
class Pt(x: Int, y: Int) {
    this.x = x;
    this.y = y;

    def STRING(): String {
        return "(" + this.x.STRING() + "," + this.y.STRING() + ")";
    }

    def PLUS(other: Pt): Pt {
        return Pt(this.x + other.x, this.y + other.y);
    }

    def _x(): Int { return this.x; }
    def _y(): Int { return this.y; }
}

class Rect(ll: Pt, ur: Pt) {
    this.ll = ll;
    this.ur = ur;

    def translate(delta: Pt): Rect {
        return Rect(this.ll + delta, this.ur + delta);
    }

    def area() {
        w = this.ur._x() - this.ll._x();
        h = this.ur._y() - this.ll._y();
        return w * h;
    }
}

class Square(ll: Pt, side: Int) extends Rect {
    this.ll = ll;
    this.ur = Pt(ll._x() + side, ll._y() + side);
    this.side = side;
}

// Top-level code.
a = Pt(1, 2);
r = Rect(a, Pt(4, 6));
s = Square(Pt(0, 0), 3);
if r.area() > s.area() {
    biggest = r;
} else {
    biggest = s;
}
moved = biggest.translate(Pt(1, 1));
total = r.area() + s.area();
"#;

#[test]
fn shapes_program_checks() {
    let out = quackc::check_source(SHAPES).unwrap();
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    let pgm = &out.hierarchy.get("__pgm__").unwrap().instance_vars;
    assert_eq!(pgm["biggest"], QuackType::class("Rect"));
    assert_eq!(pgm["moved"], QuackType::class("Rect"));
    assert_eq!(pgm["total"], QuackType::class("Int"));
    let rect = out.hierarchy.get("Rect").unwrap();
    assert_eq!(rect.methods["area"].return_type, QuackType::class("Int"));
    let square = out.hierarchy.get("Square").unwrap();
    assert_eq!(square.methods["area"].return_type, QuackType::class("Int"));
    assert_eq!(square.instance_vars["side"], QuackType::class("Int"));
    out.ensure_emittable().unwrap();
}

#[test]
fn shapes_program_through_binary() {
    let text = dump_hierarchy(SHAPES);
    assert!(text.contains("class Square extends Rect"));
    assert!(text.contains("  method area(): Int (from Rect)"));
    assert!(text.contains("  var biggest: Rect"));
}

#[test]
fn broken_program_reports_all_problems() {
    let src = r#"
class Counter() {
    this.n = 0;
    def inc(by: Int): Int {
        this.n = this.n + by;
        return this.n;
    }
}
c = Counter();
c.inc("one");
c.dec(1);
if c.inc(1) { }
flag: Boolean = c;
"#;
    let out = quackc::check_source(src).unwrap();
    let lines: Vec<String> = out.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(lines.len(), 4, "{lines:#?}");
    assert!(lines[0].starts_with("[ArgumentSubtypeViolation] __pgm__:"));
    assert!(lines[1].starts_with("[MethodNotFound] __pgm__:"));
    assert!(lines[2].starts_with("[ConditionNotBoolean] __pgm__:"));
    assert!(lines[3].starts_with("[AssignmentSubtypeViolation] __pgm__:"));
    assert!(out.ensure_emittable().is_err());
}

#[test]
fn empty_program() {
    let out = quackc::check_source("").unwrap();
    assert!(out.diagnostics.is_empty());
    assert!(out.hierarchy.user_classes().next().is_none());
}

#[test]
fn comments_are_ignored() {
    check_should_pass("// nothing here\n/* or\nhere */ x = 1; // trailing\n");
}
