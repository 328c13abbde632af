//! Unit tests for statement and expression evaluation

use interpreter::{Interpreter, Value};

fn eval(source: &str) -> Value {
    let mut interp = Interpreter::new();
    interp.evaluate(source).unwrap()
}

#[test]
fn test_string_concatenation_is_left_to_right() {
    assert_eq!(eval("'a' + 1 + 2"), Value::from("a12"));
    assert_eq!(eval("1 + 2 + 'a'"), Value::from("3a"));
    assert_eq!(eval("'5' * '2'"), Value::from(10));
}

#[test]
fn test_var_is_hoisted() {
    assert_eq!(eval("var r = typeof x; var x = 5; r"), Value::from("undefined"));
    assert_eq!(eval("f(); function f() { return 1 }"), Value::from(1));
}

#[test]
fn test_let_in_for_loop_is_per_iteration() {
    let source = "
        var fns = [];
        for (let i = 0; i < 3; i++) { fns[i] = function () { return i; }; }
        fns[0]() + fns[1]() + fns[2]()
    ";
    assert_eq!(eval(source), Value::from(3));
}

#[test]
fn test_closures_share_captured_binding() {
    let source = "
        function counter() { let n = 0; return () => ++n; }
        var next = counter();
        next(); next(); next()
    ";
    assert_eq!(eval(source), Value::from(3));
}

#[test]
fn test_accessors_in_object_literal() {
    let source = "
        var o = { _v: 1, get v() { return this._v * 2 }, set v(x) { this._v = x } };
        o.v = 5;
        o.v
    ";
    assert_eq!(eval(source), Value::from(10));
}

#[test]
fn test_method_and_arrow_this() {
    assert_eq!(eval("var o = { n: 3, f() { return this.n } }; o.f()"), Value::from(3));
    assert_eq!(
        eval("var o = { n: 4, f() { return (() => this.n)() } }; o.f()"),
        Value::from(4)
    );
}

#[test]
fn test_constructor_and_instanceof() {
    let source = "
        function Point(x) { this.x = x }
        var p = new Point(7);
        p instanceof Point && p.x === 7
    ";
    assert_eq!(eval(source), Value::Boolean(true));
}

#[test]
fn test_default_and_rest_parameters() {
    let source = "
        function f(a, b = 10, ...rest) { return a + b + rest.length }
        f(1) + f(1, 2, 3, 4)
    ";
    assert_eq!(eval(source), Value::from(16));
}

#[test]
fn test_for_in_and_for_of() {
    let source = "
        var s = '';
        for (const k in { a: 1, b: 2 }) s += k;
        for (const c of 'xy') s += c;
        for (let v of [1, 2]) s += v;
        s
    ";
    assert_eq!(eval(source), Value::from("abxy12"));
}

#[test]
fn test_loops_break_and_continue() {
    let source = "
        var total = 0;
        for (var i = 0; i < 10; i++) {
            if (i % 2) continue;
            if (i > 6) break;
            total += i;
        }
        var j = 0;
        do { j++ } while (j < 5);
        total + j
    ";
    assert_eq!(eval(source), Value::from(17));
}

#[test]
fn test_loose_equality() {
    assert_eq!(
        eval("null == undefined && 1 == '1' && !(0 == null) && true == 1"),
        Value::Boolean(true)
    );
    assert_eq!(eval("NaN == NaN"), Value::Boolean(false));
}

#[test]
fn test_template_literal() {
    assert_eq!(eval("var n = 2; `n=${n + 1}!`"), Value::from("n=3!"));
}

#[test]
fn test_delete_respects_dont_delete() {
    let mut interp = Interpreter::new();
    let result = interp
        .evaluate("this.h = 1; var r1 = delete this.h; var g = 2; var r2 = delete this.g; [r1, r2]")
        .unwrap();
    let elements = result.as_object().and_then(|o| o.array_elements()).unwrap();
    assert_eq!(elements, vec![Value::Boolean(true), Value::Boolean(false)]);
}

#[test]
fn test_undeclared_assignment_creates_global() {
    let mut interp = Interpreter::new();
    interp.evaluate("function f() { leaked = 5 } f()").unwrap();
    assert!(interp.global().has_own_property("leaked"));
    assert_eq!(interp.evaluate("leaked").unwrap(), Value::from(5));
}

#[test]
fn test_try_finally_runs_on_return() {
    let source = "
        var log = '';
        function f() {
            try { return 'try' } finally { log += 'finally' }
        }
        f() + ':' + log
    ";
    assert_eq!(eval(source), Value::from("try:finally"));
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(eval("null ?? 'd'"), Value::from("d"));
    assert_eq!(eval("0 ?? 'd'"), Value::from(0));
    assert_eq!(eval("0 || 'x'"), Value::from("x"));
    assert_eq!(eval("var called = false; false && (called = true); called"), Value::Boolean(false));
}

#[test]
fn test_string_indexing_and_length() {
    assert_eq!(eval("'héllo'.length"), Value::from(5));
    assert_eq!(eval("'abc'[1]"), Value::from("b"));
}

#[test]
fn test_typeof_values() {
    assert_eq!(eval("typeof function () {}"), Value::from("function"));
    assert_eq!(eval("typeof null"), Value::from("object"));
    assert_eq!(eval("typeof notDeclared"), Value::from("undefined"));
}

#[test]
fn test_global_state_persists_between_evaluations() {
    let mut interp = Interpreter::new();
    interp.evaluate("let counter = 1; var total = 10;").unwrap();
    interp.evaluate("counter++; total += counter;").unwrap();
    assert_eq!(interp.evaluate("total").unwrap(), Value::from(12));
}
