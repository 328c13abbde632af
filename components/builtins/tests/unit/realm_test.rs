//! Unit tests for the installed realm as seen from script

use builtins::CaptureSink;
use interpreter::{Interpreter, Value};
use std::sync::Arc;

fn realm() -> Interpreter {
    let mut interp = Interpreter::new();
    builtins::install(&mut interp, Arc::new(CaptureSink::new()));
    interp
}

fn eval(source: &str) -> Value {
    realm().evaluate(source).unwrap()
}

#[test]
fn test_every_function_inherits_bind() {
    assert_eq!(eval("typeof Math.max.bind"), Value::from("function"));
    assert_eq!(eval("Array.prototype.map.call([1, 2], n => n + n).join()"), Value::from("2,4"));
}

#[test]
fn test_json_round_trip_keeps_key_order() {
    let result = eval("JSON.stringify(JSON.parse('{\"z\":1,\"a\":[true,null],\"m\":\"s\"}'))");
    assert_eq!(result, Value::from("{\"z\":1,\"a\":[true,null],\"m\":\"s\"}"));
}

#[test]
fn test_error_constructors_are_catchable_by_kind() {
    let result = eval(
        "var caught = []; \
         try { null.x } catch (e) { caught.push(e instanceof TypeError) } \
         try { missing } catch (e) { caught.push(e instanceof ReferenceError, e instanceof Error) } \
         caught.join()",
    );
    assert_eq!(result, Value::from("true,true,true"));
}

#[test]
fn test_object_helpers() {
    let result = eval(
        "var o = Object.assign({}, { a: 1 }, { b: 2 }); \
         Object.keys(o).join() + '|' + Object.entries(o).map(e => e.join('=')).join('&')",
    );
    assert_eq!(result, Value::from("a,b|a=1&b=2"));
}

#[test]
fn test_string_and_number_methods_compose() {
    let result = eval("(255).toString(16).toUpperCase().padStart(4, '0') + ' ' + (1.005).toFixed(1)");
    assert_eq!(result, Value::from("00FF 1.0"));
}

#[test]
fn test_sort_with_comparator() {
    assert_eq!(eval("[10, 9, 1, 100].sort((a, b) => a - b).join()"), Value::from("1,9,10,100"));
    assert_eq!(eval("[10, 9, 1, 100].sort().join()"), Value::from("1,10,100,9"));
}

#[test]
fn test_global_this_is_global_object() {
    assert_eq!(eval("var marker = 5; globalThis.marker"), Value::from(5));
    assert_eq!(eval("parseInt('0x1f') + parseFloat('2.5e1')"), Value::from(56));
}
