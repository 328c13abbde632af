//! Unit tests for exceptions, error objects and stack traces

use core_types::ErrorKind;
use interpreter::{Exception, Interpreter, InterpreterConfig, Value};
use std::thread;

#[test]
fn test_native_errors_are_catchable_error_objects() {
    let mut interp = Interpreter::new();
    let result = interp
        .evaluate("var r; try { missingFn() } catch (e) { r = e.name + ': ' + e.message } r")
        .unwrap();
    assert_eq!(result, Value::from("ReferenceError: missingFn is not defined"));
}

#[test]
fn test_const_assignment_is_type_error() {
    let mut interp = Interpreter::new();
    let error = interp.evaluate("const a = 1; a = 2").unwrap_err();
    assert_eq!(error.kind, ErrorKind::TypeError);
    assert_eq!(error.message, "Assignment to constant variable.");
}

#[test]
fn test_reading_property_of_undefined() {
    let mut interp = Interpreter::new();
    let error = interp.evaluate("var u; u.x").unwrap_err();
    assert_eq!(error.kind, ErrorKind::TypeError);
    assert_eq!(error.message, "Cannot read properties of undefined (reading 'x')");
}

#[test]
fn test_calling_a_non_function_names_the_callee() {
    let mut interp = Interpreter::new();
    let error = interp.evaluate("var o = {}; o.missing()").unwrap_err();
    assert_eq!(error.message, "o.missing is not a function");
}

#[test]
fn test_stack_trace_names_script_functions() {
    let mut interp = Interpreter::new();
    let source = "function inner() { null.x }\nfunction outer() { inner() }\nouter()";
    let error = match interp.run_script(source, "test.js") {
        Err(Exception::Error(error)) => error,
        other => panic!("unexpected result: {:?}", other),
    };
    let names: Vec<Option<String>> = error.stack.iter().map(|f| f.function_name.clone()).collect();
    assert_eq!(names, vec![Some("inner".to_string()), Some("outer".to_string()), None]);
    let lines: Vec<u32> = error.stack.iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
    assert_eq!(error.stack[0].source_url.as_deref(), Some("test.js"));
}

#[test]
fn test_rethrown_error_keeps_kind() {
    let mut interp = Interpreter::new();
    let error = interp
        .evaluate("try { null.x } catch (e) { throw e }")
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::TypeError);
    assert_eq!(error.message, "Cannot read properties of null (reading 'x')");
}

#[test]
fn test_uncaught_primitive() {
    let mut interp = Interpreter::new();
    let error = interp.evaluate("throw 'boom'").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Error);
    assert_eq!(error.message, "Uncaught boom");
}

#[test]
fn test_syntax_error() {
    let mut interp = Interpreter::new();
    let error = interp.evaluate("var = ;").unwrap_err();
    assert_eq!(error.kind, ErrorKind::SyntaxError);
}

#[test]
fn test_interrupt_terminates_and_is_not_catchable() {
    let mut interp = Interpreter::new();
    interp.loop_handle().interrupt();
    let error = interp
        .evaluate("try { while (true) {} } catch (e) { 'caught' }")
        .unwrap_err();
    assert!(error.is_termination());
}

#[test]
fn test_runaway_recursion_is_range_error() {
    // Deep script recursion needs more native stack than the test harness default.
    let handle = thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let mut interp = Interpreter::with_config(InterpreterConfig {
                max_call_depth: 64,
                ..InterpreterConfig::default()
            });
            let error = interp.evaluate("function r() { return r() } r()").unwrap_err();
            (error.kind, error.message)
        })
        .unwrap();
    let (kind, message) = handle.join().unwrap();
    assert_eq!(kind, ErrorKind::RangeError);
    assert_eq!(message, "Maximum call stack size exceeded");
}

#[test]
fn test_array_growth_past_limit_is_range_error() {
    let mut interp = Interpreter::new();
    let result = interp
        .evaluate(
            "var a = []; var out = '';
             try { a[3000000000] = 1 } catch (e) { out += e.name }
             try { a.length = 4294967295 } catch (e) { out += ' ' + e.message }
             a[4294967295] = 2;
             out + ' ' + a.length + ' ' + a[4294967295]",
        )
        .unwrap();
    assert_eq!(result, Value::from("RangeError Invalid array length 0 2"));
}
