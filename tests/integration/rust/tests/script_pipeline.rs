//! Script pipeline integration tests
//!
//! Source -> Parser -> AST -> Interpreter (with builtins) -> Result, and the
//! same path through a sandboxed JsContext.

use builtins::CaptureSink;
use core_types::ErrorKind;
use interpreter::{Interpreter, Value};
use node_process::{HostEnvironment, JsContext};
use parser::{Parser, Statement};
use std::sync::Arc;

fn interpreter_with_builtins() -> (Interpreter, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::new());
    let mut interp = Interpreter::new();
    builtins::install(&mut interp, sink.clone());
    (interp, sink)
}

/// Test: the parser produces one statement per top-level declaration
#[test]
fn test_parser_output_shape() {
    let program = Parser::new("function f(a) { return a + 1 } var x = f(2); x;")
        .parse()
        .expect("parse failed");
    assert_eq!(program.body.len(), 3);
    assert!(matches!(program.body[0], Statement::FunctionDeclaration { .. }));
    assert!(matches!(program.body[1], Statement::VariableDeclaration { .. }));
    assert!(matches!(program.body[2], Statement::ExpressionStatement { .. }));
}

/// Test: syntax errors surface before anything runs
#[test]
fn test_syntax_error_is_reported_by_both_layers() {
    let error = Parser::new("var = ;").parse().unwrap_err();
    assert_eq!(error.kind, ErrorKind::SyntaxError);

    let (mut interp, sink) = interpreter_with_builtins();
    let error = interp.evaluate("console.log('ran'); var = ;").unwrap_err();
    assert_eq!(error.kind, ErrorKind::SyntaxError);
    assert!(sink.lines().is_empty());
}

/// Test: closures, arrays and JSON work together
#[test]
fn test_builtins_over_script_functions() {
    let (mut interp, _) = interpreter_with_builtins();
    let result = interp
        .evaluate(
            "function counter() { var n = 0; return function () { n += 1; return n } }
             var c = counter(); c(); c();
             JSON.stringify({ count: c(), items: [1, 2, 3].map(function (x) { return x * 2 }) })",
        )
        .unwrap();
    assert_eq!(result, Value::from(r#"{"count":3,"items":[2,4,6]}"#));
}

/// Test: console output goes to the configured sink
#[test]
fn test_console_sink_receives_formatted_output() {
    let (mut interp, sink) = interpreter_with_builtins();
    interp.evaluate("console.log('a', 1, true); console.error('b')").unwrap();
    assert_eq!(sink.lines(), vec!["a 1 true", "b"]);
}

/// Test: a context layers node globals over the same interpreter
#[test]
fn test_context_adds_node_globals() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(CaptureSink::new());
    let mut context = JsContext::new(&HostEnvironment::new(dir.path()), "pipeline", sink.clone()).unwrap();

    let kinds = context
        .evaluate_script("[typeof process, typeof require, typeof setTimeout, typeof JSON].join()")
        .unwrap();
    assert_eq!(kinds.as_str(), "object,function,function,object");

    context
        .evaluate_script("setTimeout(function (v) { console.log('later', v) }, 0, 7); console.log('now')")
        .unwrap();
    context.drain_event_loop().unwrap();
    assert_eq!(sink.lines(), vec!["now", "later 7"]);
}
