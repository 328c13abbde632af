//! Unit tests for console output through the sinks

use builtins::{CaptureSink, ConsoleLevel};
use interpreter::Interpreter;
use std::sync::Arc;

fn capture(source: &str) -> Arc<CaptureSink> {
    let sink = Arc::new(CaptureSink::new());
    let mut interp = Interpreter::new();
    builtins::install(&mut interp, sink.clone());
    interp.evaluate(source).unwrap();
    sink
}

#[test]
fn test_log_inspects_nested_values() {
    let sink = capture("console.log('list', [1, 'two', { three: 3 }], null, undefined)");
    assert_eq!(sink.lines(), vec!["list [ 1, 'two', { three: 3 } ] null undefined"]);
}

#[test]
fn test_log_prints_errors_with_stack() {
    let sink = capture("console.error(new RangeError('out'))");
    let entries = sink.entries();
    assert_eq!(entries[0].0, ConsoleLevel::Error);
    assert!(entries[0].1.starts_with("RangeError: out\n    at "));
}

#[test]
fn test_log_never_runs_getters() {
    let sink = capture("var hits = 0; console.log({ get x() { hits++; return 1 } }); console.log(hits)");
    assert_eq!(sink.lines(), vec!["{ x: [Getter] }", "0"]);
}

#[test]
fn test_clear_discards_output() {
    let sink = capture("console.log('a')");
    sink.clear();
    assert!(sink.lines().is_empty());
}
