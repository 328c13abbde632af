//! End-to-End CLI Integration Tests
//!
//! Tests the complete runtime through the node_cli Runtime API: source code
//! in, console output and exit code out.

use builtins::CaptureSink;
use node_cli::{CliError, Runtime};
use node_process::{HostEnvironment, ProcessError};
use std::sync::Arc;

fn runtime(dir: &std::path::Path) -> (Runtime, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::new());
    let runtime = Runtime::new(HostEnvironment::new(dir), "e2e").with_console(sink.clone());
    (runtime, sink)
}

/// Test: a script that finishes normally exits with 0
#[test]
fn test_e2e_clean_exit() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, sink) = runtime(dir.path());
    let code = runtime.execute_string("console.log(1 + 2)").expect("execution failed");
    assert_eq!(code, 0);
    assert_eq!(sink.lines(), vec!["3"]);
}

/// Test: process.exit and process.exitCode set the exit status
#[test]
fn test_e2e_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, sink) = runtime(dir.path());
    assert_eq!(runtime.execute_string("process.exit(3); console.log('no')").unwrap(), 3);
    assert_eq!(
        runtime
            .execute_string("process.exitCode = 4; setTimeout(function () { console.log('yes') }, 1)")
            .unwrap(),
        4
    );
    assert_eq!(sink.lines(), vec!["yes"]);
}

/// Test: a synchronous throw ends the program with status 1
#[test]
fn test_e2e_sync_throw() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, sink) = runtime(dir.path());
    let code = runtime
        .execute_string("setTimeout(function () { console.log('never') }, 0); throw new Error('bad')")
        .unwrap();
    assert_eq!(code, 1);
    assert!(sink.lines().is_empty());
}

/// Test: an exception thrown from a callback is a process failure
#[test]
fn test_e2e_async_throw() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _) = runtime(dir.path());
    let error = runtime
        .execute_string("setTimeout(function () { throw new TypeError('late') }, 0)")
        .unwrap_err();
    match error {
        CliError::Process(ProcessError::UncaughtException(e)) => assert_eq!(e.message, "late"),
        other => panic!("unexpected error {:?}", other),
    }
}

/// Test: script files run with their path in process.argv
#[test]
fn test_e2e_execute_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("hello.js");
    std::fs::write(&script, "require('fs').writeFileSync('hello.txt', 'hello'); console.log('done')").unwrap();

    let (runtime, sink) = runtime(dir.path());
    assert_eq!(runtime.execute_file(&script).unwrap(), 0);
    assert_eq!(sink.lines(), vec!["done"]);
    let written = HostEnvironment::new(dir.path()).home_dir("e2e").join("hello.txt");
    assert_eq!(std::fs::read_to_string(written).unwrap(), "hello");
}

/// Test: missing script files are reported before a process starts
#[test]
fn test_e2e_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _) = runtime(dir.path());
    let error = runtime.execute_file(&dir.path().join("nope.js")).unwrap_err();
    assert!(matches!(error, CliError::Io { .. }));
}
