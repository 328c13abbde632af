//! Unit tests for process, timers and require

use builtins::CaptureSink;
use node_process::{HostEnvironment, JsContext};
use std::sync::Arc;

fn context(env: &HostEnvironment) -> (JsContext, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::new());
    let context = JsContext::new(env, "globals", sink.clone()).unwrap();
    (context, sink)
}

#[test]
fn timers_pass_extra_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, sink) = context(&HostEnvironment::new(dir.path()));
    context
        .evaluate_script(
            "setTimeout((a, b) => console.log('timeout', a, b), 0, 1, 'two');
             setImmediate(n => console.log('immediate', n), 3);
             process.nextTick(s => console.log('tick', s), 'x');",
        )
        .unwrap();
    context.drain_event_loop().unwrap();
    assert_eq!(sink.lines(), vec!["tick x", "immediate 3", "timeout 1 two"]);
}

#[test]
fn timers_fire_in_deadline_order() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, sink) = context(&HostEnvironment::new(dir.path()));
    context
        .evaluate_script(
            "setTimeout(() => console.log('30'), 30);
             setTimeout(() => console.log('5'), 5);
             setTimeout(() => console.log('NaN'), NaN);",
        )
        .unwrap();
    context.drain_event_loop().unwrap();
    assert_eq!(sink.lines(), vec!["NaN", "5", "30"]);
}

#[test]
fn timer_ids_are_numbers_and_clearable() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, sink) = context(&HostEnvironment::new(dir.path()));
    let value = context
        .evaluate_script(
            "var a = setTimeout(() => console.log('a'), 1);
             var b = setTimeout(() => console.log('b'), 1);
             clearTimeout(a); clearTimeout('junk'); clearTimeout();
             typeof b",
        )
        .unwrap();
    assert_eq!(value.to_string(), "number");
    context.drain_event_loop().unwrap();
    assert_eq!(sink.lines(), vec!["b"]);
}

#[test]
fn timer_without_callback_throws() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _) = context(&HostEnvironment::new(dir.path()));
    let error = context.evaluate_script("setTimeout('code', 1)").unwrap_err();
    assert!(error.message.contains("must be of type function"));
}

#[test]
fn process_object_shape() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path()).with_argv(["node", "app.js", "--flag"]);
    let (mut context, _) = context(&env);
    let value = context
        .evaluate_script(
            "[process.argv.length, process.argv[2], process.cwd(), typeof process.platform,
              process.exitCode === undefined, Object.keys(globalThis).indexOf('process')].join(' ')",
        )
        .unwrap();
    assert_eq!(value.to_string(), "3 --flag /home string true -1");
}

#[test]
fn process_exit_without_code_uses_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, sink) = context(&HostEnvironment::new(dir.path()));
    context
        .evaluate_script(
            "process.exitCode = 9;
             setImmediate(() => { process.exit(); console.log('after') });
             setImmediate(() => console.log('skipped'));",
        )
        .unwrap();
    let error = context.drain_event_loop().unwrap_err();
    assert!(error.is_termination());
    assert_eq!(context.exit_requested(), Some(9));
    assert!(sink.lines().is_empty());
}

#[test]
fn process_exit_cannot_be_caught() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, sink) = context(&HostEnvironment::new(dir.path()));
    let error = context
        .evaluate_script("try { process.exit(4) } catch (e) { console.log('caught') } finally { console.log('finally') }")
        .unwrap_err();
    assert!(error.is_termination());
    assert_eq!(context.exit_code(), 4);
    assert!(!sink.lines().contains(&"caught".to_string()));
}

#[test]
fn require_caches_modules() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _) = context(&HostEnvironment::new(dir.path()));
    let value = context
        .evaluate_script(
            "var fs = require('fs'); fs.marker = 1;
             require('node:fs').marker + ' ' + typeof fs.writeFile + ' ' + typeof fs.readdirSync",
        )
        .unwrap();
    assert_eq!(value.to_string(), "1 function function");
}

#[test]
fn unknown_module_error() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _) = context(&HostEnvironment::new(dir.path()));
    let error = context.evaluate_script("require('node:net')").unwrap_err();
    assert_eq!(error.message, "Cannot find module 'node:net'");
}
