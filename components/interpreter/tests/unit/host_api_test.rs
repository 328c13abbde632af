//! Unit tests for the native host API: functions, constructors, tasks, teardown

use interpreter::{Interpreter, PropertyAttributes, ScriptTask, Value};
use std::time::Duration;

#[test]
fn test_native_function_is_callable_from_script() {
    let mut interp = Interpreter::new();
    let double = interp.create_function("double", 1, |interp, _this, args| {
        let n = interp.to_number(&args.first().cloned().unwrap_or_default())?;
        Ok(Value::from(n * 2.0))
    });
    interp.global().set_value("double", double);
    assert_eq!(interp.evaluate("double('21')").unwrap(), Value::from(42));
}

#[test]
fn test_native_constructor_receives_instance() {
    let mut interp = Interpreter::new();
    let prototype = interp.create_object();
    let point = interp.create_constructor("Point", 2, prototype, |interp, this, args| {
        let x = args.first().cloned().unwrap_or_default();
        interp.set_property(this, "x", x)?;
        Ok(Value::Undefined)
    });
    interp.global().set_value("Point", point);
    let result = interp
        .evaluate("var p = new Point(3); p.x === 3 && p instanceof Point && p.constructor === Point")
        .unwrap();
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn test_read_only_properties_ignore_writes() {
    let mut interp = Interpreter::new();
    let config = interp.create_object();
    config.define_value("version", Value::from(1), PropertyAttributes::READ_ONLY);
    interp.global().set_value("config", config);
    assert_eq!(
        interp.evaluate("config.version = 2; config.version").unwrap(),
        Value::from(1)
    );
}

#[test]
fn test_scheduled_task_runs_on_event_loop() {
    let mut interp = Interpreter::new();
    interp.event_loop_mut().set_timeout(
        Duration::from_millis(1),
        ScriptTask::new(|interp: &mut Interpreter| {
            interp.run_script("fired = true", "timer.js")?;
            Ok(())
        }),
    );
    interp.run_event_loop().unwrap();
    assert_eq!(interp.evaluate("fired").unwrap(), Value::Boolean(true));
}

#[test]
fn test_teardown_releases_cycles() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("var o = {}; o.self = o; function f() { return o }")
        .unwrap();
    assert!(interp.heap_stats().live > 0);
    interp.teardown();
    assert_eq!(interp.heap_stats().live, 0);
    assert!(interp.is_torn_down());
    assert!(interp.evaluate("1").is_err());
}
