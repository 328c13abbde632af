//! Node host globals: `process`, timers and `require`.

use crate::config::HostEnvironment;
use crate::fs::create_fs_module;
use crate::sandbox::{Sandbox, HOME};
use async_runtime::{TimerId, Task};
use core_types::ErrorKind;
use interpreter::{to_int32, Exception, Interpreter, JsObject, PropertyAttributes, ScriptResult, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Longest timer delay; larger delays fire after 1ms, as in Node.
const TIMEOUT_MAX_MS: f64 = 2_147_483_647.0;

/// Per-process state shared between the host globals and the context.
#[derive(Debug, Default)]
pub(crate) struct HostState {
    /// Set by `process.exit`
    pub(crate) exit_code: Cell<Option<i32>>,
}

fn callable_arg(args: &[Value], method: &str) -> ScriptResult<Value> {
    match args.first() {
        Some(callback) if callback.is_callable() => Ok(callback.clone()),
        _ => Err(Exception::type_error(format!(
            "The \"callback\" argument of {} must be of type function",
            method
        ))),
    }
}

fn callback_task(callback: Value, args: Vec<Value>) -> Task<Interpreter, Exception> {
    Task::new(move |interp: &mut Interpreter| {
        interp.call(&callback, &Value::Undefined, &args).map(|_| ())
    })
}

fn platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Installs `process`, the timer functions and `require`.
///
/// Returns the `process` object.
pub(crate) fn install(
    interp: &mut Interpreter,
    host: &Rc<HostState>,
    sandbox: &Arc<Sandbox>,
    env: &HostEnvironment,
) -> JsObject {
    let process = install_process(interp, host, env);
    install_timers(interp);
    install_require(interp, sandbox);
    process
}

fn install_process(interp: &mut Interpreter, host: &Rc<HostState>, env: &HostEnvironment) -> JsObject {
    let process = interp.create_object();

    let argv = env.argv.iter().map(|a| Value::from(a.as_str())).collect();
    let argv = interp.create_array(argv);
    process.set_value("argv", argv);

    let environment = interp.create_object();
    for (key, value) in std::env::vars() {
        environment.set_value(&key, value);
    }
    process.set_value("env", environment);
    process.set_value("platform", platform());
    process.set_value("exitCode", Value::Undefined);

    interp.define_method(&process, "cwd", 0, |_interp, _this, _args| Ok(Value::from(HOME)));

    let exit_host = host.clone();
    let exit_process = process.clone();
    interp.define_method(&process, "exit", 1, move |interp, _this, args| {
        let code = match args.first() {
            Some(Value::Undefined) | None => {
                let current = interp.get_property(&Value::Object(exit_process.clone()), "exitCode")?;
                exit_code_of(interp, &current)?
            }
            Some(code) => to_int32(interp.to_number(code)?),
        };
        exit_host.exit_code.set(Some(code));
        Err(Exception::Exit(code))
    });

    interp.define_method(&process, "nextTick", 1, |interp, _this, args| {
        let callback = callable_arg(args, "process.nextTick")?;
        let rest = args.get(1..).unwrap_or(&[]).to_vec();
        interp.event_loop_mut().enqueue_microtask(callback_task(callback, rest));
        Ok(Value::Undefined)
    });

    interp
        .global()
        .define_value("process", Value::Object(process.clone()), PropertyAttributes::DONT_ENUM);
    process
}

/// `process.exitCode` as an exit status; unset means 0.
pub(crate) fn exit_code_of(interp: &mut Interpreter, value: &Value) -> ScriptResult<i32> {
    match value {
        Value::Undefined | Value::Null => Ok(0),
        other => Ok(to_int32(interp.to_number(other)?)),
    }
}

fn install_timers(interp: &mut Interpreter) {
    let global = interp.global();

    interp.define_method(&global, "setTimeout", 2, |interp, _this, args| {
        let callback = callable_arg(args, "setTimeout")?;
        let delay = interp.to_number(&args.get(1).cloned().unwrap_or_default())?;
        let delay = if delay.is_nan() || delay < 1.0 || delay > TIMEOUT_MAX_MS {
            1.0
        } else {
            delay.trunc()
        };
        let rest = args.get(2..).unwrap_or(&[]).to_vec();
        let id = interp
            .event_loop_mut()
            .set_timeout(Duration::from_millis(delay as u64), callback_task(callback, rest));
        Ok(Value::Number(id.as_u64() as f64))
    });

    interp.define_method(&global, "clearTimeout", 1, |interp, _this, args| {
        if let Some(Value::Number(id)) = args.first() {
            if *id >= 0.0 && id.fract() == 0.0 {
                interp.event_loop_mut().clear_timeout(TimerId::from_u64(*id as u64));
            }
        }
        Ok(Value::Undefined)
    });

    interp.define_method(&global, "setImmediate", 1, |interp, _this, args| {
        let callback = callable_arg(args, "setImmediate")?;
        let rest = args.get(1..).unwrap_or(&[]).to_vec();
        interp.event_loop_mut().enqueue_task(callback_task(callback, rest));
        Ok(Value::Undefined)
    });
}

fn install_require(interp: &mut Interpreter, sandbox: &Arc<Sandbox>) {
    let sandbox = sandbox.clone();
    let cache: RefCell<HashMap<&'static str, JsObject>> = RefCell::new(HashMap::new());

    let require = interp.create_function("require", 1, move |interp, _this, args| {
        let requested = interp.to_js_string(&args.first().cloned().unwrap_or_default())?;
        let name = requested.strip_prefix("node:").unwrap_or(&*requested);
        let key = match name {
            "fs" => "fs",
            _ => {
                let error = interp.create_error(
                    ErrorKind::Error,
                    &format!("Cannot find module '{}'", requested),
                );
                error.set_value("code", "MODULE_NOT_FOUND");
                return Err(Exception::Thrown(Value::Object(error)));
            }
        };
        if let Some(module) = cache.borrow().get(key) {
            return Ok(Value::Object(module.clone()));
        }
        let module = create_fs_module(interp, &sandbox);
        cache.borrow_mut().insert(key, module.clone());
        log::trace!("loaded built-in module '{}'", key);
        Ok(Value::Object(module))
    });

    interp
        .global()
        .define_value("require", Value::Object(require), PropertyAttributes::DONT_ENUM);
}
