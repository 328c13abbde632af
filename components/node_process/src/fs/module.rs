//! Script bindings for the `fs` module.
//!
//! Async functions resolve and perform their I/O on the worker pool and
//! call back on the script thread with Node-style `(err, ...)` arguments.
//! Errors, permission errors included, only ever reach script through the
//! callback. `*Sync` variants throw the same error objects.

use super::error::{ErrorCode, FsError};
use super::ops::{self, Stats};
use crate::sandbox::Sandbox;
use core_types::{ErrorKind, JsError};
use interpreter::{number_to_string, Exception, Interpreter, JsObject, PropertyAttributes, ScriptResult, Value};
use std::sync::Arc;

/// Converts an [`FsError`] into the `Error` object script receives.
fn error_value(interp: &mut Interpreter, error: &FsError) -> Value {
    let object = interp.create_error(ErrorKind::Error, &error.to_string());
    object.set_value("errno", error.code.errno());
    object.set_value("code", error.code.as_str());
    object.set_value("syscall", error.syscall);
    object.set_value("path", error.path.as_str());
    if let Some(dest) = &error.dest {
        object.set_value("dest", dest.as_str());
    }
    Value::Object(object)
}

fn throw(interp: &mut Interpreter, error: &FsError) -> Exception {
    Exception::Thrown(error_value(interp, error))
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("type string ('{}')", s),
        Value::Number(n) => format!("type number ({})", number_to_string(*n)),
        Value::Boolean(b) => format!("type boolean ({})", b),
        Value::Object(object) if object.is_callable() => "function".to_string(),
        Value::Object(_) => "an instance of Object".to_string(),
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
    }
}

fn path_arg(args: &[Value], index: usize, name: &str) -> ScriptResult<String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.to_string()),
        other => Err(Exception::type_error(format!(
            "The \"{}\" argument must be of type string. Received {}",
            name,
            describe(other.unwrap_or(&Value::Undefined))
        ))),
    }
}

/// The trailing callback: the last argument, which must be a function.
fn callback_arg(args: &[Value], min_index: usize) -> ScriptResult<Value> {
    match args.last() {
        Some(callback) if args.len() > min_index && callback.is_callable() => Ok(callback.clone()),
        other => Err(Exception::type_error(format!(
            "The \"cb\" argument must be of type function. Received {}",
            describe(other.unwrap_or(&Value::Undefined))
        ))),
    }
}

fn data_arg(interp: &mut Interpreter, args: &[Value]) -> ScriptResult<Vec<u8>> {
    let data = args.get(1).cloned().unwrap_or_default();
    Ok(interp.to_js_string(&data)?.as_bytes().to_vec())
}

fn recursive_option(interp: &mut Interpreter, args: &[Value]) -> ScriptResult<bool> {
    match args.get(1) {
        Some(options @ Value::Object(object)) if !object.is_callable() => {
            Ok(interp.get_property(options, "recursive")?.is_truthy())
        }
        _ => Ok(false),
    }
}

fn text(bytes: Vec<u8>) -> Value {
    Value::from(String::from_utf8_lossy(&bytes).into_owned())
}

fn names_value(interp: &mut Interpreter, names: Vec<String>) -> Value {
    let elements = names.into_iter().map(Value::from).collect();
    Value::Object(interp.create_array(elements))
}

fn stats_value(interp: &mut Interpreter, stats: Stats) -> Value {
    let object = interp.create_object();
    object.set_value("size", stats.size as f64);
    object.set_value("mtimeMs", stats.mtime_ms);
    interp.define_method(&object, "isFile", 0, move |_interp, _this, _args| {
        Ok(Value::Boolean(stats.is_file))
    });
    interp.define_method(&object, "isDirectory", 0, move |_interp, _this, _args| {
        Ok(Value::Boolean(stats.is_directory))
    });
    Value::Object(object)
}

/// Runs `job` on the I/O workers and calls `callback` with the arguments
/// `deliver` builds from its output, or with the error alone.
fn dispatch<T, J, D>(
    interp: &mut Interpreter,
    callback: Value,
    syscall: &'static str,
    path: String,
    job: J,
    deliver: D,
) -> ScriptResult<Value>
where
    T: Send + 'static,
    J: FnOnce() -> Result<T, FsError> + Send + 'static,
    D: FnOnce(&mut Interpreter, T) -> Vec<Value> + 'static,
{
    interp
        .event_loop_mut()
        .submit(job, move |interp: &mut Interpreter, result| {
            let args = match result {
                Ok(Ok(output)) => deliver(interp, output),
                Ok(Err(error)) => vec![error_value(interp, &error)],
                Err(task_error) => {
                    log::warn!("{} '{}' failed on the worker: {}", syscall, path, task_error);
                    vec![error_value(interp, &FsError::new(ErrorCode::Eio, syscall, path))]
                }
            };
            interp.call(&callback, &Value::Undefined, &args).map(|_| ())
        })
        .map_err(|e| Exception::Error(JsError::internal(e.to_string())))?;
    Ok(Value::Undefined)
}

/// Success with no payload: `cb(null)`.
fn done(_interp: &mut Interpreter, _: ()) -> Vec<Value> {
    vec![Value::Null]
}

fn define<F>(interp: &mut Interpreter, fs: &JsObject, sandbox: &Arc<Sandbox>, name: &str, length: usize, function: F)
where
    F: Fn(&mut Interpreter, &[Value], &Arc<Sandbox>) -> ScriptResult<Value> + 'static,
{
    let sandbox = sandbox.clone();
    let method = interp.create_function(name, length, move |interp, _this, args| {
        function(interp, args, &sandbox)
    });
    fs.define_value(name, Value::Object(method), PropertyAttributes::empty());
}

/// Builds the module object. `require('fs')` caches it per process.
pub(crate) fn create_fs_module(interp: &mut Interpreter, sandbox: &Arc<Sandbox>) -> JsObject {
    let fs = interp.create_object();

    // ----- async -----

    define(interp, &fs, sandbox, "writeFile", 3, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let data = data_arg(interp, args)?;
        let callback = callback_arg(args, 2)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "open", path, move || ops::write_file(&sandbox, &job_path, &data), done)
    });

    define(interp, &fs, sandbox, "appendFile", 3, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let data = data_arg(interp, args)?;
        let callback = callback_arg(args, 2)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "open", path, move || ops::append_file(&sandbox, &job_path, &data), done)
    });

    define(interp, &fs, sandbox, "readFile", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "open", path, move || ops::read_file(&sandbox, &job_path), |_interp, bytes| {
            vec![Value::Null, text(bytes)]
        })
    });

    define(interp, &fs, sandbox, "readdir", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "scandir", path, move || ops::readdir(&sandbox, &job_path), |interp, names| {
            vec![Value::Null, names_value(interp, names)]
        })
    });

    define(interp, &fs, sandbox, "mkdir", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let recursive = recursive_option(interp, args)?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "mkdir", path, move || ops::mkdir(&sandbox, &job_path, recursive), done)
    });

    define(interp, &fs, sandbox, "unlink", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "unlink", path, move || ops::unlink(&sandbox, &job_path), done)
    });

    define(interp, &fs, sandbox, "rmdir", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "rmdir", path, move || ops::rmdir(&sandbox, &job_path), done)
    });

    define(interp, &fs, sandbox, "rename", 3, |interp, args, sandbox| {
        let from = path_arg(args, 0, "oldPath")?;
        let to = path_arg(args, 1, "newPath")?;
        let callback = callback_arg(args, 2)?;
        let sandbox = sandbox.clone();
        let job_from = from.clone();
        dispatch(interp, callback, "rename", from, move || ops::rename(&sandbox, &job_from, &to), done)
    });

    define(interp, &fs, sandbox, "stat", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "stat", path, move || ops::stat(&sandbox, &job_path), |interp, stats| {
            vec![Value::Null, stats_value(interp, stats)]
        })
    });

    define(interp, &fs, sandbox, "exists", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let callback = callback_arg(args, 1)?;
        let sandbox = sandbox.clone();
        let job_path = path.clone();
        dispatch(interp, callback, "access", path, move || Ok(ops::exists(&sandbox, &job_path)), |_interp, found| {
            vec![Value::Boolean(found)]
        })
    });

    // ----- sync -----

    define(interp, &fs, sandbox, "writeFileSync", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let data = data_arg(interp, args)?;
        ops::write_file(sandbox, &path, &data).map_err(|e| throw(interp, &e))?;
        Ok(Value::Undefined)
    });

    define(interp, &fs, sandbox, "appendFileSync", 2, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let data = data_arg(interp, args)?;
        ops::append_file(sandbox, &path, &data).map_err(|e| throw(interp, &e))?;
        Ok(Value::Undefined)
    });

    define(interp, &fs, sandbox, "readFileSync", 1, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let bytes = ops::read_file(sandbox, &path).map_err(|e| throw(interp, &e))?;
        Ok(text(bytes))
    });

    define(interp, &fs, sandbox, "readdirSync", 1, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let names = ops::readdir(sandbox, &path).map_err(|e| throw(interp, &e))?;
        Ok(names_value(interp, names))
    });

    define(interp, &fs, sandbox, "existsSync", 1, |_interp, args, sandbox| {
        Ok(Value::Boolean(match args.first() {
            Some(Value::String(path)) => ops::exists(sandbox, path),
            _ => false,
        }))
    });

    define(interp, &fs, sandbox, "mkdirSync", 1, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let recursive = recursive_option(interp, args)?;
        ops::mkdir(sandbox, &path, recursive).map_err(|e| throw(interp, &e))?;
        Ok(Value::Undefined)
    });

    define(interp, &fs, sandbox, "unlinkSync", 1, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        ops::unlink(sandbox, &path).map_err(|e| throw(interp, &e))?;
        Ok(Value::Undefined)
    });

    define(interp, &fs, sandbox, "rmdirSync", 1, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        ops::rmdir(sandbox, &path).map_err(|e| throw(interp, &e))?;
        Ok(Value::Undefined)
    });

    define(interp, &fs, sandbox, "renameSync", 2, |interp, args, sandbox| {
        let from = path_arg(args, 0, "oldPath")?;
        let to = path_arg(args, 1, "newPath")?;
        ops::rename(sandbox, &from, &to).map_err(|e| throw(interp, &e))?;
        Ok(Value::Undefined)
    });

    define(interp, &fs, sandbox, "statSync", 1, |interp, args, sandbox| {
        let path = path_arg(args, 0, "path")?;
        let stats = ops::stat(sandbox, &path).map_err(|e| throw(interp, &e))?;
        Ok(stats_value(interp, stats))
    });

    fs
}
