//! Argument and receiver helpers shared by the native functions.

use interpreter::{Exception, Interpreter, JsObject, ScriptResult, Value};

/// The argument at `index`, or `undefined`.
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// The argument at `index` converted with ToNumber.
pub(crate) fn number_arg(interp: &mut Interpreter, args: &[Value], index: usize) -> ScriptResult<f64> {
    interp.to_number(&arg(args, index))
}

/// The argument at `index` converted with ToString.
pub(crate) fn string_arg(interp: &mut Interpreter, args: &[Value], index: usize) -> ScriptResult<String> {
    Ok(interp.to_js_string(&arg(args, index))?.to_string())
}

/// The receiver as an object, or a TypeError naming `method`.
pub(crate) fn this_object(this: &Value, method: &str) -> ScriptResult<JsObject> {
    match this {
        Value::Object(object) => Ok(object.clone()),
        _ => Err(Exception::type_error(format!(
            "{} called on non-object",
            method
        ))),
    }
}

/// Resolves a relative index (`slice`, `substring`) against `len`.
pub(crate) fn relative_index(n: f64, len: usize) -> usize {
    let n = interpreter::to_integer(n);
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}
