//! Error constructors and Error.prototype.toString

use crate::args::arg;
use interpreter::{Interpreter, PropertyAttributes, Value, ERROR_KINDS};

/// Installs `Error`, `TypeError`, `RangeError`, `SyntaxError` and
/// `ReferenceError`.
///
/// Every constructor creates a real error object with the script stack
/// captured at the call site, with or without `new`.
pub fn install(interp: &mut Interpreter) {
    for kind in ERROR_KINDS {
        let prototype = interp.intrinsics().error_prototype(kind);
        let constructor = interp.create_constructor(kind.name(), 1, prototype, move |interp, _this, args| {
            let message = match arg(args, 0) {
                Value::Undefined => String::new(),
                other => interp.to_js_string(&other)?.to_string(),
            };
            let error = interp.create_error(kind, &message);
            if let Value::Object(options) = arg(args, 1) {
                if options.has_property("cause") {
                    let cause = interp.get_property(&Value::Object(options), "cause")?;
                    error.define_value("cause", cause, PropertyAttributes::DONT_ENUM);
                }
            }
            Ok(Value::Object(error))
        });
        interp
            .global()
            .define_value(kind.name(), Value::Object(constructor), PropertyAttributes::DONT_ENUM);
    }

    let base = interp.intrinsics().error_prototype(core_types::ErrorKind::Error);
    interp.define_method(&base, "toString", 0, |interp, this, _args| {
        let name = match interp.get_property(this, "name")? {
            Value::Undefined => "Error".to_string(),
            other => interp.to_js_string(&other)?.to_string(),
        };
        let message = match interp.get_property(this, "message")? {
            Value::Undefined => String::new(),
            other => interp.to_js_string(&other)?.to_string(),
        };
        Ok(Value::from(match (name.is_empty(), message.is_empty()) {
            (true, _) => message,
            (false, true) => name,
            (false, false) => format!("{}: {}", name, message),
        }))
    });
}
