//! Function.prototype methods

use crate::args::arg;
use interpreter::{Exception, Interpreter, Value};

/// Installs `call`, `apply`, `bind` and `toString` on Function.prototype.
pub fn install(interp: &mut Interpreter) {
    let prototype = interp.intrinsics().function_prototype.clone();

    interp.define_method(&prototype, "call", 1, |interp, this, args| {
        let receiver = arg(args, 0);
        let rest = args.get(1..).unwrap_or_default();
        interp.call(this, &receiver, rest)
    });

    interp.define_method(&prototype, "apply", 2, |interp, this, args| {
        let receiver = arg(args, 0);
        let list = match arg(args, 1) {
            Value::Undefined | Value::Null => Vec::new(),
            Value::Object(object) => match object.array_elements() {
                Some(elements) => elements,
                None => return Err(Exception::type_error("CreateListFromArrayLike called on non-array")),
            },
            _ => return Err(Exception::type_error("CreateListFromArrayLike called on non-object")),
        };
        interp.call(this, &receiver, &list)
    });

    interp.define_method(&prototype, "bind", 1, |interp, this, args| {
        let target = match this {
            Value::Object(object) if object.is_callable() => object.clone(),
            _ => return Err(Exception::type_error("Bind must be called on a function")),
        };
        let bound = interp.create_bound_function(
            target,
            arg(args, 0),
            args.get(1..).unwrap_or_default().to_vec(),
        );
        Ok(Value::Object(bound))
    });

    interp.define_method(&prototype, "toString", 0, |interp, this, _args| {
        let object = match this {
            Value::Object(object) if object.is_callable() => object.clone(),
            _ => return Err(Exception::type_error("Function.prototype.toString requires that 'this' be a Function")),
        };
        let name = interp.display_string(&interp.read_data(&object, "name"));
        Ok(Value::from(format!("function {}() {{ [native code] }}", name)))
    });
}
