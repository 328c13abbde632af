//! Object constructor and Object.prototype methods

use crate::args::{arg, this_object};
use interpreter::{Exception, Interpreter, ObjectKind, Value};

/// Installs `Object` and the Object.prototype methods.
pub fn install(interp: &mut Interpreter) {
    let prototype = interp.intrinsics().object_prototype.clone();

    let constructor = interp.create_constructor("Object", 1, prototype.clone(), |interp, _this, args| {
        Ok(match arg(args, 0) {
            object @ Value::Object(_) => object,
            _ => Value::Object(interp.create_object()),
        })
    });

    interp.define_method(&constructor, "keys", 1, |interp, _this, args| {
        let object = this_object(&arg(args, 0), "Object.keys")?;
        let keys = object
            .enumerable_own_keys()
            .into_iter()
            .map(Value::from)
            .collect();
        Ok(Value::Object(interp.create_array(keys)))
    });

    interp.define_method(&constructor, "values", 1, |interp, _this, args| {
        let target = arg(args, 0);
        let object = this_object(&target, "Object.values")?;
        let mut values = Vec::new();
        for key in object.enumerable_own_keys() {
            values.push(interp.get_property(&target, &key)?);
        }
        Ok(Value::Object(interp.create_array(values)))
    });

    interp.define_method(&constructor, "entries", 1, |interp, _this, args| {
        let target = arg(args, 0);
        let object = this_object(&target, "Object.entries")?;
        let mut entries = Vec::new();
        for key in object.enumerable_own_keys() {
            let value = interp.get_property(&target, &key)?;
            let pair = interp.create_array(vec![Value::from(key), value]);
            entries.push(Value::Object(pair));
        }
        Ok(Value::Object(interp.create_array(entries)))
    });

    interp.define_method(&constructor, "assign", 2, |interp, _this, args| {
        let target = arg(args, 0);
        this_object(&target, "Object.assign")?;
        for source in args.iter().skip(1) {
            if let Value::Object(object) = source {
                for key in object.enumerable_own_keys() {
                    let value = interp.get_property(source, &key)?;
                    interp.set_property(&target, &key, value)?;
                }
            }
        }
        Ok(target)
    });

    interp.define_method(&constructor, "create", 1, |interp, _this, args| {
        let prototype = match arg(args, 0) {
            Value::Object(object) => Some(object),
            Value::Null => None,
            _ => return Err(Exception::type_error("Object prototype may only be an Object or null")),
        };
        Ok(Value::Object(interp.create_object_with_prototype(prototype)))
    });

    interp.define_method(&constructor, "getPrototypeOf", 1, |_interp, _this, args| {
        let object = this_object(&arg(args, 0), "Object.getPrototypeOf")?;
        Ok(object.prototype().map(Value::Object).unwrap_or(Value::Null))
    });

    interp.define_method(&prototype, "hasOwnProperty", 1, |interp, this, args| {
        let key = interp.to_property_key(&arg(args, 0))?;
        Ok(Value::Boolean(match this {
            Value::Object(object) => object.has_own_property(&key),
            Value::String(s) => key == "length" || interpreter::array_index(&key).is_some_and(|i| i < s.chars().count()),
            _ => false,
        }))
    });

    interp.define_method(&prototype, "propertyIsEnumerable", 1, |interp, this, args| {
        let key = interp.to_property_key(&arg(args, 0))?;
        Ok(Value::Boolean(match this {
            Value::Object(object) => object
                .get_own_property(&key)
                .is_some_and(|p| p.is_enumerable()),
            _ => false,
        }))
    });

    interp.define_method(&prototype, "toString", 0, |_interp, this, _args| {
        Ok(Value::from(format!("[object {}]", class_of(this))))
    });

    interp.define_method(&prototype, "valueOf", 0, |_interp, this, _args| Ok(this.clone()));

    interp.global().define_value(
        "Object",
        Value::Object(constructor),
        interpreter::PropertyAttributes::DONT_ENUM,
    );
}

/// The tag used by Object.prototype.toString.
pub fn class_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Boolean(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Object(object) => match &object.borrow().kind {
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error(_) => "Error",
            ObjectKind::Ordinary => "Object",
        },
    }
}
