//! JSON object backed by serde_json
//!
//! `serde_json` is built with `preserve_order` so objects keep their
//! property order in both directions.

use crate::args::{arg, string_arg};
use interpreter::{Exception, Interpreter, JsObject, PropertyAttributes, ScriptResult, Value};
use serde_json::{Map, Number};

/// Converts a parsed JSON document into script values.
pub fn json_to_value(interp: &mut Interpreter, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            let elements = items.iter().map(|item| json_to_value(interp, item)).collect();
            Value::Object(interp.create_array(elements))
        }
        serde_json::Value::Object(map) => {
            let object = interp.create_object();
            for (key, item) in map {
                let value = json_to_value(interp, item);
                object.set_value(key, value);
            }
            Value::Object(object)
        }
    }
}

/// Converts a script value into JSON.
///
/// Returns `None` for values JSON.stringify omits (`undefined`, functions).
pub fn value_to_json(interp: &mut Interpreter, value: &Value) -> ScriptResult<Option<serde_json::Value>> {
    let mut stack = Vec::new();
    serialize(interp, value, &mut stack)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    // Integral values print without a trailing ".0".
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn serialize(interp: &mut Interpreter, value: &Value, stack: &mut Vec<JsObject>) -> ScriptResult<Option<serde_json::Value>> {
    let mut value = value.clone();
    if let Value::Object(_) = &value {
        let to_json = interp.get_property(&value, "toJSON")?;
        if to_json.is_callable() {
            value = interp.call(&to_json, &value, &[])?;
        }
    }

    let object = match &value {
        Value::Undefined => return Ok(None),
        Value::Null => return Ok(Some(serde_json::Value::Null)),
        Value::Boolean(b) => return Ok(Some(serde_json::Value::Bool(*b))),
        Value::Number(n) => return Ok(Some(number_to_json(*n))),
        Value::String(s) => return Ok(Some(serde_json::Value::String(s.to_string()))),
        Value::Object(object) if object.is_callable() => return Ok(None),
        Value::Object(object) => object.clone(),
    };

    if stack.iter().any(|o| o.ptr_eq(&object)) {
        return Err(Exception::type_error("Converting circular structure to JSON"));
    }
    stack.push(object.clone());

    let result = if let Some(elements) = object.array_elements() {
        let mut items = Vec::with_capacity(elements.len());
        for element in &elements {
            items.push(serialize(interp, element, stack)?.unwrap_or(serde_json::Value::Null));
        }
        serde_json::Value::Array(items)
    } else {
        let mut map = Map::new();
        for key in object.enumerable_own_keys() {
            let item = interp.get_property(&value, &key)?;
            if let Some(json) = serialize(interp, &item, stack)? {
                map.insert(key, json);
            }
        }
        serde_json::Value::Object(map)
    };

    stack.pop();
    Ok(Some(result))
}

fn stringify(json: &serde_json::Value, indent: &str) -> String {
    if indent.is_empty() {
        return json.to_string();
    }
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    match serde::Serialize::serialize(json, &mut serializer) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => json.to_string(),
    }
}

/// Installs the `JSON` object.
pub fn install(interp: &mut Interpreter) {
    let json = interp.create_object();

    interp.define_method(&json, "parse", 2, |interp, _this, args| {
        let text = string_arg(interp, args, 0)?;
        let parsed: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            Exception::Error(core_types::JsError::syntax_error(
                format!("Unexpected token in JSON: {}", e),
                None,
            ))
        })?;
        Ok(json_to_value(interp, &parsed))
    });

    interp.define_method(&json, "stringify", 3, |interp, _this, args| {
        let indent = match arg(args, 2) {
            Value::Number(n) => " ".repeat(n.clamp(0.0, 10.0) as usize),
            Value::String(s) => s.chars().take(10).collect(),
            _ => String::new(),
        };
        Ok(match value_to_json(interp, &arg(args, 0))? {
            Some(json) => Value::from(stringify(&json, &indent)),
            None => Value::Undefined,
        })
    });

    interp
        .global()
        .define_value("JSON", Value::Object(json), PropertyAttributes::DONT_ENUM);
}
