//! Node-style value inspection for console output.
//!
//! Inspection only reads data properties; it never runs getters or other
//! script code.

use interpreter::{array_index, number_to_string, Interpreter, JsObject, PropertySlot, Value};

/// Nesting below this depth prints as `[Object]` / `[Array]`.
const MAX_DEPTH: usize = 2;
/// Single-line output longer than this is broken across lines.
const BREAK_LENGTH: usize = 72;
/// Array elements shown before "... n more items".
const MAX_ARRAY_ITEMS: usize = 100;

/// Formats a value the way `util.inspect` does: strings quoted, objects and
/// arrays expanded to a limited depth.
///
/// # Examples
///
/// ```
/// use interpreter::Interpreter;
///
/// let mut interp = Interpreter::new();
/// let value = interp.evaluate("({ a: 1, list: ['x', null] })").unwrap();
/// assert_eq!(builtins::inspect(&interp, &value), "{ a: 1, list: [ 'x', null ] }");
/// ```
pub fn inspect(interp: &Interpreter, value: &Value) -> String {
    let mut seen = Vec::new();
    format_value(interp, value, 0, &mut seen)
}

fn format_value(interp: &Interpreter, value: &Value, depth: usize, seen: &mut Vec<JsObject>) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Number(n) if *n == 0.0 && n.is_sign_negative() => "-0".to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::Object(object) => format_object(interp, object, depth, seen),
        other => interp.display_string(other),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if identifier {
        key.to_string()
    } else {
        quote(key)
    }
}

fn error_string(interp: &Interpreter, object: &JsObject) -> String {
    match interp.read_data(object, "stack") {
        Value::String(stack) => stack.to_string(),
        _ => interp.display_string(&Value::Object(object.clone())),
    }
}

/// "Foo " for instances of script constructors other than Object.
fn constructor_prefix(interp: &Interpreter, object: &JsObject) -> String {
    let prototype = match object.prototype() {
        Some(prototype) => prototype,
        None => return "[Object: null prototype] ".to_string(),
    };
    let intrinsics = interp.intrinsics();
    if prototype.ptr_eq(&intrinsics.object_prototype) || prototype.ptr_eq(&intrinsics.array_prototype) {
        return String::new();
    }
    match interp.read_data(&prototype, "constructor") {
        Value::Object(constructor) => match interp.read_data(&constructor, "name") {
            Value::String(name) if !name.is_empty() => format!("{} ", name),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn format_object(interp: &Interpreter, object: &JsObject, depth: usize, seen: &mut Vec<JsObject>) -> String {
    if object.is_error() {
        return error_string(interp, object);
    }
    if object.is_callable() {
        return match interp.read_data(object, "name") {
            Value::String(name) if !name.is_empty() => format!("[Function: {}]", name),
            _ => "[Function (anonymous)]".to_string(),
        };
    }
    if seen.iter().any(|o| o.ptr_eq(object)) {
        return "[Circular *1]".to_string();
    }
    let elements = object.array_elements();
    if depth > MAX_DEPTH {
        return if elements.is_some() { "[Array]" } else { "[Object]" }.to_string();
    }

    seen.push(object.clone());
    let mut entries = Vec::new();
    if let Some(elements) = &elements {
        for element in elements.iter().take(MAX_ARRAY_ITEMS) {
            entries.push(format_value(interp, element, depth + 1, seen));
        }
        if elements.len() > MAX_ARRAY_ITEMS {
            entries.push(format!("... {} more items", elements.len() - MAX_ARRAY_ITEMS));
        }
    }
    for key in object.enumerable_own_keys() {
        if elements.is_some() && array_index(&key).is_some() {
            continue;
        }
        let rendered = match object.get_own_property(&key).map(|p| p.slot) {
            Some(PropertySlot::Data(value)) => format_value(interp, &value, depth + 1, seen),
            Some(PropertySlot::Accessor { get, set }) => match (get.is_some(), set.is_some()) {
                (true, true) => "[Getter/Setter]".to_string(),
                (true, false) => "[Getter]".to_string(),
                _ => "[Setter]".to_string(),
            },
            None => continue,
        };
        entries.push(format!("{}: {}", format_key(&key), rendered));
    }
    seen.pop();

    let prefix = constructor_prefix(interp, object);
    let (open, close) = if elements.is_some() { ("[", "]") } else { ("{", "}") };
    if entries.is_empty() {
        return format!("{}{}{}", prefix, open, close);
    }
    let single = format!("{}{} {} {}", prefix, open, entries.join(", "), close);
    if single.len() <= BREAK_LENGTH && !single.contains('\n') {
        return single;
    }
    let indent = "  ".repeat(depth + 1);
    format!(
        "{}{}\n{}{}\n{}{}",
        prefix,
        open,
        indent,
        entries.join(&format!(",\n{}", indent)),
        "  ".repeat(depth),
        close
    )
}
