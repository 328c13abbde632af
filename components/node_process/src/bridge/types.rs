//! Native values and their conversions to and from script values.

use interpreter::{Exception, Interpreter, ScriptResult, Value};
use std::fmt;

/// Declared type of a bridged property, parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit signed integer
    Integer,
    /// IEEE double
    Double,
    /// Boolean
    Boolean,
    /// UTF-8 string, nullable
    String,
    /// Any primitive, nullable
    Any,
}

impl ValueType {
    /// Returns true if `null` and `undefined` are valid values.
    pub fn is_nullable(self) -> bool {
        matches!(self, ValueType::String | ValueType::Any)
    }

    /// The value a cell holds before anything writes it.
    pub fn default_value(self) -> NativeValue {
        match self {
            ValueType::Integer => NativeValue::Integer(0),
            ValueType::Double => NativeValue::Double(0.0),
            ValueType::Boolean => NativeValue::Boolean(false),
            ValueType::String => NativeValue::Null,
            ValueType::Any => NativeValue::Undefined,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ValueType::Integer => "Integer",
            ValueType::Double => "Double",
            ValueType::Boolean => "Boolean",
            ValueType::String => "String",
            ValueType::Any => "Any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A primitive value owned by native code.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Double(f64),
    String(String),
}

impl NativeValue {
    /// Converts to `ty` without loss, or returns `None`.
    ///
    /// Integers widen to doubles; doubles narrow to integers only when
    /// integral and in range.
    pub fn conform(self, ty: ValueType) -> Option<NativeValue> {
        match (ty, self) {
            (ValueType::Any, value) => Some(value),
            (ValueType::Integer, NativeValue::Integer(n)) => Some(NativeValue::Integer(n)),
            (ValueType::Integer, NativeValue::Double(d)) => double_to_i32(d).map(NativeValue::Integer),
            (ValueType::Double, NativeValue::Double(d)) => Some(NativeValue::Double(d)),
            (ValueType::Double, NativeValue::Integer(n)) => Some(NativeValue::Double(f64::from(n))),
            (ValueType::Boolean, NativeValue::Boolean(b)) => Some(NativeValue::Boolean(b)),
            (ValueType::String, NativeValue::String(s)) => Some(NativeValue::String(s)),
            (ValueType::String, NativeValue::Null | NativeValue::Undefined) => Some(NativeValue::Null),
            _ => None,
        }
    }

    /// The script value for this native value.
    pub fn to_script(&self) -> Value {
        match self {
            NativeValue::Undefined => Value::Undefined,
            NativeValue::Null => Value::Null,
            NativeValue::Boolean(b) => Value::Boolean(*b),
            NativeValue::Integer(n) => Value::from(*n),
            NativeValue::Double(d) => Value::Number(*d),
            NativeValue::String(s) => Value::from(s.as_str()),
        }
    }
}

fn double_to_i32(d: f64) -> Option<i32> {
    if d.fract() == 0.0 && d >= f64::from(i32::MIN) && d <= f64::from(i32::MAX) {
        Some(d as i32)
    } else {
        None
    }
}

/// Rust types that can back a bridged property.
pub trait BridgeType: Sized {
    /// The declared type of a property holding `Self`.
    const VALUE_TYPE: ValueType;

    /// Wraps the value.
    fn into_native(self) -> NativeValue;

    /// Unwraps a value of the matching type; `None` for null or a mismatch.
    fn from_native(value: &NativeValue) -> Option<Self>;
}

impl BridgeType for i32 {
    const VALUE_TYPE: ValueType = ValueType::Integer;

    fn into_native(self) -> NativeValue {
        NativeValue::Integer(self)
    }

    fn from_native(value: &NativeValue) -> Option<Self> {
        match value {
            NativeValue::Integer(n) => Some(*n),
            NativeValue::Double(d) => double_to_i32(*d),
            _ => None,
        }
    }
}

impl BridgeType for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;

    fn into_native(self) -> NativeValue {
        NativeValue::Double(self)
    }

    fn from_native(value: &NativeValue) -> Option<Self> {
        match value {
            NativeValue::Double(d) => Some(*d),
            NativeValue::Integer(n) => Some(f64::from(*n)),
            _ => None,
        }
    }
}

impl BridgeType for bool {
    const VALUE_TYPE: ValueType = ValueType::Boolean;

    fn into_native(self) -> NativeValue {
        NativeValue::Boolean(self)
    }

    fn from_native(value: &NativeValue) -> Option<Self> {
        match value {
            NativeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl BridgeType for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn into_native(self) -> NativeValue {
        NativeValue::String(self)
    }

    fn from_native(value: &NativeValue) -> Option<Self> {
        match value {
            NativeValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Coerces a script value to `ty`, throwing a `TypeError` when it cannot be
/// represented.
///
/// `what` names the target in the error message.
pub(crate) fn coerce(interp: &mut Interpreter, value: &Value, ty: ValueType, what: &str) -> ScriptResult<NativeValue> {
    if value.is_nullish() && ty.is_nullable() {
        return Ok(match value {
            Value::Null => NativeValue::Null,
            _ if ty == ValueType::String => NativeValue::Null,
            _ => NativeValue::Undefined,
        });
    }
    match ty {
        ValueType::Integer => {
            let n = interp.to_number(value)?;
            if !n.is_finite() || n.trunc() < f64::from(i32::MIN) || n.trunc() > f64::from(i32::MAX) {
                return Err(Exception::type_error(format!(
                    "{} expects an Integer, got {}",
                    what,
                    interp.display_string(value)
                )));
            }
            Ok(NativeValue::Integer(n.trunc() as i32))
        }
        ValueType::Double => Ok(NativeValue::Double(interp.to_number(value)?)),
        ValueType::Boolean => Ok(NativeValue::Boolean(value.is_truthy())),
        ValueType::String => Ok(NativeValue::String(interp.to_js_string(value)?.to_string())),
        ValueType::Any => match value {
            Value::Boolean(b) => Ok(NativeValue::Boolean(*b)),
            Value::Number(n) => Ok(NativeValue::Double(*n)),
            Value::String(s) => Ok(NativeValue::String(s.to_string())),
            _ => Err(Exception::type_error(format!(
                "{} expects a primitive, got {}",
                what,
                interp.display_string(value)
            ))),
        },
    }
}
