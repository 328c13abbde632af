//! Property access, type conversions and operators that may call into script.

use crate::exception::{Exception, ScriptResult};
use crate::interpreter::Interpreter;
use crate::object::{array_index, JsObject, PropertyAttributes, PropertySlot, MAX_ARRAY_LENGTH};
use crate::value::{number_to_string, Value};
use parser::ast::BinaryOperator;
use std::cmp::Ordering;
use std::rc::Rc;

/// Conversion hint for ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    /// No preference (`+`, `==`)
    Default,
    /// Numeric context
    Number,
    /// String context
    String,
}

impl Interpreter {
    // ----- property access -----

    /// `base[key]`, running getters and boxing primitives.
    pub fn get_property(&mut self, base: &Value, key: &str) -> ScriptResult<Value> {
        let holder = match base {
            Value::Undefined | Value::Null => {
                return Err(Exception::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    self.display_string(base),
                    key
                )))
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::from(s.chars().count()));
                }
                if let Some(index) = array_index(key) {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map(|c| Value::from(c.to_string()))
                        .unwrap_or_default());
                }
                self.intrinsics().string_prototype.clone()
            }
            Value::Number(_) => self.intrinsics().number_prototype.clone(),
            Value::Boolean(_) => self.intrinsics().boolean_prototype.clone(),
            Value::Object(object) => object.clone(),
        };
        self.get_with_receiver(&holder, key, base)
    }

    /// Reads `key` from `object`, calling getters with `receiver` as `this`.
    pub fn get_with_receiver(&mut self, object: &JsObject, key: &str, receiver: &Value) -> ScriptResult<Value> {
        match object.find_property(key).map(|p| p.slot) {
            Some(PropertySlot::Data(value)) => Ok(value),
            Some(PropertySlot::Accessor { get: Some(getter), .. }) => {
                self.call_object(&getter, receiver, &[])
            }
            _ => Ok(Value::Undefined),
        }
    }

    /// `base[key] = value`.
    ///
    /// Writes to read-only properties and to accessors without a setter are
    /// silently ignored.
    pub fn set_property(&mut self, base: &Value, key: &str, value: Value) -> ScriptResult<()> {
        let object = match base {
            Value::Undefined | Value::Null => {
                return Err(Exception::type_error(format!(
                    "Cannot set properties of {} (setting '{}')",
                    self.display_string(base),
                    key
                )))
            }
            Value::Object(object) => object,
            _ => return Ok(()),
        };

        if object.is_array() {
            check_array_write(key, &value)?;
        }
        if object.write_own_data(key, value.clone()).is_some() {
            return Ok(());
        }
        match object.find_property(key) {
            Some(property) => match property.slot {
                PropertySlot::Accessor { set: Some(setter), .. } => {
                    self.call_object(&setter, base, &[value]).map(|_| ())
                }
                PropertySlot::Accessor { set: None, .. } => Ok(()),
                PropertySlot::Data(_) if property.attributes.contains(PropertyAttributes::READ_ONLY) => Ok(()),
                PropertySlot::Data(_) => {
                    self.add_property(object, key, value);
                    Ok(())
                }
            },
            None => {
                self.add_property(object, key, value);
                Ok(())
            }
        }
    }

    fn add_property(&self, object: &JsObject, key: &str, value: Value) {
        if object.borrow().extensible {
            object.define_value(key, value, PropertyAttributes::empty());
        }
    }

    // ----- conversions -----

    /// ToPrimitive.
    pub fn to_primitive(&mut self, value: &Value, hint: PreferredType) -> ScriptResult<Value> {
        let object = match value {
            Value::Object(object) => object.clone(),
            primitive => return Ok(primitive.clone()),
        };
        let order = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        let mut found_method = false;
        for name in order {
            let method = self.get_with_receiver(&object, name, value)?;
            if method.is_callable() {
                found_method = true;
                let result = self.call(&method, value, &[])?;
                if !matches!(result, Value::Object(_)) {
                    return Ok(result);
                }
            }
        }
        if found_method {
            Err(Exception::type_error("Cannot convert object to primitive value"))
        } else {
            // Bare realm without Object.prototype methods.
            Ok(Value::from(self.display_string(value)))
        }
    }

    /// ToString.
    pub fn to_js_string(&mut self, value: &Value) -> ScriptResult<Rc<str>> {
        if let Some(s) = value.primitive_to_string() {
            return Ok(s);
        }
        let primitive = self.to_primitive(value, PreferredType::String)?;
        Ok(primitive
            .primitive_to_string()
            .unwrap_or_else(|| Rc::from("")))
    }

    /// ToNumber.
    pub fn to_number(&mut self, value: &Value) -> ScriptResult<f64> {
        if let Some(n) = value.primitive_to_number() {
            return Ok(n);
        }
        let primitive = self.to_primitive(value, PreferredType::Number)?;
        Ok(primitive.primitive_to_number().unwrap_or(f64::NAN))
    }

    /// ToPropertyKey.
    pub fn to_property_key(&mut self, value: &Value) -> ScriptResult<String> {
        match value {
            Value::Number(n) => Ok(number_to_string(*n)),
            Value::String(s) => Ok(s.to_string()),
            other => Ok(self.to_js_string(other)?.to_string()),
        }
    }

    // ----- operators -----

    /// Applies a binary operator to evaluated operands.
    pub fn binary_operation(&mut self, operator: BinaryOperator, left: &Value, right: &Value) -> ScriptResult<Value> {
        let result = match operator {
            BinaryOperator::Add => return self.add(left, right),
            BinaryOperator::Sub => Value::Number(self.to_number(left)? - self.to_number(right)?),
            BinaryOperator::Mul => Value::Number(self.to_number(left)? * self.to_number(right)?),
            BinaryOperator::Div => Value::Number(self.to_number(left)? / self.to_number(right)?),
            BinaryOperator::Mod => Value::Number(self.to_number(left)? % self.to_number(right)?),
            BinaryOperator::Eq => Value::Boolean(self.loose_equals(left, right)?),
            BinaryOperator::NotEq => Value::Boolean(!self.loose_equals(left, right)?),
            BinaryOperator::StrictEq => Value::Boolean(left.strict_equals(right)),
            BinaryOperator::StrictNotEq => Value::Boolean(!left.strict_equals(right)),
            BinaryOperator::Lt => Value::Boolean(self.compare(left, right)? == Some(Ordering::Less)),
            BinaryOperator::Gt => Value::Boolean(self.compare(left, right)? == Some(Ordering::Greater)),
            BinaryOperator::LtEq => Value::Boolean(matches!(
                self.compare(left, right)?,
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOperator::GtEq => Value::Boolean(matches!(
                self.compare(left, right)?,
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOperator::InstanceOf => Value::Boolean(self.instance_of(left, right)?),
            BinaryOperator::In => {
                let object = match right {
                    Value::Object(object) => object.clone(),
                    other => {
                        let key = self.display_string(left);
                        return Err(Exception::type_error(format!(
                            "Cannot use 'in' operator to search for '{}' in {}",
                            key,
                            self.display_string(other)
                        )));
                    }
                };
                let key = self.to_property_key(left)?;
                Value::Boolean(object.has_property(&key))
            }
        };
        Ok(result)
    }

    fn add(&mut self, left: &Value, right: &Value) -> ScriptResult<Value> {
        let left = self.to_primitive(left, PreferredType::Default)?;
        let right = self.to_primitive(right, PreferredType::Default)?;
        if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
            let mut out = self.to_js_string(&left)?.to_string();
            out.push_str(&self.to_js_string(&right)?);
            return Ok(Value::from(out));
        }
        Ok(Value::Number(self.to_number(&left)? + self.to_number(&right)?))
    }

    /// The `==` operator.
    pub fn loose_equals(&mut self, left: &Value, right: &Value) -> ScriptResult<bool> {
        Ok(match (left, right) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number(left)? == self.to_number(right)?
            }
            (Value::Boolean(b), _) => {
                let n = Value::Number(if *b { 1.0 } else { 0.0 });
                return self.loose_equals(&n, right);
            }
            (_, Value::Boolean(b)) => {
                let n = Value::Number(if *b { 1.0 } else { 0.0 });
                return self.loose_equals(left, &n);
            }
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Object(_), _) => {
                let primitive = self.to_primitive(left, PreferredType::Default)?;
                return self.loose_equals(&primitive, right);
            }
            (_, Value::Object(_)) => {
                let primitive = self.to_primitive(right, PreferredType::Default)?;
                return self.loose_equals(left, &primitive);
            }
            _ => left.strict_equals(right),
        })
    }

    /// Abstract relational comparison; `None` when either side is NaN.
    fn compare(&mut self, left: &Value, right: &Value) -> ScriptResult<Option<Ordering>> {
        let left = self.to_primitive(left, PreferredType::Number)?;
        let right = self.to_primitive(right, PreferredType::Number)?;
        if let (Value::String(a), Value::String(b)) = (&left, &right) {
            return Ok(Some(a.cmp(b)));
        }
        let a = self.to_number(&left)?;
        let b = self.to_number(&right)?;
        Ok(a.partial_cmp(&b))
    }

    /// The `instanceof` operator.
    pub fn instance_of(&mut self, value: &Value, constructor: &Value) -> ScriptResult<bool> {
        if !constructor.is_callable() {
            return Err(Exception::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        let object = match value {
            Value::Object(object) => object.clone(),
            _ => return Ok(false),
        };
        let prototype = match self.get_property(constructor, "prototype")? {
            Value::Object(prototype) => prototype,
            _ => {
                return Err(Exception::type_error(
                    "Function has non-object prototype in instanceof check",
                ))
            }
        };
        let mut current = object.prototype();
        while let Some(p) = current {
            if p.ptr_eq(&prototype) {
                return Ok(true);
            }
            current = p.prototype();
        }
        Ok(false)
    }
}

/// Rejects writes that would grow an array past [`MAX_ARRAY_LENGTH`].
fn check_array_write(key: &str, value: &Value) -> ScriptResult<()> {
    let valid = match array_index(key) {
        Some(index) => index < MAX_ARRAY_LENGTH,
        None if key == "length" => match value.as_number() {
            Some(n) => n.fract() == 0.0 && (0.0..=MAX_ARRAY_LENGTH as f64).contains(&n),
            None => true,
        },
        None => true,
    };
    if valid {
        Ok(())
    } else {
        Err(Exception::range_error("Invalid array length"))
    }
}
