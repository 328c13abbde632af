//! Array constructor and Array.prototype methods

use crate::args::{arg, number_arg, relative_index};
use interpreter::{Exception, Interpreter, JsObject, ObjectKind, ScriptResult, Value, MAX_ARRAY_LENGTH};
use std::cmp::Ordering;

/// The receiver's array object and a snapshot of its elements.
fn this_array(this: &Value, method: &str) -> ScriptResult<(JsObject, Vec<Value>)> {
    if let Value::Object(object) = this {
        if let Some(elements) = object.array_elements() {
            return Ok((object.clone(), elements));
        }
    }
    Err(Exception::type_error(format!(
        "Array.prototype.{} called on non-array",
        method
    )))
}

/// Mutable access to the receiver's element storage.
fn with_elements<R>(object: &JsObject, f: impl FnOnce(&mut Vec<Value>) -> R) -> Option<R> {
    match &mut object.borrow_mut().kind {
        ObjectKind::Array(elements) => Some(f(elements)),
        _ => None,
    }
}

fn callback(args: &[Value], method: &str) -> ScriptResult<Value> {
    let callback = arg(args, 0);
    if !callback.is_callable() {
        return Err(Exception::type_error(format!(
            "{} is not a function (Array.prototype.{})",
            callback.type_of(),
            method
        )));
    }
    Ok(callback)
}

/// Joins elements the way Array.prototype.join does.
pub fn join(interp: &mut Interpreter, elements: &[Value], separator: &str) -> ScriptResult<String> {
    let mut parts = Vec::with_capacity(elements.len());
    for element in elements {
        parts.push(match element {
            Value::Undefined | Value::Null => String::new(),
            other => interp.to_js_string(other)?.to_string(),
        });
    }
    Ok(parts.join(separator))
}

/// Installs `Array` and the Array.prototype methods.
pub fn install(interp: &mut Interpreter) {
    let prototype = interp.intrinsics().array_prototype.clone();

    let constructor = interp.create_constructor("Array", 1, prototype.clone(), |interp, _this, args| {
        let elements = match args {
            [Value::Number(n)] => {
                if n.fract() != 0.0 || *n < 0.0 || *n > MAX_ARRAY_LENGTH as f64 {
                    return Err(Exception::range_error("Invalid array length"));
                }
                vec![Value::Undefined; *n as usize]
            }
            _ => args.to_vec(),
        };
        Ok(Value::Object(interp.create_array(elements)))
    });

    interp.define_method(&constructor, "isArray", 1, |_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Object(o) if o.is_array())))
    });

    interp.define_method(&constructor, "of", 0, |interp, _this, args| {
        Ok(Value::Object(interp.create_array(args.to_vec())))
    });

    interp.define_method(&constructor, "from", 1, |interp, _this, args| {
        let items = match arg(args, 0) {
            Value::Undefined | Value::Null => {
                return Err(Exception::type_error("undefined is not iterable"))
            }
            source => interp.iterate(&source)?,
        };
        let mapper = arg(args, 1);
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            out.push(if mapper.is_callable() {
                interp.call(&mapper, &Value::Undefined, &[item, Value::from(index)])?
            } else {
                item
            });
        }
        Ok(Value::Object(interp.create_array(out)))
    });

    interp.define_method(&prototype, "push", 1, |_interp, this, args| {
        let (object, _) = this_array(this, "push")?;
        let len = with_elements(&object, |elements| {
            if elements.len() + args.len() > MAX_ARRAY_LENGTH {
                return None;
            }
            elements.extend_from_slice(args);
            Some(elements.len())
        });
        match len {
            Some(None) => Err(Exception::range_error("Invalid array length")),
            len => Ok(Value::from(len.flatten().unwrap_or(0))),
        }
    });

    interp.define_method(&prototype, "pop", 0, |_interp, this, _args| {
        let (object, _) = this_array(this, "pop")?;
        Ok(with_elements(&object, |elements| elements.pop())
            .flatten()
            .unwrap_or_default())
    });

    interp.define_method(&prototype, "shift", 0, |_interp, this, _args| {
        let (object, _) = this_array(this, "shift")?;
        Ok(with_elements(&object, |elements| {
            if elements.is_empty() {
                Value::Undefined
            } else {
                elements.remove(0)
            }
        })
        .unwrap_or_default())
    });

    interp.define_method(&prototype, "unshift", 1, |_interp, this, args| {
        let (object, _) = this_array(this, "unshift")?;
        let len = with_elements(&object, |elements| {
            elements.splice(0..0, args.iter().cloned());
            elements.len()
        });
        Ok(Value::from(len.unwrap_or(0)))
    });

    interp.define_method(&prototype, "join", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "join")?;
        let separator = match arg(args, 0) {
            Value::Undefined => ",".to_string(),
            other => interp.to_js_string(&other)?.to_string(),
        };
        Ok(Value::from(join(interp, &elements, &separator)?))
    });

    interp.define_method(&prototype, "toString", 0, |interp, this, _args| {
        let (_, elements) = this_array(this, "toString")?;
        Ok(Value::from(join(interp, &elements, ",")?))
    });

    interp.define_method(&prototype, "indexOf", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "indexOf")?;
        let needle = arg(args, 0);
        let start = relative_index(number_arg(interp, args, 1)?, elements.len());
        let found = elements
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, e)| e.strict_equals(&needle))
            .map(|(i, _)| i as f64);
        Ok(Value::Number(found.unwrap_or(-1.0)))
    });

    interp.define_method(&prototype, "includes", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "includes")?;
        let needle = arg(args, 0);
        let start = relative_index(number_arg(interp, args, 1)?, elements.len());
        Ok(Value::Boolean(
            elements.iter().skip(start).any(|e| e.same_value_zero(&needle)),
        ))
    });

    interp.define_method(&prototype, "slice", 2, |interp, this, args| {
        let (_, elements) = this_array(this, "slice")?;
        let len = elements.len();
        let start = relative_index(number_arg(interp, args, 0)?, len);
        let end = match arg(args, 1) {
            Value::Undefined => len,
            other => relative_index(interp.to_number(&other)?, len),
        };
        let slice = elements.get(start..end.max(start)).unwrap_or_default().to_vec();
        Ok(Value::Object(interp.create_array(slice)))
    });

    interp.define_method(&prototype, "splice", 2, |interp, this, args| {
        let (object, elements) = this_array(this, "splice")?;
        let len = elements.len();
        let start = relative_index(number_arg(interp, args, 0)?, len);
        let delete_count = match args.get(1) {
            None => len - start,
            Some(count) => {
                let count = interpreter::to_integer(interp.to_number(count)?);
                (count.max(0.0) as usize).min(len - start)
            }
        };
        let inserted = args.get(2..).unwrap_or_default().to_vec();
        let removed = with_elements(&object, |elements| {
            elements
                .splice(start..start + delete_count, inserted)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
        Ok(Value::Object(interp.create_array(removed)))
    });

    interp.define_method(&prototype, "concat", 1, |interp, this, args| {
        let (_, mut elements) = this_array(this, "concat")?;
        for value in args {
            match value {
                Value::Object(object) if object.is_array() => {
                    elements.extend(object.array_elements().unwrap_or_default())
                }
                other => elements.push(other.clone()),
            }
        }
        Ok(Value::Object(interp.create_array(elements)))
    });

    interp.define_method(&prototype, "reverse", 0, |_interp, this, _args| {
        let (object, _) = this_array(this, "reverse")?;
        with_elements(&object, |elements| elements.reverse());
        Ok(this.clone())
    });

    interp.define_method(&prototype, "forEach", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "forEach")?;
        let callback = callback(args, "forEach")?;
        let this_arg = arg(args, 1);
        for (index, element) in elements.into_iter().enumerate() {
            interp.call(&callback, &this_arg, &[element, Value::from(index), this.clone()])?;
        }
        Ok(Value::Undefined)
    });

    interp.define_method(&prototype, "map", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "map")?;
        let callback = callback(args, "map")?;
        let this_arg = arg(args, 1);
        let mut out = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            out.push(interp.call(&callback, &this_arg, &[element, Value::from(index), this.clone()])?);
        }
        Ok(Value::Object(interp.create_array(out)))
    });

    interp.define_method(&prototype, "filter", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "filter")?;
        let callback = callback(args, "filter")?;
        let this_arg = arg(args, 1);
        let mut out = Vec::new();
        for (index, element) in elements.into_iter().enumerate() {
            let keep = interp.call(&callback, &this_arg, &[element.clone(), Value::from(index), this.clone()])?;
            if keep.is_truthy() {
                out.push(element);
            }
        }
        Ok(Value::Object(interp.create_array(out)))
    });

    interp.define_method(&prototype, "find", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "find")?;
        let callback = callback(args, "find")?;
        for (index, element) in elements.into_iter().enumerate() {
            let hit = interp.call(&callback, &arg(args, 1), &[element.clone(), Value::from(index), this.clone()])?;
            if hit.is_truthy() {
                return Ok(element);
            }
        }
        Ok(Value::Undefined)
    });

    interp.define_method(&prototype, "findIndex", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "findIndex")?;
        let callback = callback(args, "findIndex")?;
        for (index, element) in elements.into_iter().enumerate() {
            let hit = interp.call(&callback, &arg(args, 1), &[element, Value::from(index), this.clone()])?;
            if hit.is_truthy() {
                return Ok(Value::from(index));
            }
        }
        Ok(Value::from(-1))
    });

    interp.define_method(&prototype, "some", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "some")?;
        let callback = callback(args, "some")?;
        for (index, element) in elements.into_iter().enumerate() {
            if interp.call(&callback, &arg(args, 1), &[element, Value::from(index), this.clone()])?.is_truthy() {
                return Ok(Value::Boolean(true));
            }
        }
        Ok(Value::Boolean(false))
    });

    interp.define_method(&prototype, "every", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "every")?;
        let callback = callback(args, "every")?;
        for (index, element) in elements.into_iter().enumerate() {
            if !interp.call(&callback, &arg(args, 1), &[element, Value::from(index), this.clone()])?.is_truthy() {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    });

    interp.define_method(&prototype, "reduce", 1, |interp, this, args| {
        let (_, elements) = this_array(this, "reduce")?;
        let callback = callback(args, "reduce")?;
        let mut items = elements.into_iter().enumerate();
        let mut accumulator = match args.get(1) {
            Some(initial) => initial.clone(),
            None => match items.next() {
                Some((_, first)) => first,
                None => return Err(Exception::type_error("Reduce of empty array with no initial value")),
            },
        };
        for (index, element) in items {
            accumulator = interp.call(
                &callback,
                &Value::Undefined,
                &[accumulator, element, Value::from(index), this.clone()],
            )?;
        }
        Ok(accumulator)
    });

    interp.define_method(&prototype, "sort", 1, |interp, this, args| {
        let (object, elements) = this_array(this, "sort")?;
        let comparator = arg(args, 0);
        if !comparator.is_undefined() && !comparator.is_callable() {
            return Err(Exception::type_error(
                "The comparison function must be either a function or undefined",
            ));
        }
        let sorted = merge_sort(interp, elements, &comparator)?;
        with_elements(&object, |elements| *elements = sorted);
        Ok(this.clone())
    });

    interp.global().define_value(
        "Array",
        Value::Object(constructor),
        interpreter::PropertyAttributes::DONT_ENUM,
    );
}

/// Stable sort whose comparator may run script and fail.
fn merge_sort(interp: &mut Interpreter, mut items: Vec<Value>, comparator: &Value) -> ScriptResult<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(interp, items, comparator)?;
    let right = merge_sort(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        if compare_elements(interp, a, b, comparator)? == Ordering::Greater {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn compare_elements(interp: &mut Interpreter, a: &Value, b: &Value, comparator: &Value) -> ScriptResult<Ordering> {
    // undefined always sorts last
    match (a.is_undefined(), b.is_undefined()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Greater),
        (false, true) => return Ok(Ordering::Less),
        _ => {}
    }
    if comparator.is_callable() {
        let result = interp.call(comparator, &Value::Undefined, &[a.clone(), b.clone()])?;
        let n = interp.to_number(&result)?;
        return Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal));
    }
    let a = interp.to_js_string(a)?;
    let b = interp.to_js_string(b)?;
    Ok(a.cmp(&b))
}
