//! String constructor and String.prototype methods
//!
//! Indices count Unicode scalar values, matching `length`.

use crate::args::{arg, number_arg, relative_index, string_arg};
use interpreter::{Exception, Interpreter, PropertyAttributes, ScriptResult, Value};

fn this_string(interp: &mut Interpreter, this: &Value, method: &str) -> ScriptResult<String> {
    match this {
        Value::String(s) => Ok(s.to_string()),
        Value::Undefined | Value::Null => Err(Exception::type_error(format!(
            "String.prototype.{} called on null or undefined",
            method
        ))),
        other => Ok(interp.to_js_string(other)?.to_string()),
    }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Character index of the first occurrence of `needle` at or after `from`.
fn char_index_of(s: &str, needle: &str, from: usize) -> Option<usize> {
    let byte_start = s.char_indices().nth(from).map(|(i, _)| i).unwrap_or(s.len());
    if from > s.chars().count() {
        return None;
    }
    s[byte_start..]
        .find(needle)
        .map(|offset| s[..byte_start + offset].chars().count())
}

/// Installs `String` and the String.prototype methods.
pub fn install(interp: &mut Interpreter) {
    let prototype = interp.intrinsics().string_prototype.clone();

    let constructor = interp.create_function("String", 1, |interp, _this, args| {
        match args.first() {
            None => Ok(Value::from("")),
            Some(value) => Ok(Value::from(interp.to_js_string(value)?)),
        }
    });
    constructor.define_value(
        "prototype",
        Value::Object(prototype.clone()),
        PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE | PropertyAttributes::READ_ONLY,
    );
    prototype.define_value("constructor", Value::Object(constructor.clone()), PropertyAttributes::DONT_ENUM);

    interp.define_method(&constructor, "fromCharCode", 1, |interp, _this, args| {
        let mut out = String::new();
        for value in args {
            let code = interpreter::to_uint32(interp.to_number(value)?) & 0xFFFF;
            out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
        }
        Ok(Value::from(out))
    });

    interp.define_method(&prototype, "toString", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "toString")?))
    });

    interp.define_method(&prototype, "valueOf", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "valueOf")?))
    });

    interp.define_method(&prototype, "charAt", 1, |interp, this, args| {
        let s = this_string(interp, this, "charAt")?;
        let index = interpreter::to_integer(number_arg(interp, args, 0)?);
        if index < 0.0 {
            return Ok(Value::from(""));
        }
        Ok(Value::from(
            s.chars().nth(index as usize).map(String::from).unwrap_or_default(),
        ))
    });

    interp.define_method(&prototype, "charCodeAt", 1, |interp, this, args| {
        let s = this_string(interp, this, "charCodeAt")?;
        let index = interpreter::to_integer(number_arg(interp, args, 0)?);
        let code = if index < 0.0 {
            None
        } else {
            s.chars().nth(index as usize).map(|c| c as u32 as f64)
        };
        Ok(Value::Number(code.unwrap_or(f64::NAN)))
    });

    interp.define_method(&prototype, "indexOf", 1, |interp, this, args| {
        let s = this_string(interp, this, "indexOf")?;
        let needle = string_arg(interp, args, 0)?;
        let from = interpreter::to_integer(number_arg(interp, args, 1)?).max(0.0) as usize;
        Ok(Value::Number(
            char_index_of(&s, &needle, from).map(|i| i as f64).unwrap_or(-1.0),
        ))
    });

    interp.define_method(&prototype, "lastIndexOf", 1, |interp, this, args| {
        let s = this_string(interp, this, "lastIndexOf")?;
        let needle = string_arg(interp, args, 0)?;
        Ok(Value::Number(
            s.rfind(&needle)
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0),
        ))
    });

    interp.define_method(&prototype, "includes", 1, |interp, this, args| {
        let s = this_string(interp, this, "includes")?;
        let needle = string_arg(interp, args, 0)?;
        Ok(Value::Boolean(s.contains(&needle)))
    });

    interp.define_method(&prototype, "startsWith", 1, |interp, this, args| {
        let s = this_string(interp, this, "startsWith")?;
        let needle = string_arg(interp, args, 0)?;
        let from = relative_index(number_arg(interp, args, 1)?.max(0.0), s.chars().count());
        Ok(Value::Boolean(char_slice(&s, from, usize::MAX).starts_with(&needle)))
    });

    interp.define_method(&prototype, "endsWith", 1, |interp, this, args| {
        let s = this_string(interp, this, "endsWith")?;
        let needle = string_arg(interp, args, 0)?;
        let len = s.chars().count();
        let end = match arg(args, 1) {
            Value::Undefined => len,
            other => relative_index(interp.to_number(&other)?.max(0.0), len),
        };
        Ok(Value::Boolean(char_slice(&s, 0, end).ends_with(&needle)))
    });

    interp.define_method(&prototype, "slice", 2, |interp, this, args| {
        let s = this_string(interp, this, "slice")?;
        let len = s.chars().count();
        let start = relative_index(number_arg(interp, args, 0)?, len);
        let end = match arg(args, 1) {
            Value::Undefined => len,
            other => relative_index(interp.to_number(&other)?, len),
        };
        Ok(Value::from(char_slice(&s, start, end)))
    });

    interp.define_method(&prototype, "substring", 2, |interp, this, args| {
        let s = this_string(interp, this, "substring")?;
        let len = s.chars().count();
        let clamp = |n: f64| interpreter::to_integer(n).clamp(0.0, len as f64) as usize;
        let start = clamp(number_arg(interp, args, 0)?);
        let end = match arg(args, 1) {
            Value::Undefined => len,
            other => clamp(interp.to_number(&other)?),
        };
        Ok(Value::from(char_slice(&s, start.min(end), start.max(end))))
    });

    interp.define_method(&prototype, "toUpperCase", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "toUpperCase")?.to_uppercase()))
    });

    interp.define_method(&prototype, "toLowerCase", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "toLowerCase")?.to_lowercase()))
    });

    interp.define_method(&prototype, "trim", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "trim")?.trim()))
    });

    interp.define_method(&prototype, "trimStart", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "trimStart")?.trim_start()))
    });

    interp.define_method(&prototype, "trimEnd", 0, |interp, this, _args| {
        Ok(Value::from(this_string(interp, this, "trimEnd")?.trim_end()))
    });

    interp.define_method(&prototype, "padStart", 2, |interp, this, args| {
        let s = this_string(interp, this, "padStart")?;
        let fill = pad(interp, &s, args)?;
        Ok(Value::from(fill + &s))
    });

    interp.define_method(&prototype, "padEnd", 2, |interp, this, args| {
        let s = this_string(interp, this, "padEnd")?;
        let fill = pad(interp, &s, args)?;
        Ok(Value::from(s + &fill))
    });

    interp.define_method(&prototype, "repeat", 1, |interp, this, args| {
        let s = this_string(interp, this, "repeat")?;
        let count = interpreter::to_integer(number_arg(interp, args, 0)?);
        if count < 0.0 || count.is_infinite() {
            return Err(Exception::range_error(format!(
                "Invalid count value: {}",
                interpreter::number_to_string(count)
            )));
        }
        Ok(Value::from(s.repeat(count as usize)))
    });

    interp.define_method(&prototype, "split", 2, |interp, this, args| {
        let s = this_string(interp, this, "split")?;
        let limit = match arg(args, 1) {
            Value::Undefined => usize::MAX,
            other => interpreter::to_uint32(interp.to_number(&other)?) as usize,
        };
        let parts: Vec<Value> = match arg(args, 0) {
            Value::Undefined => vec![Value::from(s)],
            separator => {
                let separator = interp.to_js_string(&separator)?;
                if separator.is_empty() {
                    s.chars().map(|c| Value::from(c.to_string())).collect()
                } else {
                    s.split(&*separator).map(Value::from).collect()
                }
            }
        };
        let parts = parts.into_iter().take(limit).collect();
        Ok(Value::Object(interp.create_array(parts)))
    });

    interp.define_method(&prototype, "replace", 2, |interp, this, args| {
        let s = this_string(interp, this, "replace")?;
        replace(interp, s, args, false)
    });

    interp.define_method(&prototype, "replaceAll", 2, |interp, this, args| {
        let s = this_string(interp, this, "replaceAll")?;
        replace(interp, s, args, true)
    });

    interp.global().define_value("String", Value::Object(constructor), PropertyAttributes::DONT_ENUM);
}

fn pad(interp: &mut Interpreter, s: &str, args: &[Value]) -> ScriptResult<String> {
    let target = interpreter::to_integer(number_arg(interp, args, 0)?).max(0.0) as usize;
    let filler = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        other => interp.to_js_string(&other)?.to_string(),
    };
    let missing = target.saturating_sub(s.chars().count());
    if missing == 0 || filler.is_empty() {
        return Ok(String::new());
    }
    Ok(filler.chars().cycle().take(missing).collect())
}

/// Literal-pattern replace. The replacement may be a function receiving
/// `(match, offset, string)`.
fn replace(interp: &mut Interpreter, s: String, args: &[Value], all: bool) -> ScriptResult<Value> {
    let pattern = string_arg(interp, args, 0)?;
    let replacement = arg(args, 1);
    let mut out = String::new();
    let mut rest = 0;
    let mut search_from = 0;
    while let Some(found) = s[search_from..].find(&pattern).map(|i| i + search_from) {
        out.push_str(&s[rest..found]);
        let substitute = if replacement.is_callable() {
            let offset = Value::from(s[..found].chars().count());
            let result = interp.call(
                &replacement,
                &Value::Undefined,
                &[Value::from(pattern.as_str()), offset, Value::from(s.as_str())],
            )?;
            interp.to_js_string(&result)?.to_string()
        } else {
            interp
                .to_js_string(&replacement)?
                .replace("$&", &pattern)
        };
        out.push_str(&substitute);
        rest = found + pattern.len();
        if !all {
            break;
        }
        // An empty pattern matches between every character.
        search_from = if pattern.is_empty() {
            match s[rest..].chars().next() {
                Some(c) => {
                    out.push(c);
                    rest += c.len_utf8();
                    rest
                }
                None => break,
            }
        } else {
            rest
        };
    }
    out.push_str(&s[rest..]);
    Ok(Value::from(out))
}

#[cfg(test)]
mod tests {
    use crate::CaptureSink;
    use interpreter::{Interpreter, Value};
    use std::sync::Arc;

    fn eval(source: &str) -> Value {
        let mut interp = Interpreter::new();
        crate::install(&mut interp, Arc::new(CaptureSink::new()));
        interp.evaluate(source).unwrap()
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(eval("'  Hello '.trim().toUpperCase()"), Value::from("HELLO"));
    }

    #[test]
    fn test_slice_and_substring() {
        assert_eq!(eval("'abcdef'.slice(1, -1)"), Value::from("bcde"));
        assert_eq!(eval("'abcdef'.substring(4, 1)"), Value::from("bcd"));
        assert_eq!(eval("'abcdef'.slice(-2)"), Value::from("ef"));
    }

    #[test]
    fn test_index_of_counts_characters() {
        assert_eq!(eval("'héllo'.indexOf('l')"), Value::from(2));
        assert_eq!(eval("'abc'.indexOf('z')"), Value::from(-1));
    }

    #[test]
    fn test_split() {
        assert_eq!(eval("'a,b,,c'.split(',').length"), Value::from(4));
        assert_eq!(eval("'abc'.split('').join('-')"), Value::from("a-b-c"));
        assert_eq!(eval("'a b c'.split(' ', 2).join()"), Value::from("a,b"));
    }

    #[test]
    fn test_replace_first_and_all() {
        assert_eq!(eval("'a-b-c'.replace('-', '+')"), Value::from("a+b-c"));
        assert_eq!(eval("'a-b-c'.replaceAll('-', '+')"), Value::from("a+b+c"));
        assert_eq!(
            eval("'x1'.replace('1', m => '[' + m + ']')"),
            Value::from("x[1]")
        );
    }

    #[test]
    fn test_starts_and_ends_with() {
        assert_eq!(
            eval("'EACCES: permission denied'.startsWith('EACCES') && 'file.txt'.endsWith('.txt')"),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_pad_start() {
        assert_eq!(eval("'7'.padStart(3, '0')"), Value::from("007"));
    }
}
