//! Global functions: `isNaN`, `isFinite`, `parseInt`, `parseFloat`, and
//! the `globalThis`/`global` self references.

use crate::args::{arg, number_arg, string_arg};
use interpreter::{Interpreter, PropertyAttributes, Value};

/// parseInt(string, radix)
pub fn parse_int(input: &str, radix: u32) -> f64 {
    let s = input.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, s) = match radix {
        0 | 16 if s.starts_with("0x") || s.starts_with("0X") => (16, &s[2..]),
        0 => (10, s),
        r if (2..=36).contains(&r) => (r, s),
        _ => return f64::NAN,
    };
    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .iter()
        .fold(0.0, |acc, d| acc * radix as f64 + *d as f64);
    if negative {
        -value
    } else {
        value
    }
}

/// parseFloat(string): the longest prefix that is a decimal literal.
pub fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    let unsigned = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return f64::NAN;
    }
    // Optional exponent, only taken if it has digits.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// Installs the global functions.
pub fn install(interp: &mut Interpreter) {
    let global = interp.global();
    let hidden = PropertyAttributes::DONT_ENUM;
    global.define_value("globalThis", Value::Object(global.clone()), hidden);
    global.define_value("global", Value::Object(global.clone()), hidden);

    interp.define_method(&global, "isNaN", 1, |interp, _this, args| {
        Ok(Value::Boolean(number_arg(interp, args, 0)?.is_nan()))
    });

    interp.define_method(&global, "isFinite", 1, |interp, _this, args| {
        Ok(Value::Boolean(number_arg(interp, args, 0)?.is_finite()))
    });

    interp.define_method(&global, "parseInt", 2, |interp, _this, args| {
        let input = string_arg(interp, args, 0)?;
        let radix = match arg(args, 1) {
            Value::Undefined => 0,
            other => interpreter::to_int32(interp.to_number(&other)?) as u32,
        };
        Ok(Value::Number(parse_int(&input, radix)))
    });

    interp.define_method(&global, "parseFloat", 1, |interp, _this, args| {
        let input = string_arg(interp, args, 0)?;
        Ok(Value::Number(parse_float(&input)))
    });
}
