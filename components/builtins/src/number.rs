//! Number and Boolean constructors and prototypes

use crate::args::{arg, number_arg};
use interpreter::{number_to_string, Exception, Interpreter, PropertyAttributes, ScriptResult, Value};

fn this_number(this: &Value, method: &str) -> ScriptResult<f64> {
    match this {
        Value::Number(n) => Ok(*n),
        _ => Err(Exception::type_error(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))),
    }
}

/// Formats `n` in `radix` (2..=36).
pub fn number_to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let n = n.abs();
    let mut integer = n.trunc();
    let mut fraction = n - integer;

    let mut digits = Vec::new();
    loop {
        let digit = (integer % radix as f64) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        integer = (integer / radix as f64).trunc();
        if integer < 1.0 {
            break;
        }
    }
    let mut out: String = digits.iter().rev().collect();
    if fraction > 0.0 {
        out.push('.');
        for _ in 0..20 {
            fraction *= radix as f64;
            let digit = fraction.trunc() as u32;
            out.push(std::char::from_digit(digit, radix).unwrap_or('0'));
            fraction -= digit as f64;
            if fraction <= 0.0 {
                break;
            }
        }
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Installs `Number`, `Boolean` and their prototype methods.
pub fn install(interp: &mut Interpreter) {
    let hidden = PropertyAttributes::DONT_ENUM;
    let fixed = PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE | PropertyAttributes::READ_ONLY;

    let prototype = interp.intrinsics().number_prototype.clone();
    let number = interp.create_function("Number", 1, |interp, _this, args| match args.first() {
        None => Ok(Value::from(0)),
        Some(value) => Ok(Value::Number(interp.to_number(value)?)),
    });
    number.define_value("prototype", Value::Object(prototype.clone()), fixed);
    prototype.define_value("constructor", Value::Object(number.clone()), hidden);

    number.define_value("MAX_SAFE_INTEGER", Value::from(9_007_199_254_740_991.0), fixed);
    number.define_value("MIN_SAFE_INTEGER", Value::from(-9_007_199_254_740_991.0), fixed);
    number.define_value("EPSILON", Value::from(f64::EPSILON), fixed);
    number.define_value("NaN", Value::Number(f64::NAN), fixed);
    number.define_value("POSITIVE_INFINITY", Value::Number(f64::INFINITY), fixed);
    number.define_value("NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY), fixed);

    interp.define_method(&number, "isInteger", 1, |_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite() && n.trunc() == n)))
    });
    interp.define_method(&number, "isFinite", 1, |_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
    });
    interp.define_method(&number, "isNaN", 1, |_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_nan())))
    });

    interp.define_method(&prototype, "toString", 1, |interp, this, args| {
        let n = this_number(this, "toString")?;
        let radix = match arg(args, 0) {
            Value::Undefined => 10.0,
            other => interpreter::to_integer(interp.to_number(&other)?),
        };
        if !(2.0..=36.0).contains(&radix) {
            return Err(Exception::range_error("toString() radix must be between 2 and 36"));
        }
        Ok(Value::from(number_to_radix_string(n, radix as u32)))
    });

    interp.define_method(&prototype, "toFixed", 1, |interp, this, args| {
        let n = this_number(this, "toFixed")?;
        let digits = interpreter::to_integer(number_arg(interp, args, 0)?);
        if !(0.0..=100.0).contains(&digits) {
            return Err(Exception::range_error("toFixed() digits argument must be between 0 and 100"));
        }
        if !n.is_finite() || n.abs() >= 1e21 {
            return Ok(Value::from(number_to_string(n)));
        }
        Ok(Value::from(format!("{:.*}", digits as usize, n)))
    });

    interp.define_method(&prototype, "valueOf", 0, |_interp, this, _args| {
        Ok(Value::Number(this_number(this, "valueOf")?))
    });

    let boolean_prototype = interp.intrinsics().boolean_prototype.clone();
    let boolean = interp.create_function("Boolean", 1, |_interp, _this, args| {
        Ok(Value::Boolean(arg(args, 0).is_truthy()))
    });
    boolean.define_value("prototype", Value::Object(boolean_prototype.clone()), fixed);
    boolean_prototype.define_value("constructor", Value::Object(boolean.clone()), hidden);

    interp.define_method(&boolean_prototype, "toString", 0, |_interp, this, _args| match this {
        Value::Boolean(b) => Ok(Value::from(if *b { "true" } else { "false" })),
        _ => Err(Exception::type_error("Boolean.prototype.toString requires that 'this' be a Boolean")),
    });
    interp.define_method(&boolean_prototype, "valueOf", 0, |_interp, this, _args| match this {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        _ => Err(Exception::type_error("Boolean.prototype.valueOf requires that 'this' be a Boolean")),
    });

    let global = interp.global();
    global.define_value("Number", Value::Object(number), hidden);
    global.define_value("Boolean", Value::Object(boolean), hidden);
}
