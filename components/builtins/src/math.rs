//! Math object

use crate::args::number_arg;
use interpreter::{Interpreter, PropertyAttributes, ScriptResult, Value};
use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

fn unary(interp: &mut Interpreter, math: &interpreter::JsObject, name: &str, f: fn(f64) -> f64) {
    interp.define_method(math, name, 1, move |interp, _this, args| {
        Ok(Value::Number(f(number_arg(interp, args, 0)?)))
    });
}

fn numbers(interp: &mut Interpreter, args: &[Value]) -> ScriptResult<Vec<f64>> {
    let mut out = Vec::with_capacity(args.len());
    for value in args {
        out.push(interp.to_number(value)?);
    }
    Ok(out)
}

/// Math.round: halves round toward +Infinity.
pub fn round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    (x + 0.5).floor()
}

/// Installs the `Math` object.
pub fn install(interp: &mut Interpreter) {
    let math = interp.create_object();
    let fixed = PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE | PropertyAttributes::READ_ONLY;
    math.define_value("PI", Value::from(std::f64::consts::PI), fixed);
    math.define_value("E", Value::from(std::f64::consts::E), fixed);
    math.define_value("LN2", Value::from(std::f64::consts::LN_2), fixed);
    math.define_value("LN10", Value::from(std::f64::consts::LN_10), fixed);
    math.define_value("SQRT2", Value::from(std::f64::consts::SQRT_2), fixed);

    unary(interp, &math, "floor", f64::floor);
    unary(interp, &math, "ceil", f64::ceil);
    unary(interp, &math, "round", round);
    unary(interp, &math, "abs", f64::abs);
    unary(interp, &math, "sqrt", f64::sqrt);
    unary(interp, &math, "trunc", f64::trunc);
    unary(interp, &math, "sin", f64::sin);
    unary(interp, &math, "cos", f64::cos);
    unary(interp, &math, "tan", f64::tan);
    unary(interp, &math, "log", f64::ln);
    unary(interp, &math, "exp", f64::exp);
    unary(interp, &math, "sign", |x| if x.is_nan() || x == 0.0 { x } else { x.signum() });

    interp.define_method(&math, "pow", 2, |interp, _this, args| {
        let base = number_arg(interp, args, 0)?;
        let exponent = number_arg(interp, args, 1)?;
        Ok(Value::Number(base.powf(exponent)))
    });

    interp.define_method(&math, "max", 2, |interp, _this, args| {
        let values = numbers(interp, args)?;
        Ok(Value::Number(values.into_iter().fold(f64::NEG_INFINITY, |acc, n| {
            if acc.is_nan() || n.is_nan() {
                f64::NAN
            } else {
                acc.max(n)
            }
        })))
    });

    interp.define_method(&math, "min", 2, |interp, _this, args| {
        let values = numbers(interp, args)?;
        Ok(Value::Number(values.into_iter().fold(f64::INFINITY, |acc, n| {
            if acc.is_nan() || n.is_nan() {
                f64::NAN
            } else {
                acc.min(n)
            }
        })))
    });

    // xorshift64*, seeded from the clock
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x2545_F491_4F6C_DD1D)
        | 1;
    let state = Cell::new(seed);
    interp.define_method(&math, "random", 0, move |_interp, _this, _args| {
        let mut x = state.get();
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        state.set(x);
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        Ok(Value::Number(bits as f64 / (1u64 << 53) as f64))
    });

    interp
        .global()
        .define_value("Math", Value::Object(math), PropertyAttributes::DONT_ENUM);
}
