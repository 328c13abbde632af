//! Console object
//!
//! Every console method formats its arguments to a single line and hands it
//! to a [`ConsoleSink`]. Sinks are shared with the host thread that owns the
//! process, so they must be `Send + Sync`.

use crate::args::arg;
use crate::inspect::inspect;
use crate::json::value_to_json;
use interpreter::{Interpreter, PropertyAttributes, ScriptResult, Value};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Severity of a console message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleLevel {
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error` and failed assertions
    Error,
    /// `console.debug`
    Debug,
}

impl ConsoleLevel {
    /// Lower-case name of the console method.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Debug => "debug",
        }
    }

    fn log_level(&self) -> log::Level {
        match self {
            ConsoleLevel::Log | ConsoleLevel::Info => log::Level::Info,
            ConsoleLevel::Warn => log::Level::Warn,
            ConsoleLevel::Error => log::Level::Error,
            ConsoleLevel::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for console output.
pub trait ConsoleSink: Send + Sync {
    /// Receives one formatted console message.
    fn write(&self, level: ConsoleLevel, message: &str);
}

/// Forwards console output to the `log` facade under the `console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ConsoleSink for LogSink {
    fn write(&self, level: ConsoleLevel, message: &str) {
        log::log!(target: "console", level.log_level(), "{}", message);
    }
}

/// Prints `log`, `info` and `debug` to stdout and the rest to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ConsoleSink for StdoutSink {
    fn write(&self, level: ConsoleLevel, message: &str) {
        match level {
            ConsoleLevel::Warn | ConsoleLevel::Error => eprintln!("{}", message),
            _ => println!("{}", message),
        }
    }
}

/// Records console output in memory.
///
/// # Examples
///
/// ```
/// use builtins::{CaptureSink, ConsoleLevel, ConsoleSink};
///
/// let sink = CaptureSink::new();
/// sink.write(ConsoleLevel::Warn, "careful");
/// assert_eq!(sink.entries(), vec![(ConsoleLevel::Warn, "careful".to_string())]);
/// ```
#[derive(Debug, Default)]
pub struct CaptureSink {
    entries: Mutex<Vec<(ConsoleLevel, String)>>,
}

impl CaptureSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message with its level, oldest first.
    pub fn entries(&self) -> Vec<(ConsoleLevel, String)> {
        self.entries.lock().clone()
    }

    /// Every message text, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.entries.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    /// Discards recorded output.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ConsoleSink for CaptureSink {
    fn write(&self, level: ConsoleLevel, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }
}

/// Formats console arguments the way `util.format` does.
///
/// A leading string may contain `%s`, `%d`, `%i`, `%f`, `%j`, `%o`, `%O`,
/// `%c` and `%%`. Remaining arguments are appended separated by spaces;
/// strings print raw and everything else is inspected.
pub fn format_args(interp: &mut Interpreter, args: &[Value]) -> ScriptResult<String> {
    let mut out = String::new();
    let mut rest = args;
    let mut separate = false;

    if let Some(Value::String(template)) = args.first() {
        rest = &args[1..];
        separate = true;
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let specifier = match chars.peek() {
                Some(s) => *s,
                None => {
                    out.push('%');
                    break;
                }
            };
            if specifier == '%' {
                chars.next();
                out.push('%');
                continue;
            }
            if !"sdifjoOc".contains(specifier) || rest.is_empty() {
                out.push('%');
                continue;
            }
            chars.next();
            let value = &rest[0];
            rest = &rest[1..];
            match specifier {
                's' => match value {
                    Value::Object(_) => out.push_str(&inspect(interp, value)),
                    other => out.push_str(&interp.display_string(other)),
                },
                'd' | 'i' | 'f' => {
                    let n = match value {
                        Value::Object(_) => f64::NAN,
                        other => interp.to_number(other)?,
                    };
                    let n = if specifier == 'i' { n.trunc() } else { n };
                    out.push_str(&inspect(interp, &Value::Number(n)));
                }
                'j' => match value_to_json(interp, value)? {
                    Some(json) => out.push_str(&json.to_string()),
                    None => out.push_str("undefined"),
                },
                'o' | 'O' => out.push_str(&inspect(interp, value)),
                _ => {}
            }
        }
    }

    for value in rest {
        if separate {
            out.push(' ');
        }
        separate = true;
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&inspect(interp, other)),
        }
    }
    Ok(out)
}

fn define_output(interp: &mut Interpreter, console: &interpreter::JsObject, name: &str, level: ConsoleLevel, sink: &Arc<dyn ConsoleSink>) {
    let sink = sink.clone();
    interp.define_method(console, name, 0, move |interp, _this, args| {
        let message = format_args(interp, args)?;
        sink.write(level, &message);
        Ok(Value::Undefined)
    });
}

fn label_arg(interp: &mut Interpreter, args: &[Value]) -> ScriptResult<String> {
    match arg(args, 0) {
        Value::Undefined => Ok("default".to_string()),
        label => Ok(interp.to_js_string(&label)?.to_string()),
    }
}

/// Installs the `console` object writing to `sink`.
pub fn install(interp: &mut Interpreter, sink: Arc<dyn ConsoleSink>) {
    let console = interp.create_object();

    define_output(interp, &console, "log", ConsoleLevel::Log, &sink);
    define_output(interp, &console, "info", ConsoleLevel::Info, &sink);
    define_output(interp, &console, "warn", ConsoleLevel::Warn, &sink);
    define_output(interp, &console, "error", ConsoleLevel::Error, &sink);
    define_output(interp, &console, "debug", ConsoleLevel::Debug, &sink);

    let assert_sink = sink.clone();
    interp.define_method(&console, "assert", 0, move |interp, _this, args| {
        if arg(args, 0).is_truthy() {
            return Ok(Value::Undefined);
        }
        let detail = format_args(interp, args.get(1..).unwrap_or(&[]))?;
        let message = if detail.is_empty() {
            "Assertion failed".to_string()
        } else {
            format!("Assertion failed: {}", detail)
        };
        assert_sink.write(ConsoleLevel::Error, &message);
        Ok(Value::Undefined)
    });

    let timers: Rc<RefCell<HashMap<String, Instant>>> = Rc::new(RefCell::new(HashMap::new()));

    let start_timers = timers.clone();
    let time_sink = sink.clone();
    interp.define_method(&console, "time", 0, move |interp, _this, args| {
        let label = label_arg(interp, args)?;
        let mut timers = start_timers.borrow_mut();
        if timers.contains_key(&label) {
            time_sink.write(
                ConsoleLevel::Warn,
                &format!("Warning: Label '{}' already exists for console.time()", label),
            );
        } else {
            timers.insert(label, Instant::now());
        }
        Ok(Value::Undefined)
    });

    let end_sink = sink;
    interp.define_method(&console, "timeEnd", 0, move |interp, _this, args| {
        let label = label_arg(interp, args)?;
        match timers.borrow_mut().remove(&label) {
            Some(start) => {
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                end_sink.write(ConsoleLevel::Log, &format!("{}: {:.3}ms", label, elapsed));
            }
            None => end_sink.write(
                ConsoleLevel::Warn,
                &format!("Warning: No such label '{}' for console.timeEnd()", label),
            ),
        }
        Ok(Value::Undefined)
    });

    interp
        .global()
        .define_value("console", Value::Object(console), PropertyAttributes::DONT_ENUM);
}
