//! Standard library for the script interpreter
//!
//! This crate installs the built-in objects and prototypes into an
//! [`Interpreter`]'s realm:
//! - Global functions and `globalThis`
//! - Object, Array, String, Number, Boolean and Function prototypes
//! - Math object
//! - JSON object (backed by serde_json)
//! - Error constructors
//! - Console object writing to a pluggable [`ConsoleSink`]
//!
//! # Example
//!
//! ```
//! use builtins::CaptureSink;
//! use interpreter::{Interpreter, Value};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(CaptureSink::new());
//! let mut interp = Interpreter::new();
//! builtins::install(&mut interp, sink.clone());
//!
//! let result = interp.evaluate("[1, 2, 3].map(n => n * 2).join('-')").unwrap();
//! assert_eq!(result, Value::from("2-4-6"));
//!
//! interp.evaluate("console.log({ a: 1 }, 'text')").unwrap();
//! assert_eq!(sink.lines(), vec!["{ a: 1 } text"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod console;
pub mod error;
pub mod function;
pub mod globals;
pub mod inspect;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

mod args;

// Re-export main types for convenience
pub use console::{CaptureSink, ConsoleLevel, ConsoleSink, LogSink, StdoutSink};
pub use inspect::inspect;

use interpreter::Interpreter;
use std::sync::Arc;

/// Installs every builtin into the interpreter's global object.
///
/// Function.prototype is populated first so that every later function
/// already inherits `call`, `apply` and `bind`.
pub fn install(interp: &mut Interpreter, console: Arc<dyn ConsoleSink>) {
    function::install(interp);
    object::install(interp);
    array::install(interp);
    string::install(interp);
    number::install(interp);
    error::install(interp);
    math::install(interp);
    json::install(interp);
    globals::install(interp);
    console::install(interp, console);
    log::trace!("builtins installed");
}
