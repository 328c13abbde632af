//! Abrupt completions that unwind through the interpreter.

use crate::value::Value;
use core_types::JsError;
use std::fmt;

/// Why evaluation stopped early.
#[derive(Clone)]
pub enum Exception {
    /// A value thrown by script (`throw x`) or materialized from a native error
    Thrown(Value),
    /// An error raised by native code; becomes an error object when caught
    Error(JsError),
    /// `process.exit(code)` was called
    Exit(i32),
    /// Execution was interrupted from outside
    Terminated,
}

impl Exception {
    /// A `TypeError` raised from native code.
    pub fn type_error(message: impl Into<String>) -> Self {
        Exception::Error(JsError::type_error(message))
    }

    /// A `RangeError` raised from native code.
    pub fn range_error(message: impl Into<String>) -> Self {
        Exception::Error(JsError::range_error(message))
    }

    /// A `ReferenceError` raised from native code.
    pub fn reference_error(message: impl Into<String>) -> Self {
        Exception::Error(JsError::reference_error(message))
    }

    /// A plain `Error` raised from native code.
    pub fn error(message: impl Into<String>) -> Self {
        Exception::Error(JsError::error(message))
    }

    /// Returns true if a `catch` block may handle this exception.
    pub fn is_catchable(&self) -> bool {
        match self {
            Exception::Thrown(_) => true,
            Exception::Error(e) => !e.is_termination(),
            Exception::Exit(_) | Exception::Terminated => false,
        }
    }
}

impl From<JsError> for Exception {
    fn from(error: JsError) -> Self {
        if error.is_termination() {
            Exception::Terminated
        } else {
            Exception::Error(error)
        }
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exception::Thrown(v) => write!(f, "Thrown({:?})", v),
            Exception::Error(e) => write!(f, "Error({})", e),
            Exception::Exit(code) => write!(f, "Exit({})", code),
            Exception::Terminated => f.write_str("Terminated"),
        }
    }
}

/// Result type for anything that runs script code.
pub type ScriptResult<T> = Result<T, Exception>;
