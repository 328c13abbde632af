//! Script error types.
//!
//! A [`JsError`] is the native-side view of a script failure. It carries the
//! script error class, the message, and the call stack captured when the
//! error left the interpreter.

use crate::{SourcePosition, StackFrame};
use std::fmt;

/// The class of a script error.
///
/// The first variants mirror the script-visible error constructors.
/// `Termination` marks an execution that was interrupted from the host and
/// can never be caught by script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Plain `Error`, also used for thrown non-error values
    Error,
    /// Syntax error in script source
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undeclared variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Internal engine or host failure
    InternalError,
    /// Execution was interrupted by the host
    Termination,
}

impl ErrorKind {
    /// The constructor name script code sees for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::Termination => "Termination",
        }
    }

    /// Maps a constructor name back to its kind.
    ///
    /// Unknown names (user-defined error classes) map to [`ErrorKind::Error`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "SyntaxError" => ErrorKind::SyntaxError,
            "TypeError" => ErrorKind::TypeError,
            "ReferenceError" => ErrorKind::ReferenceError,
            "RangeError" => ErrorKind::RangeError,
            "InternalError" => ErrorKind::InternalError,
            _ => ErrorKind::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script error with message and stack trace.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError, SourcePosition};
///
/// let error = JsError::syntax_error("Unexpected token", Some(SourcePosition::new(3, 7, 40)));
///
/// assert_eq!(error.kind, ErrorKind::SyntaxError);
/// assert_eq!(error.to_string(), "SyntaxError: Unexpected token (3:7)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsError {
    /// The class of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Stack trace (innermost frame first)
    pub stack: Vec<StackFrame>,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Creates an error of the given kind without location information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: vec![],
            source_position: None,
        }
    }

    /// Plain `Error`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// `RangeError`.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    /// `ReferenceError`.
    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceError, message)
    }

    /// `SyntaxError` at an optional position.
    pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Self::new(ErrorKind::SyntaxError, message).with_position(position)
    }

    /// Internal engine or host failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Host-requested interruption.
    pub fn termination() -> Self {
        Self::new(ErrorKind::Termination, "Script execution was terminated")
    }

    /// Attaches a source position, keeping an existing one.
    pub fn with_position(mut self, position: Option<SourcePosition>) -> Self {
        if self.source_position.is_none() {
            self.source_position = position;
        }
        self
    }

    /// Replaces the stack trace.
    pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
        self.stack = stack;
        self
    }

    /// Whether this error came from a host interruption.
    pub fn is_termination(&self) -> bool {
        self.kind == ErrorKind::Termination
    }

    /// Renders the error the way script `err.stack` shows it.
    pub fn stack_trace(&self) -> String {
        let mut out = format!("{}: {}", self.kind, self.message);
        for frame in &self.stack {
            out.push_str("\n    at ");
            out.push_str(&frame.to_string());
        }
        out
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(position) = &self.source_position {
            write!(f, " ({})", position)?;
        }
        Ok(())
    }
}

impl std::error::Error for JsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            ErrorKind::SyntaxError,
            ErrorKind::TypeError,
            ErrorKind::ReferenceError,
            ErrorKind::RangeError,
        ] {
            assert_eq!(ErrorKind::from_name(kind.name()), kind);
        }
        assert_eq!(ErrorKind::from_name("MyError"), ErrorKind::Error);
    }

    #[test]
    fn test_with_position_keeps_first() {
        let first = SourcePosition::new(1, 1, 0);
        let second = SourcePosition::new(9, 9, 90);
        let error = JsError::type_error("x")
            .with_position(Some(first.clone()))
            .with_position(Some(second));
        assert_eq!(error.source_position, Some(first));
    }

    #[test]
    fn test_stack_trace_lists_frames() {
        let error = JsError::error("boom").with_stack(vec![StackFrame {
            function_name: Some("inner".to_string()),
            source_url: None,
            line: 4,
            column: 2,
        }]);
        assert_eq!(error.stack_trace(), "Error: boom\n    at inner (<anonymous>:4:2)");
    }
}
