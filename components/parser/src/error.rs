//! Syntax error constructors shared by the lexer and parser

use core_types::{ErrorKind, JsError, SourcePosition};

/// A `SyntaxError` at `position`.
pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> JsError {
    JsError {
        kind: ErrorKind::SyntaxError,
        message: message.into(),
        stack: vec![],
        source_position: position,
    }
}

/// "Unexpected X, expected Y", naming what the parser was looking for.
pub fn unexpected_token(expected: &str, got: &str, position: Option<SourcePosition>) -> JsError {
    syntax_error(format!("Unexpected {}, expected {}", got, expected), position)
}

/// Input ended inside a construct.
pub fn unexpected_eof(position: Option<SourcePosition>) -> JsError {
    syntax_error("Unexpected end of input", position)
}

/// A string, template or comment opened at `start` never closes.
pub fn unterminated(what: &str, start: &SourcePosition) -> JsError {
    syntax_error(format!("Unterminated {}", what), Some(start.clone()))
}
