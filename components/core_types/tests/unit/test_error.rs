//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, SourcePosition};

#[test]
fn constructors_set_kind() {
    assert_eq!(JsError::error("a").kind, ErrorKind::Error);
    assert_eq!(JsError::type_error("a").kind, ErrorKind::TypeError);
    assert_eq!(JsError::range_error("a").kind, ErrorKind::RangeError);
    assert_eq!(JsError::reference_error("a").kind, ErrorKind::ReferenceError);
    assert_eq!(JsError::internal("a").kind, ErrorKind::InternalError);
}

#[test]
fn display_includes_position_when_known() {
    let error = JsError::reference_error("x is not defined")
        .with_position(Some(SourcePosition::new(1, 5, 4)));
    assert_eq!(error.to_string(), "ReferenceError: x is not defined (1:5)");
}

#[test]
fn termination_is_flagged() {
    assert!(JsError::termination().is_termination());
    assert!(!JsError::error("x").is_termination());
}

#[test]
fn js_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&JsError::error("x"));
}
