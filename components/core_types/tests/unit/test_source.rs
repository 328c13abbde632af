//! Unit tests for SourcePosition and StackFrame

use core_types::{SourcePosition, StackFrame};

#[test]
fn positions_compare_by_value() {
    assert_eq!(SourcePosition::new(2, 4, 12), SourcePosition::new(2, 4, 12));
    assert_ne!(SourcePosition::new(2, 4, 12), SourcePosition::new(2, 5, 13));
}

#[test]
fn named_frame_renders_call_site() {
    let frame = StackFrame {
        function_name: Some("onRead".to_string()),
        source_url: Some("main.js".to_string()),
        line: 12,
        column: 3,
    };
    assert_eq!(frame.to_string(), "onRead (main.js:12:3)");
}
