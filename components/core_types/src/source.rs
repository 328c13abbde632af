//! Source position and stack frame types for error reporting.

use std::fmt;

/// A position in script source.
///
/// Lines and columns are 1-indexed; `offset` is the character offset from
/// the start of the source.
///
/// # Examples
///
/// ```
/// use core_types::SourcePosition;
///
/// let pos = SourcePosition::new(10, 5, 150);
/// assert_eq!(pos.to_string(), "10:5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
    /// Character offset from the start of the source
    pub offset: usize,
}

impl SourcePosition {
    /// Creates a position.
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single frame in a script call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for anonymous functions
    pub function_name: Option<String>,
    /// Script name, or None when evaluated from a string
    pub source_url: Option<String>,
    /// Line of the call site
    pub line: u32,
    /// Column of the call site
    pub column: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        let url = self.source_url.as_deref().unwrap_or("<anonymous>");
        write!(f, "{} ({}:{}:{})", name, url, self.line, self.column)
    }
}
