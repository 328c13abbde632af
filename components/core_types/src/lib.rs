//! Core error and source-location types shared by every runtime component.
//!
//! # Overview
//!
//! - [`JsError`] - A script error as seen from native code
//! - [`ErrorKind`] - The script-level error class (`TypeError`, ...)
//! - [`SourcePosition`] - Source code location
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError};
//!
//! let error = JsError::type_error("undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! assert_eq!(error.to_string(), "TypeError: undefined is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;

pub use error::{ErrorKind, JsError};
pub use source::{SourcePosition, StackFrame};
