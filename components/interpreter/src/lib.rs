//! Tree-walking script interpreter.
//!
//! This crate executes the parsed script subset directly from the AST:
//! - Reference-counted object model with property attributes and prototypes
//! - Lexical scopes with `var` hoisting and per-iteration `let` bindings
//! - Script and native functions sharing one calling convention
//! - Error objects carrying the script call stack
//! - An owned event loop for timers and background I/O
//!
//! Objects form cycles through closures; [`Interpreter::teardown`] empties
//! every object allocated by the interpreter so the cycles are released.
//!
//! # Example
//!
//! ```
//! use interpreter::{Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! let result = interp
//!     .evaluate("function add(a, b) { return a + b } add(20, 1)")
//!     .unwrap();
//! assert_eq!(result, Value::from(21));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod environment;
mod evaluate;
pub mod exception;
pub mod heap;
pub mod interpreter;
pub mod object;
pub mod operations;
pub mod realm;
pub mod value;

// Re-export main types at crate root
pub use environment::{AssignResult, Scope};
pub use exception::{Exception, ScriptResult};
pub use heap::{Heap, HeapStats};
pub use interpreter::{Interpreter, InterpreterConfig, ScriptTask};
pub use object::{
    array_index, FunctionKind, JsObject, NativeFunction, ObjectData, ObjectKind, Property,
    PropertyAttributes, PropertySlot, MAX_ARRAY_LENGTH,
};
pub use operations::PreferredType;
pub use realm::{Intrinsics, ERROR_KINDS};
pub use value::{number_to_string, string_to_number, to_int32, to_integer, to_uint32, Value};
