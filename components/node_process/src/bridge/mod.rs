//! Native objects with typed properties and methods mirrored into script.
//!
//! A [`BridgeClass`] is an ordered registration table built once per native
//! type. [`BridgeObject::new`] instantiates it in a context: each property
//! becomes a script accessor over a cell shared with the native
//! [`Property`] handles, and each method becomes a native function whose
//! arguments are coerced to the declared [`ValueType`]s.

mod class;
mod object;
mod types;

pub use class::{BridgeClass, BridgeClassBuilder, BridgeError, MethodDecl, NativeMethod, PropertyDecl};
pub use object::{BridgeObject, Fields, Property};
pub use types::{BridgeType, NativeValue, ValueType};
