//! Registration tables for bridged native types.

use super::object::Fields;
use super::types::{BridgeType, NativeValue, ValueType};
use interpreter::PropertyAttributes;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by bridge declarations and native methods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("{class} has no member '{name}'")]
    UnknownMember { class: String, name: String },

    #[error("'{name}' is declared as {declared}, not {requested}")]
    TypeMismatch {
        name: String,
        declared: ValueType,
        requested: ValueType,
    },

    #[error("{class} declares '{name}' more than once")]
    DuplicateMember { class: String, name: String },

    #[error("{name} expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{0}")]
    Method(String),
}

/// A native method body. It receives the object's fields and the
/// arguments, already coerced to the declared parameter types.
pub type NativeMethod = Arc<dyn Fn(&Fields, &[NativeValue]) -> Result<NativeValue, BridgeError> + Send + Sync>;

/// A declared property.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub value_type: ValueType,
    pub attributes: PropertyAttributes,
}

impl PropertyDecl {
    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(PropertyAttributes::READ_ONLY)
    }
}

/// A declared method.
#[derive(Clone)]
pub struct MethodDecl {
    pub name: String,
    pub attributes: PropertyAttributes,
    pub params: Vec<ValueType>,
    pub returns: ValueType,
    pub function: NativeMethod,
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// The ordered members of one bridged type.
///
/// Built once per type and shared by every instance; the native accessors
/// and the script bindings both consult it.
///
/// # Examples
///
/// ```
/// use interpreter::PropertyAttributes;
/// use node_process::bridge::{BridgeClass, NativeValue, ValueType};
///
/// let class = BridgeClass::builder("Counter")
///     .property::<i32>("count", PropertyAttributes::empty())
///     .method("incr", PropertyAttributes::READ_ONLY, &[ValueType::Integer], ValueType::Integer, |_, args| {
///         match args {
///             [NativeValue::Integer(n)] => Ok(NativeValue::Integer(n + 1)),
///             _ => unreachable!(),
///         }
///     })
///     .build()
///     .unwrap();
/// assert_eq!(class.properties().len(), 1);
/// ```
#[derive(Debug)]
pub struct BridgeClass {
    name: String,
    properties: Vec<PropertyDecl>,
    methods: Vec<MethodDecl>,
}

impl BridgeClass {
    pub fn builder(name: impl Into<String>) -> BridgeClassBuilder {
        BridgeClassBuilder {
            name: name.into(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Position of the property called `name`.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    pub(crate) fn unknown(&self, name: &str) -> BridgeError {
        BridgeError::UnknownMember {
            class: self.name.clone(),
            name: name.to_string(),
        }
    }
}

/// Builder for [`BridgeClass`].
pub struct BridgeClassBuilder {
    name: String,
    properties: Vec<PropertyDecl>,
    methods: Vec<MethodDecl>,
}

impl BridgeClassBuilder {
    /// Declares a property backed by a `T` cell.
    pub fn property<T: BridgeType>(self, name: &str, attributes: PropertyAttributes) -> Self {
        self.property_of(name, T::VALUE_TYPE, attributes)
    }

    /// Declares a property of an explicit type, e.g. [`ValueType::Any`].
    pub fn property_of(mut self, name: &str, value_type: ValueType, attributes: PropertyAttributes) -> Self {
        self.properties.push(PropertyDecl {
            name: name.to_string(),
            value_type,
            attributes,
        });
        self
    }

    /// Declares a method.
    pub fn method<F>(
        mut self,
        name: &str,
        attributes: PropertyAttributes,
        params: &[ValueType],
        returns: ValueType,
        function: F,
    ) -> Self
    where
        F: Fn(&Fields, &[NativeValue]) -> Result<NativeValue, BridgeError> + Send + Sync + 'static,
    {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            attributes,
            params: params.to_vec(),
            returns,
            function: Arc::new(function),
        });
        self
    }

    /// Finishes the table. Member names must be unique.
    pub fn build(self) -> Result<Arc<BridgeClass>, BridgeError> {
        let mut seen = HashSet::new();
        let names = self
            .properties
            .iter()
            .map(|p| &p.name)
            .chain(self.methods.iter().map(|m| &m.name));
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(BridgeError::DuplicateMember {
                    class: self.name.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(Arc::new(BridgeClass {
            name: self.name,
            properties: self.properties,
            methods: self.methods,
        }))
    }
}
