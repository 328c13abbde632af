//! Object model: property storage, attributes and object kinds.

use crate::environment::Scope;
use crate::exception::ScriptResult;
use crate::interpreter::Interpreter;
use crate::value::Value;
use bitflags::bitflags;
use core_types::StackFrame;
use parser::FunctionNode;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Property attributes.
    ///
    /// The empty set is a plain writable, enumerable, deletable property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyAttributes: u8 {
        /// Writes from script are ignored
        const READ_ONLY = 0b0000_0001;
        /// Skipped by key enumeration
        const DONT_ENUM = 0b0000_0010;
        /// `delete` fails
        const DONT_DELETE = 0b0000_0100;
    }
}

/// Native function signature: `(interpreter, this, arguments)`.
pub type NativeFunction = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> ScriptResult<Value>>;

/// What a property holds
#[derive(Clone)]
pub enum PropertySlot {
    /// Plain value
    Data(Value),
    /// Getter/setter pair
    Accessor {
        /// Getter function
        get: Option<JsObject>,
        /// Setter function
        set: Option<JsObject>,
    },
}

/// A property and its attributes
#[derive(Clone)]
pub struct Property {
    /// Stored value or accessors
    pub slot: PropertySlot,
    /// Attributes
    pub attributes: PropertyAttributes,
}

impl Property {
    /// A data property.
    pub fn data(value: Value, attributes: PropertyAttributes) -> Self {
        Self {
            slot: PropertySlot::Data(value),
            attributes,
        }
    }

    /// An accessor property.
    pub fn accessor(get: Option<JsObject>, set: Option<JsObject>, attributes: PropertyAttributes) -> Self {
        Self {
            slot: PropertySlot::Accessor { get, set },
            attributes,
        }
    }

    /// Returns true unless the property is DONT_ENUM.
    pub fn is_enumerable(&self) -> bool {
        !self.attributes.contains(PropertyAttributes::DONT_ENUM)
    }
}

/// How a function object is invoked
#[derive(Clone)]
pub enum FunctionKind {
    /// Function defined in script
    Script {
        /// Parsed function
        node: Rc<FunctionNode>,
        /// Closure scope
        scope: Scope,
        /// Script the function was defined in
        source_url: Rc<str>,
    },
    /// Function implemented in Rust
    Native {
        /// Implementation
        function: NativeFunction,
        /// Whether `new` may be applied
        constructor: bool,
    },
    /// Result of `Function.prototype.bind`
    Bound {
        /// Wrapped function
        target: JsObject,
        /// Fixed `this`
        this: Value,
        /// Leading arguments
        arguments: Vec<Value>,
    },
}

/// Internal kind of an object
#[derive(Clone, Default)]
pub enum ObjectKind {
    /// Plain object
    #[default]
    Ordinary,
    /// Array with dense element storage
    Array(Vec<Value>),
    /// Callable object
    Function(FunctionKind),
    /// Error instance with the stack captured at creation
    Error(Vec<StackFrame>),
}

/// Object storage. Properties keep insertion order.
#[derive(Default)]
pub struct ObjectData {
    /// Internal kind
    pub kind: ObjectKind,
    properties: Vec<(Rc<str>, Property)>,
    /// Prototype link
    pub prototype: Option<JsObject>,
    /// Whether new properties may be added
    pub extensible: bool,
}

impl ObjectData {
    /// Creates storage with the given kind and prototype.
    pub fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            prototype,
            extensible: true,
        }
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.properties.iter().position(|(k, _)| &**k == key)
    }
}

/// Shared handle to a heap object.
#[derive(Clone)]
pub struct JsObject(pub(crate) Rc<RefCell<ObjectData>>);

impl JsObject {
    pub(crate) fn from_data(data: ObjectData) -> Self {
        JsObject(Rc::new(RefCell::new(data)))
    }

    /// Immutable access to the storage.
    pub fn borrow(&self) -> Ref<'_, ObjectData> {
        self.0.borrow()
    }

    /// Mutable access to the storage.
    pub fn borrow_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns true for functions.
    pub fn is_callable(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Function(_))
    }

    /// Returns true if `new` may be applied.
    pub fn is_constructor(&self) -> bool {
        match &self.borrow().kind {
            ObjectKind::Function(FunctionKind::Script { node, .. }) => !node.is_arrow,
            ObjectKind::Function(FunctionKind::Native { constructor, .. }) => *constructor,
            ObjectKind::Function(FunctionKind::Bound { target, .. }) => target.is_constructor(),
            _ => false,
        }
    }

    /// Returns true for arrays.
    pub fn is_array(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Array(_))
    }

    /// Returns true for error instances.
    pub fn is_error(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Error(_))
    }

    /// Copy of the elements if this is an array.
    pub fn array_elements(&self) -> Option<Vec<Value>> {
        match &self.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    /// Stack captured when this error object was created.
    pub fn error_frames(&self) -> Option<Vec<StackFrame>> {
        match &self.borrow().kind {
            ObjectKind::Error(frames) => Some(frames.clone()),
            _ => None,
        }
    }

    /// Prototype link.
    pub fn prototype(&self) -> Option<JsObject> {
        self.borrow().prototype.clone()
    }

    /// Own property lookup, including array indices and `length`.
    pub fn get_own_property(&self, key: &str) -> Option<Property> {
        let data = self.borrow();
        if let ObjectKind::Array(elements) = &data.kind {
            if key == "length" {
                return Some(Property::data(
                    Value::from(elements.len()),
                    PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
                ));
            }
            if let Some(index) = dense_index(key) {
                return elements
                    .get(index)
                    .map(|v| Property::data(v.clone(), PropertyAttributes::empty()));
            }
        }
        data.index_of(key).map(|i| data.properties[i].1.clone())
    }

    /// Lookup along the prototype chain.
    pub fn find_property(&self, key: &str) -> Option<Property> {
        let mut current = Some(self.clone());
        while let Some(object) = current {
            if let Some(property) = object.get_own_property(key) {
                return Some(property);
            }
            current = object.prototype();
        }
        None
    }

    /// Returns true if the property exists on this object or its prototypes.
    pub fn has_property(&self, key: &str) -> bool {
        self.find_property(key).is_some()
    }

    /// Returns true if the property exists on this object itself.
    pub fn has_own_property(&self, key: &str) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Defines or replaces an own property regardless of existing attributes.
    pub fn define_property(&self, key: &str, property: Property) {
        let mut data = self.borrow_mut();
        if let ObjectKind::Array(elements) = &mut data.kind {
            if let (Some(index), PropertySlot::Data(value)) = (dense_index(key), &property.slot) {
                if index >= elements.len() {
                    elements.resize(index + 1, Value::Undefined);
                }
                elements[index] = value.clone();
                return;
            }
            if key == "length" {
                if let PropertySlot::Data(Value::Number(n)) = &property.slot {
                    elements.resize((*n as usize).min(MAX_ARRAY_LENGTH), Value::Undefined);
                }
                return;
            }
        }
        match data.index_of(key) {
            Some(i) => data.properties[i].1 = property,
            None => data.properties.push((Rc::from(key), property)),
        }
    }

    /// Defines a data property with the given attributes.
    pub fn define_value(&self, key: &str, value: Value, attributes: PropertyAttributes) {
        self.define_property(key, Property::data(value, attributes));
    }

    /// Defines a writable, enumerable data property.
    pub fn set_value(&self, key: &str, value: impl Into<Value>) {
        self.define_value(key, value.into(), PropertyAttributes::empty());
    }

    /// Updates the value of an existing own data property, honoring READ_ONLY.
    ///
    /// Returns `None` if there is no own data property by that name, otherwise
    /// whether the write happened.
    pub(crate) fn write_own_data(&self, key: &str, value: Value) -> Option<bool> {
        let mut data = self.borrow_mut();
        if let ObjectKind::Array(elements) = &mut data.kind {
            if let Some(index) = dense_index(key) {
                if index >= elements.len() {
                    elements.resize(index + 1, Value::Undefined);
                }
                elements[index] = value;
                return Some(true);
            }
            if key == "length" {
                let len = (value.as_number().unwrap_or(0.0).max(0.0) as usize).min(MAX_ARRAY_LENGTH);
                elements.resize(len, Value::Undefined);
                return Some(true);
            }
        }
        let i = data.index_of(key)?;
        let property = &mut data.properties[i].1;
        if property.attributes.contains(PropertyAttributes::READ_ONLY) {
            return Some(false);
        }
        match &mut property.slot {
            PropertySlot::Data(slot) => {
                *slot = value;
                Some(true)
            }
            PropertySlot::Accessor { .. } => None,
        }
    }

    /// Deletes an own property. Returns false for DONT_DELETE properties.
    pub fn delete(&self, key: &str) -> bool {
        let mut data = self.borrow_mut();
        if let ObjectKind::Array(elements) = &mut data.kind {
            if key == "length" {
                return false;
            }
            if let Some(index) = dense_index(key) {
                if let Some(slot) = elements.get_mut(index) {
                    *slot = Value::Undefined;
                }
                return true;
            }
        }
        match data.index_of(key) {
            Some(i) if data.properties[i].1.attributes.contains(PropertyAttributes::DONT_DELETE) => false,
            Some(i) => {
                data.properties.remove(i);
                true
            }
            None => true,
        }
    }

    /// Own keys in order: array indices first, then insertion order.
    pub fn own_keys(&self) -> Vec<String> {
        let data = self.borrow();
        let mut keys = Vec::new();
        if let ObjectKind::Array(elements) = &data.kind {
            keys.extend((0..elements.len()).map(|i| i.to_string()));
        }
        keys.extend(data.properties.iter().map(|(k, _)| k.to_string()));
        keys
    }

    /// Own enumerable keys (what `Object.keys` returns).
    pub fn enumerable_own_keys(&self) -> Vec<String> {
        let data = self.borrow();
        let mut keys = Vec::new();
        if let ObjectKind::Array(elements) = &data.kind {
            keys.extend((0..elements.len()).map(|i| i.to_string()));
        }
        keys.extend(
            data.properties
                .iter()
                .filter(|(_, p)| p.is_enumerable())
                .map(|(k, _)| k.to_string()),
        );
        keys
    }

    /// Number of own named (non-index) properties.
    pub fn property_count(&self) -> usize {
        self.borrow().properties.len()
    }

    pub(crate) fn clear(&self) -> ObjectData {
        std::mem::take(&mut *self.borrow_mut())
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = match self.0.try_borrow() {
            Ok(data) => data,
            Err(_) => return f.write_str("Object(<borrowed>)"),
        };
        let kind = match &data.kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error(_) => "Error",
        };
        write!(f, "{}({} properties)", kind, data.properties.len())
    }
}

/// Largest length an array's element storage may grow to.
///
/// Writes past it are rejected by the interpreter with a `RangeError`; the
/// object layer itself keeps such indices as ordinary named properties.
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

fn dense_index(key: &str) -> Option<usize> {
    array_index(key).filter(|&index| index < MAX_ARRAY_LENGTH)
}

/// Parses a canonical array index ("0", "17", not "01" or "-1").
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || key.len() > 10 || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u64 = key.parse().ok()?;
    if index < u32::MAX as u64 {
        Some(index as usize)
    } else {
        None
    }
}
