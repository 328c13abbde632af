//! Native objects mirrored into a script context.

use super::class::{BridgeClass, BridgeError, MethodDecl};
use super::types::{coerce, BridgeType, NativeValue, ValueType};
use crate::context::{JsContext, ScriptValue};
use interpreter::{Exception, Interpreter, JsObject, Property as ScriptProperty, PropertyAttributes, ScriptResult, Value};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

/// Who is writing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Native,
    Script,
}

#[derive(Debug)]
struct FieldCell {
    value: NativeValue,
    value_type: ValueType,
    read_only: bool,
    initialized: bool,
}

impl FieldCell {
    /// Read-only cells take the first native write and nothing after it.
    fn accepts(&self, origin: Origin) -> bool {
        !self.read_only || (origin == Origin::Native && !self.initialized)
    }

    fn write(&mut self, value: NativeValue, origin: Origin) -> bool {
        if !self.accepts(origin) {
            return false;
        }
        self.value = value;
        self.initialized = true;
        true
    }
}

/// The field storage of one bridge object, shared by its native handles and
/// its script accessors.
#[derive(Debug)]
pub struct Fields {
    class: Arc<BridgeClass>,
    cells: RefCell<Vec<FieldCell>>,
}

impl Fields {
    fn new(class: Arc<BridgeClass>) -> Self {
        let cells = class
            .properties()
            .iter()
            .map(|decl| FieldCell {
                value: decl.value_type.default_value(),
                value_type: decl.value_type,
                read_only: decl.is_read_only(),
                initialized: false,
            })
            .collect();
        Self {
            class,
            cells: RefCell::new(cells),
        }
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<NativeValue> {
        let index = self.class.property_index(name)?;
        Some(self.value_at(index))
    }

    /// Current value of `name` as a `T`.
    pub fn get_as<T: BridgeType>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|value| T::from_native(&value))
    }

    /// Writes `name` natively. Returns whether the write was applied.
    pub fn set<T: BridgeType>(&self, name: &str, value: T) -> bool {
        match self.class.property_index(name) {
            Some(index) => self.write_native(index, value.into_native()),
            None => false,
        }
    }

    fn value_at(&self, index: usize) -> NativeValue {
        self.cells.borrow()[index].value.clone()
    }

    fn write_native(&self, index: usize, value: NativeValue) -> bool {
        let mut cells = self.cells.borrow_mut();
        let cell = &mut cells[index];
        match value.conform(cell.value_type) {
            Some(value) => cell.write(value, Origin::Native),
            None => false,
        }
    }

    fn accepts_script(&self, index: usize) -> bool {
        self.cells.borrow()[index].accepts(Origin::Script)
    }

    fn write_script(&self, index: usize, value: NativeValue) -> bool {
        self.cells.borrow_mut()[index].write(value, Origin::Script)
    }
}

/// A native handle on one declared property.
///
/// Reads and writes go through the same cell the script accessors use.
pub struct Property<T> {
    fields: Rc<Fields>,
    index: usize,
    marker: PhantomData<T>,
}

impl<T: BridgeType> Property<T> {
    pub fn name(&self) -> &str {
        &self.fields.class.properties()[self.index].name
    }

    /// The current value; `None` while it is null.
    pub fn get(&self) -> Option<T> {
        T::from_native(&self.fields.value_at(self.index))
    }

    /// Writes the value. Returns false when the property is read-only and
    /// already initialized.
    pub fn set(&self, value: T) -> bool {
        self.fields.write_native(self.index, value.into_native())
    }
}

/// A native object whose declared properties and methods are visible to
/// script.
///
/// Each property is an accessor over a shared cell, so a write on either
/// side is seen by the next read on the other. Script writes to read-only
/// properties are ignored without an error.
pub struct BridgeObject {
    class: Arc<BridgeClass>,
    fields: Rc<Fields>,
    object: JsObject,
}

impl BridgeObject {
    /// Creates the script object for `class` in `context`.
    pub fn new(context: &mut JsContext, class: Arc<BridgeClass>) -> Self {
        let fields = Rc::new(Fields::new(class.clone()));
        let interp = context.interpreter_mut();
        let object = interp.create_object();

        for (index, decl) in class.properties().iter().enumerate() {
            let getter = {
                let fields = fields.clone();
                interp.create_function(&format!("get {}", decl.name), 0, move |_, _, _| {
                    Ok(fields.value_at(index).to_script())
                })
            };
            let setter = {
                let fields = fields.clone();
                let what = format!("{}.{}", class.name(), decl.name);
                let value_type = decl.value_type;
                interp.create_function(&format!("set {}", decl.name), 1, move |interp, _, args| {
                    if !fields.accepts_script(index) {
                        return Ok(Value::Undefined);
                    }
                    let value = args.first().cloned().unwrap_or_default();
                    let native = coerce(interp, &value, value_type, &what)?;
                    fields.write_script(index, native);
                    Ok(Value::Undefined)
                })
            };
            let attributes = decl.attributes - PropertyAttributes::READ_ONLY;
            object.define_property(
                &decl.name,
                ScriptProperty::accessor(Some(getter), Some(setter), attributes),
            );
        }

        for method in class.methods() {
            let function = native_method(interp, class.name(), method, fields.clone());
            object.define_value(&method.name, Value::Object(function), method.attributes);
        }

        log::trace!("bridged {} into context '{}'", class.name(), context.label());
        Self {
            class,
            fields,
            object,
        }
    }

    /// A typed handle on the property `name`.
    pub fn property<T: BridgeType>(&self, name: &str) -> Result<Property<T>, BridgeError> {
        let index = self
            .class
            .property_index(name)
            .ok_or_else(|| self.class.unknown(name))?;
        let declared = self.class.properties()[index].value_type;
        if declared != ValueType::Any && declared != T::VALUE_TYPE {
            return Err(BridgeError::TypeMismatch {
                name: name.to_string(),
                declared,
                requested: T::VALUE_TYPE,
            });
        }
        Ok(Property {
            fields: self.fields.clone(),
            index,
            marker: PhantomData,
        })
    }

    /// Reads `name` the way script would, through the object's accessors.
    pub fn script_property(&self, context: &mut JsContext, name: &str) -> ScriptValue {
        let interp = context.interpreter_mut();
        let base = Value::Object(self.object.clone());
        let value = interp.get_property(&base, name).unwrap_or_else(|exception| {
            log::warn!("reading {}.{} failed: {:?}", self.class.name(), name, exception);
            Value::Undefined
        });
        ScriptValue::new(interp, value)
    }

    /// The script object.
    pub fn object(&self) -> &JsObject {
        &self.object
    }

    pub fn class(&self) -> &Arc<BridgeClass> {
        &self.class
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl From<&BridgeObject> for Value {
    fn from(object: &BridgeObject) -> Self {
        Value::Object(object.object.clone())
    }
}

fn native_method(interp: &mut Interpreter, class: &str, method: &MethodDecl, fields: Rc<Fields>) -> JsObject {
    let method = method.clone();
    let qualified = format!("{}.{}", class, method.name);
    let length = method.params.len();
    interp.create_function(&method.name.clone(), length, move |interp, _, args| {
        call_native(interp, &qualified, &method, &fields, args)
    })
}

fn call_native(
    interp: &mut Interpreter,
    qualified: &str,
    method: &MethodDecl,
    fields: &Fields,
    args: &[Value],
) -> ScriptResult<Value> {
    if args.len() < method.params.len() {
        return Err(type_error(BridgeError::Arity {
            name: qualified.to_string(),
            expected: method.params.len(),
            found: args.len(),
        }));
    }
    let mut natives = Vec::with_capacity(method.params.len());
    for (position, (ty, arg)) in method.params.iter().zip(args).enumerate() {
        let what = format!("argument {} of {}", position + 1, qualified);
        natives.push(coerce(interp, arg, *ty, &what)?);
    }

    let result = (method.function)(fields, &natives).map_err(type_error)?;
    match result.conform(method.returns) {
        Some(value) => Ok(value.to_script()),
        None => Err(type_error(BridgeError::Method(format!(
            "{} must return {}",
            qualified, method.returns
        )))),
    }
}

fn type_error(error: BridgeError) -> Exception {
    Exception::type_error(error.to_string())
}
