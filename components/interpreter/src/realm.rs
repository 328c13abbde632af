//! Intrinsic objects shared by every script in a context.

use crate::heap::Heap;
use crate::object::{JsObject, ObjectData, ObjectKind, PropertyAttributes};
use crate::value::Value;
use core_types::ErrorKind;

/// Error kinds that get their own prototype and constructor.
pub const ERROR_KINDS: [ErrorKind; 5] = [
    ErrorKind::Error,
    ErrorKind::TypeError,
    ErrorKind::RangeError,
    ErrorKind::SyntaxError,
    ErrorKind::ReferenceError,
];

/// Prototypes and the global object.
///
/// Builtins populate these with methods; the interpreter only relies on the
/// prototype links and the `name`/`message` defaults of the error prototypes.
pub struct Intrinsics {
    /// The global object
    pub global: JsObject,
    /// `Object.prototype`
    pub object_prototype: JsObject,
    /// `Function.prototype`
    pub function_prototype: JsObject,
    /// `Array.prototype`
    pub array_prototype: JsObject,
    /// `String.prototype`
    pub string_prototype: JsObject,
    /// `Number.prototype`
    pub number_prototype: JsObject,
    /// `Boolean.prototype`
    pub boolean_prototype: JsObject,
    error_prototypes: Vec<(ErrorKind, JsObject)>,
}

impl Intrinsics {
    /// Allocates the intrinsic objects.
    pub fn new(heap: &mut Heap) -> Self {
        let object_prototype = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        let ordinary = |heap: &mut Heap| {
            heap.allocate(ObjectData::new(
                ObjectKind::Ordinary,
                Some(object_prototype.clone()),
            ))
        };
        let function_prototype = ordinary(heap);
        let string_prototype = ordinary(heap);
        let number_prototype = ordinary(heap);
        let boolean_prototype = ordinary(heap);
        let global = ordinary(heap);
        let array_prototype = heap.allocate(ObjectData::new(
            ObjectKind::Array(Vec::new()),
            Some(object_prototype.clone()),
        ));

        let hidden = PropertyAttributes::DONT_ENUM;
        let base_error = ordinary(heap);
        base_error.define_value("name", Value::from("Error"), hidden);
        base_error.define_value("message", Value::from(""), hidden);

        let mut error_prototypes = vec![(ErrorKind::Error, base_error.clone())];
        for kind in ERROR_KINDS.iter().skip(1) {
            let prototype = heap.allocate(ObjectData::new(
                ObjectKind::Ordinary,
                Some(base_error.clone()),
            ));
            prototype.define_value("name", Value::from(kind.name()), hidden);
            prototype.define_value("message", Value::from(""), hidden);
            error_prototypes.push((*kind, prototype));
        }

        let fixed = PropertyAttributes::READ_ONLY
            | PropertyAttributes::DONT_ENUM
            | PropertyAttributes::DONT_DELETE;
        global.define_value("undefined", Value::Undefined, fixed);
        global.define_value("NaN", Value::Number(f64::NAN), fixed);
        global.define_value("Infinity", Value::Number(f64::INFINITY), fixed);

        Self {
            global,
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            error_prototypes,
        }
    }

    /// Prototype for errors of `kind`; kinds without their own prototype
    /// share `Error.prototype`.
    pub fn error_prototype(&self, kind: ErrorKind) -> JsObject {
        self.error_prototypes
            .iter()
            .find(|(k, _)| *k == kind)
            .or_else(|| self.error_prototypes.first())
            .map(|(_, p)| p.clone())
            .unwrap_or_else(|| self.object_prototype.clone())
    }
}
