//! Unit tests for bridge objects

use crate::common::{run, Script};
use builtins::CaptureSink;
use interpreter::PropertyAttributes;
use node_process::bridge::{BridgeClass, BridgeError, BridgeObject, NativeValue, ValueType};
use node_process::{HostEnvironment, JsContext, ProcessOutcome};
use std::sync::{Arc, OnceLock};

fn foo_class() -> Arc<BridgeClass> {
    static CLASS: OnceLock<Arc<BridgeClass>> = OnceLock::new();
    CLASS
        .get_or_init(|| {
            BridgeClass::builder("Foo")
                .property::<i32>("x", PropertyAttributes::empty())
                .property::<String>("y", PropertyAttributes::empty())
                .property::<String>("read_only", PropertyAttributes::READ_ONLY)
                .method(
                    "incr",
                    PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE,
                    &[ValueType::Integer],
                    ValueType::Integer,
                    |_, args| match args {
                        [NativeValue::Integer(x)] => Ok(NativeValue::Integer(x.wrapping_add(1))),
                        _ => Err(BridgeError::Method("incr takes an integer".to_string())),
                    },
                )
                .method("total", PropertyAttributes::empty(), &[], ValueType::Double, |fields, _| {
                    let x = fields.get_as::<i32>("x").unwrap_or(0);
                    Ok(NativeValue::Double(f64::from(x) * 1.5))
                })
                .method("fail", PropertyAttributes::empty(), &[], ValueType::Any, |_, _| {
                    Err(BridgeError::Method("native failure".to_string()))
                })
                .build()
                .unwrap()
        })
        .clone()
}

fn context(dir: &std::path::Path) -> JsContext {
    JsContext::new(&HostEnvironment::new(dir), "bridge", Arc::new(CaptureSink::new())).unwrap()
}

#[test]
fn properties_stay_in_sync_in_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    let script = Script::new("var ready = true").on_done(|context| {
        let foo = BridgeObject::new(context, foo_class());
        context.set_property("foo", &foo);
        let x = foo.property::<i32>("x").unwrap();
        let y = foo.property::<String>("y").unwrap();

        context.evaluate_script("foo.x = 5; foo.y = 'test';").unwrap();
        assert_eq!(x.get(), Some(5));
        assert_eq!(y.get().as_deref(), Some("test"));

        assert!(x.set(6));
        assert!(y.set("test2".to_string()));
        assert_eq!(foo.script_property(context, "x").to_i32(), 6);
        assert_eq!(foo.script_property(context, "y").to_string(), "test2");
        assert_eq!(context.evaluate_script("foo.x").unwrap().to_i32(), 6);
        assert_eq!(context.evaluate_script("foo.y").unwrap().to_string(), "test2");

        context.evaluate_script("foo.x = 11").unwrap();
        assert_eq!(x.get(), Some(11));
        assert_eq!(context.evaluate_script("foo.incr(20)").unwrap().to_i32(), 21);

        let read_only = foo.property::<String>("read_only").unwrap();
        assert!(read_only.set("Ok!".to_string()));
        assert_eq!(read_only.get().as_deref(), Some("Ok!"));
        assert!(!read_only.set("Not Ok!".to_string()));
        assert_eq!(read_only.get().as_deref(), Some("Ok!"));
        context.evaluate_script("foo.read_only = 'boo';").unwrap();
        assert_eq!(read_only.get().as_deref(), Some("Ok!"));
    });
    let result = run(&HostEnvironment::new(dir.path()), "_", script);
    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
}

#[test]
fn method_attributes_are_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());
    context.set_property("foo", &foo);

    let value = context
        .evaluate_script("foo.incr = null; delete foo.incr; typeof foo.incr")
        .unwrap();
    assert_eq!(value.to_string(), "function");
    let keys = context.evaluate_script("Object.keys(foo).join(',')").unwrap();
    assert_eq!(keys.to_string(), "x,y,read_only,incr,total,fail");
}

#[test]
fn methods_see_fields_and_coerce_results() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());
    context.set_property("foo", &foo);

    assert!(foo.fields().set("x", 4));
    assert_eq!(context.evaluate_script("foo.total()").unwrap().to_number(), 6.0);
    assert_eq!(context.evaluate_script("foo.incr('41')").unwrap().to_i32(), 42);
    assert_eq!(context.evaluate_script("foo.incr(2.9)").unwrap().to_i32(), 3);
}

#[test]
fn coercion_failures_are_catchable_type_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());
    context.set_property("foo", &foo);

    let caught = |context: &mut JsContext, source: &str| {
        let wrapped = format!("try {{ {}; 'no error' }} catch (e) {{ e.name + ': ' + e.message }}", source);
        context.evaluate_script(&wrapped).unwrap().to_string()
    };
    assert_eq!(
        caught(&mut context, "foo.incr()"),
        "TypeError: Foo.incr expects 1 argument(s), got 0"
    );
    assert_eq!(
        caught(&mut context, "foo.incr('abc')"),
        "TypeError: argument 1 of Foo.incr expects an Integer, got abc"
    );
    assert_eq!(caught(&mut context, "foo.x = {}"), "TypeError: Foo.x expects an Integer, got [object Object]");
    assert_eq!(caught(&mut context, "foo.fail()"), "TypeError: native failure");
    assert_eq!(foo.fields().get("x"), Some(NativeValue::Integer(0)));
}

#[test]
fn nullable_strings_read_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());
    context.set_property("foo", &foo);

    let y = foo.property::<String>("y").unwrap();
    assert_eq!(y.get(), None);
    assert!(context.evaluate_script("foo.y === null").unwrap().to_bool());
    context.evaluate_script("foo.y = 'set'; foo.y = undefined").unwrap();
    assert_eq!(y.get(), None);
}

#[test]
fn typed_handles_check_the_declaration() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());

    assert_eq!(
        foo.property::<String>("x").err(),
        Some(BridgeError::TypeMismatch {
            name: "x".to_string(),
            declared: ValueType::Integer,
            requested: ValueType::String,
        })
    );
    assert!(matches!(
        foo.property::<i32>("z"),
        Err(BridgeError::UnknownMember { .. })
    ));
    assert_eq!(foo.property::<i32>("x").unwrap().name(), "x");
}

#[test]
fn objects_share_the_class_but_not_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let a = BridgeObject::new(&mut context, foo_class());
    let b = BridgeObject::new(&mut context, foo_class());
    context.set_property("a", &a);
    context.set_property("b", &b);

    context.evaluate_script("a.x = 1; b.x = 2").unwrap();
    assert_eq!(a.fields().get_as::<i32>("x"), Some(1));
    assert_eq!(b.fields().get_as::<i32>("x"), Some(2));
    assert!(Arc::ptr_eq(a.class(), b.class()));
}

#[test]
fn incr_adds_one_across_the_integer_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());
    context.set_property("foo", &foo);

    let edges = [i32::MIN, i32::MIN + 1, -1, 0, 1, i32::MAX - 2, i32::MAX - 1];
    let samples = (-5000..5000).step_by(37).chain((0..32).map(|shift| ((1i64 << shift) - 1) as i32));
    for x in edges.into_iter().chain(samples) {
        if x == i32::MAX {
            continue;
        }
        let result = context.evaluate_script(&format!("foo.incr({})", x)).unwrap();
        assert_eq!(result.to_number(), f64::from(x) + 1.0, "incr({})", x);
        assert_eq!(result.to_i32(), x + 1);
    }
}

#[test]
fn alternating_writes_stay_in_sync() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = context(dir.path());
    let foo = BridgeObject::new(&mut context, foo_class());
    context.set_property("foo", &foo);
    let x = foo.property::<i32>("x").unwrap();
    let y = foo.property::<String>("y").unwrap();

    for i in 0..300i32 {
        let value = i.wrapping_mul(7919) - 1_000_000;
        let text = format!("v{}-{}", i, value);
        if i % 3 == 0 {
            context
                .evaluate_script(&format!("foo.x = {}; foo.y = '{}'", value, text))
                .unwrap();
        } else {
            assert!(x.set(value));
            assert!(y.set(text.clone()));
        }
        assert_eq!(x.get(), Some(value), "native x after write {}", i);
        assert_eq!(y.get().as_deref(), Some(text.as_str()), "native y after write {}", i);
        assert_eq!(context.evaluate_script("foo.x").unwrap().to_i32(), value, "script x after write {}", i);
        assert_eq!(context.evaluate_script("foo.y").unwrap().to_string(), text, "script y after write {}", i);
    }
}
