//! Bridge object integration tests
//!
//! Native state exposed to scripts through a process listener, mutated by
//! asynchronous callbacks and read back after the loop drains.

use builtins::CaptureSink;
use interpreter::PropertyAttributes;
use node_process::bridge::{BridgeClass, BridgeError, BridgeObject, NativeValue, Property, ValueType};
use node_process::{HostEnvironment, JsContext, Process, ProcessListener, ProcessOutcome};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

fn counter_class() -> Arc<BridgeClass> {
    BridgeClass::builder("Counter")
        .property::<i32>("count", PropertyAttributes::empty())
        .property::<String>("owner", PropertyAttributes::READ_ONLY)
        .property::<f64>("ratio", PropertyAttributes::DONT_ENUM)
        .method("add", PropertyAttributes::empty(), &[ValueType::Integer], ValueType::Integer, |fields, args| {
            let step = match args {
                [NativeValue::Integer(step)] => *step,
                _ => return Err(BridgeError::Method("add takes an integer".to_string())),
            };
            let next = fields.get_as::<i32>("count").unwrap_or(0).wrapping_add(step);
            fields.set("count", next);
            Ok(NativeValue::Integer(next))
        })
        .build()
        .unwrap()
}

thread_local! {
    // Bridge handles are tied to the process thread.
    static HANDLES: RefCell<Option<(BridgeObject, Property<i32>)>> = const { RefCell::new(None) };
}

/// Exposes a Counter as `counter` and reads its fields back natively.
struct Host {
    source: &'static str,
    count: Arc<Mutex<Option<i32>>>,
    owner: Arc<Mutex<Option<String>>>,
}

impl Host {
    fn new(source: &'static str) -> Self {
        Self {
            source,
            count: Arc::new(Mutex::new(None)),
            owner: Arc::new(Mutex::new(None)),
        }
    }
}

impl ProcessListener for Host {
    fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
        let counter = BridgeObject::new(context, counter_class());
        assert!(counter.property::<String>("owner").unwrap().set("host".to_string()));
        context.set_property("counter", &counter);
        let count = counter.property::<i32>("count").unwrap();
        HANDLES.with(|handles| *handles.borrow_mut() = Some((counter, count)));
        context.evaluate_script(self.source).unwrap();
    }

    fn on_process_about_to_exit(&mut self, _process: &Process, _context: &mut JsContext, _exit_code: i32) {
        if let Some((counter, count)) = HANDLES.with(|handles| handles.borrow_mut().take()) {
            *self.count.lock() = count.get();
            *self.owner.lock() = counter.property::<String>("owner").ok().and_then(|p| p.get());
        }
    }
}

fn run(source: &'static str) -> (ProcessOutcome, Option<i32>, Option<String>, Vec<String>) {
    let dir = tempfile::tempdir().unwrap();
    let host = Host::new(source);
    let (count, owner) = (host.count.clone(), host.owner.clone());
    let sink = Arc::new(CaptureSink::new());
    let process = Process::builder(&HostEnvironment::new(dir.path()), "bridge")
        .console(sink.clone())
        .spawn(host);
    let outcome = process.join_timeout(Duration::from_secs(30)).expect("process hung");
    let (count, owner) = (*count.lock(), owner.lock().clone());
    (outcome, count, owner, sink.lines())
}

/// Test: timers and file callbacks update native fields
#[test]
fn test_async_callbacks_update_native_state() {
    let (outcome, count, owner, lines) = run(
        "counter.count = 1;
         setTimeout(function () { counter.add(10) }, 5);
         require('fs').writeFile('x.txt', 'x', function (err) {
             counter.add(err ? -100 : 100);
             console.log('written', counter.count);
         });
         counter.owner = 'script';",
    );
    assert_eq!(outcome, ProcessOutcome::Exited(0));
    assert_eq!(count, Some(111));
    assert_eq!(owner.as_deref(), Some("host"));
    assert!(lines == ["written 101"] || lines == ["written 111"], "{:?}", lines);
}

/// Test: a failing coercion is catchable and leaves the field untouched
#[test]
fn test_bad_assignment_is_catchable() {
    let (outcome, count, _, lines) = run(
        "counter.count = 3;
         try { counter.count = 'many' } catch (e) { console.log(e.name) }
         try { counter.add() } catch (e) { console.log(e.message) }
         console.log(Object.keys(counter).join())",
    );
    assert_eq!(outcome, ProcessOutcome::Exited(0));
    assert_eq!(count, Some(3));
    assert_eq!(
        lines,
        vec![
            "TypeError",
            "Counter.add expects 1 argument(s), got 0",
            "count,owner,add"
        ]
    );
}

/// Test: an exception from a bridged call in a callback fails the process
#[test]
fn test_uncaught_bridge_error_fails_process() {
    let (outcome, count, _, _) = run("setTimeout(function () { counter.add('x') }, 0)");
    assert!(matches!(outcome, ProcessOutcome::Failed(node_process::ProcessError::UncaughtException(_))));
    assert_eq!(count, None);
}
