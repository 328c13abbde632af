//! Unit tests for the process lifecycle

use crate::common::{run, Script};
use node_process::{
    ConfigError, HostEnvironment, JsContext, Process, ProcessError, ProcessListener, ProcessOutcome, ProcessState,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn lifecycle_runs_start_about_to_exit_exit() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let result = run(&env, "order", Script::new("console.log('hello')"));

    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert_eq!(result.events, vec!["start", "about_to_exit 0", "exit 0"]);
    assert_eq!(result.console, vec!["hello"]);
}

#[test]
fn about_to_exit_waits_for_nested_callbacks() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new(
        "var trail = [];
         setTimeout(function () {
             trail.push('timer');
             setImmediate(function () {
                 trail.push('immediate');
                 process.nextTick(function () { trail.push('tick') });
             });
         }, 10);",
    )
    .on_done(|context| {
        assert_eq!(context.property("trail").to_string(), "timer,immediate,tick");
    });
    let result = run(&env, "nested", script);
    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
}

#[test]
fn exit_code_comes_from_process_exit() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new(
        "setTimeout(() => process.exit(5), 1);
         setTimeout(() => console.log('never'), 200);",
    );
    let result = run(&env, "exit", script);

    assert_eq!(result.outcome, ProcessOutcome::Exited(5));
    assert_eq!(result.events, vec!["start", "about_to_exit 5", "exit 5"]);
    assert!(result.console.is_empty());
}

#[test]
fn exit_code_comes_from_exit_code_property() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let result = run(&env, "code", Script::new("process.exitCode = 3"));
    assert_eq!(result.outcome, ProcessOutcome::Exited(3));
}

#[test]
fn synchronous_exit_skips_pending_callbacks() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new("setImmediate(() => console.log('late')); process.exit(2)");
    let result = run(&env, "sync-exit", script);

    assert_eq!(result.outcome, ProcessOutcome::Exited(2));
    assert!(result.console.is_empty());
}

#[test]
fn synchronous_throw_is_returned_to_the_listener() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let result = run(&env, "throw", Script::new("throw new Error('boom')"));

    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert!(result.events[1].starts_with("threw Error: boom"));
    assert_eq!(result.events.last().unwrap(), "exit 0");
}

#[test]
fn huge_array_index_is_a_catchable_range_error() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new(
        "var a = []; try { a[3000000000] = 1 } catch (e) { console.log(e.name, a.length) }
         a.length = 4294967295;",
    );
    let result = run(&env, "sparse", script);

    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert_eq!(result.console, vec!["RangeError 0"]);
    assert!(result.events[1].starts_with("threw RangeError: Invalid array length"));
    assert_eq!(result.events.last().unwrap(), "exit 0");
}

#[test]
fn runaway_recursion_is_a_range_error_at_default_depth() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new(
        "function down(n) { return down(n + 1) + 1 }
         try { down(0) } catch (e) { console.log(e.name, e.message) }",
    );
    let result = run(&env, "recurse", script);

    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert_eq!(result.console, vec!["RangeError Maximum call stack size exceeded"]);
}

#[test]
fn context_on_a_small_stack_needs_a_lower_depth() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path()).with_max_call_depth(32);
    let name = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let mut context = JsContext::new(&env, "small", Arc::new(builtins::CaptureSink::new())).unwrap();
            let value = context
                .evaluate_script("function f() { return f() } try { f() } catch (e) { e.name }")
                .unwrap();
            value.to_string()
        })
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(name, "RangeError");
}

#[test]
fn deeply_nested_source_is_a_syntax_error() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let source = format!("var x = {}1{}", "(".repeat(200_000), ")".repeat(200_000));
    let result = run(&env, "deep", Script::new(&source));

    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert!(result.events[1].starts_with("threw SyntaxError: Maximum nesting depth exceeded"));
    assert_eq!(result.events.last().unwrap(), "exit 0");
}

#[test]
fn uncaught_callback_exception_fails_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new("setTimeout(() => { throw new TypeError('late') }, 1)");
    let result = run(&env, "uncaught", script);

    match &result.outcome {
        ProcessOutcome::Failed(ProcessError::UncaughtException(error)) => {
            assert_eq!(error.message, "late");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(result.events.len(), 2);
    assert!(result.events[1].starts_with("failed uncaught exception"));
}

#[test]
fn listener_panic_fails_the_process() {
    struct Panicking;

    impl ProcessListener for Panicking {
        fn on_process_start(&mut self, _process: &Process, _context: &mut JsContext) {
            panic!("listener bug");
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let process = Process::new(&HostEnvironment::new(dir.path()), "panic", Panicking);
    assert_eq!(
        process.join(),
        ProcessOutcome::Failed(ProcessError::ListenerPanicked {
            hook: "on_process_start",
            message: "listener bug".to_string(),
        })
    );
    assert_eq!(process.state(), ProcessState::Failed);
}

#[test]
fn failed_check_in_about_to_exit_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new("var x = 1").on_done(|_| panic!("check failed"));
    let result = run(&env, "check", script);

    assert!(matches!(
        result.outcome,
        ProcessOutcome::Failed(ProcessError::ListenerPanicked {
            hook: "on_process_about_to_exit",
            ..
        })
    ));
    assert!(!result.events.iter().any(|e| e.starts_with("exit")));
}

#[test]
fn provisioning_failure_skips_start() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();
    let env = HostEnvironment::new(&blocker);
    let result = run(&env, "provision", Script::new("1"));

    assert!(matches!(
        result.outcome,
        ProcessOutcome::Failed(ProcessError::Provisioning { .. })
    ));
    assert_eq!(result.events.len(), 1);
    assert!(result.events[0].starts_with("failed failed to provision sandbox"));
}

#[test]
fn invalid_label_is_a_config_failure() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let result = run(&env, "../escape", Script::new("1"));

    assert!(matches!(
        result.outcome,
        ProcessOutcome::Failed(ProcessError::Config(ConfigError::Invalid { field: "label", .. }))
    ));
}

#[test]
fn cancel_interrupts_running_script() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new("while (true) {}");
    let events = script.events();
    let process = Process::new(&env, "spin", script);

    while process.state() == ProcessState::NotStarted {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(process.cancel());
    let outcome = process.join_timeout(Duration::from_secs(30)).unwrap();

    assert_eq!(outcome, ProcessOutcome::Failed(ProcessError::Cancelled));
    let events = events.lock().clone();
    assert_eq!(events.first().map(String::as_str), Some("start"));
    assert_eq!(events.last().map(String::as_str), Some("failed process was cancelled"));
    assert!(!process.cancel());
}

#[test]
fn cancel_stops_a_waiting_event_loop() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let process = Process::new(&env, "idle", Script::new("setTimeout(() => {}, 60000)"));

    assert!(process.join_timeout(Duration::from_millis(20)).is_none());
    process.cancel();
    assert_eq!(
        process.join_timeout(Duration::from_secs(30)),
        Some(ProcessOutcome::Failed(ProcessError::Cancelled))
    );
}

#[test]
fn cancel_is_refused_once_about_to_exit() {
    struct LateCancel {
        accepted: Arc<Mutex<Option<bool>>>,
    }

    impl ProcessListener for LateCancel {
        fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
            context.evaluate_script("process.exitCode = 0").unwrap();
        }

        fn on_process_about_to_exit(&mut self, process: &Process, _context: &mut JsContext, _code: i32) {
            assert_eq!(process.state(), ProcessState::AboutToExit);
            *self.accepted.lock() = Some(process.cancel());
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let accepted = Arc::new(Mutex::new(None));
    let listener = LateCancel {
        accepted: accepted.clone(),
    };
    let process = Process::new(&HostEnvironment::new(dir.path()), "late", listener);

    assert_eq!(process.join(), ProcessOutcome::Exited(0));
    assert_eq!(*accepted.lock(), Some(false));
    assert_eq!(process.state(), ProcessState::Exited);
}

#[test]
fn join_is_repeatable_and_process_is_shared() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let process = Process::new(&env, "shared", Script::new("process.exitCode = 1"));
    let other = process.clone();

    let waiter = thread::spawn(move || other.join());
    assert_eq!(process.join(), ProcessOutcome::Exited(1));
    assert_eq!(waiter.join().unwrap(), ProcessOutcome::Exited(1));
    assert_eq!(process.outcome(), Some(ProcessOutcome::Exited(1)));
    assert_eq!(process.state(), ProcessState::Exited);
}

#[test]
fn processes_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let a = Process::new(&env, "a", Script::new("1"));
    let b = Process::new(&env, "b", Script::new("1"));
    assert_ne!(a.id(), b.id());
    assert_eq!(a.label(), "a");
    assert!(a.join().is_success());
    assert!(b.join().is_success());
}
