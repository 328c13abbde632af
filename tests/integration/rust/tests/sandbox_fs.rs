//! Sandboxed file system integration tests
//!
//! Runs whole processes against real directories and checks what lands on
//! disk.

use builtins::CaptureSink;
use node_process::{
    HostEnvironment, JsContext, Process, ProcessError, ProcessListener, ProcessOutcome,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Runs a script and records the first synchronous error, if any.
struct Eval {
    source: String,
    error: Arc<Mutex<Option<String>>>,
}

impl Eval {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            error: Arc::new(Mutex::new(None)),
        }
    }
}

impl ProcessListener for Eval {
    fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
        if let Err(error) = context.evaluate_script(&self.source) {
            *self.error.lock() = Some(error.to_string());
        }
    }

    fn on_process_failed(&mut self, _process: &Process, error: &ProcessError) {
        *self.error.lock() = Some(error.to_string());
    }
}

fn spawn(env: &HostEnvironment, label: &str, source: &str) -> (Process, Arc<CaptureSink>, Arc<Mutex<Option<String>>>) {
    let listener = Eval::new(source);
    let error = listener.error.clone();
    let sink = Arc::new(CaptureSink::new());
    let process = Process::builder(env, label).console(sink.clone()).spawn(listener);
    (process, sink, error)
}

fn run(env: &HostEnvironment, label: &str, source: &str) -> (ProcessOutcome, Vec<String>) {
    let (process, sink, error) = spawn(env, label, source);
    let outcome = process.join_timeout(Duration::from_secs(30)).expect("process hung");
    assert_eq!(*error.lock(), None);
    (outcome, sink.lines())
}

/// Test: processes with different labels cannot see each other's files
#[test]
fn test_labels_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());

    let (outcome, _) = run(&env, "alice", "require('fs').writeFileSync('secret.txt', 'alice')");
    assert_eq!(outcome, ProcessOutcome::Exited(0));

    let (outcome, lines) = run(
        &env,
        "bob",
        "var fs = require('fs');
         console.log(fs.existsSync('secret.txt'), fs.existsSync('/home/secret.txt'));
         try { fs.readFileSync('../_alice/secret.txt') } catch (e) { console.log(e.code) }",
    );
    assert_eq!(outcome, ProcessOutcome::Exited(0));
    assert_eq!(lines, vec!["false false", "EACCES"]);

    let alice = env.home_dir("alice").join("secret.txt");
    assert_eq!(std::fs::read_to_string(alice).unwrap(), "alice");
    assert!(!env.home_dir("bob").join("secret.txt").exists());
}

/// Test: a later process with the same label sees earlier writes
#[test]
fn test_home_survives_process_exit() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());

    let (outcome, _) = run(
        &env,
        "journal",
        "require('fs').mkdir('logs', function (err) {
             if (err) throw err;
             require('fs').appendFile('logs/day1.txt', 'first\\n', function (err) { if (err) throw err });
         })",
    );
    assert_eq!(outcome, ProcessOutcome::Exited(0));

    let (outcome, lines) = run(
        &env,
        "journal",
        "var fs = require('fs');
         fs.appendFileSync('logs/day1.txt', 'second\\n');
         console.log(fs.readdirSync('logs').join());
         console.log(fs.readFileSync('logs/day1.txt').trim().split('\\n').length)",
    );
    assert_eq!(outcome, ProcessOutcome::Exited(0));
    assert_eq!(lines, vec!["day1.txt", "2"]);
}

/// Test: escapes through absolute paths and dot segments all map to EACCES
#[test]
fn test_escape_attempts_are_denied() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let (outcome, lines) = run(
        &env,
        "_",
        "var fs = require('fs');
         var attempts = ['/etc/passwd', '../../x', '/home/../x', '/home/./../../x', '/x/y'];
         attempts.forEach(function (path) {
             try { fs.writeFileSync(path, 'x'); console.log('wrote ' + path) }
             catch (e) { console.log(e.code + ' ' + e.errno) }
         })",
    );
    assert_eq!(outcome, ProcessOutcome::Exited(0));
    assert_eq!(lines, vec!["EACCES -13"; 5]);
    assert!(!dir.path().join("x").exists());
}

/// Test: independent processes run concurrently on their own threads
#[test]
fn test_concurrent_processes() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());

    let processes: Vec<_> = (0..4)
        .map(|i| {
            let source = format!(
                "var fs = require('fs'); for (var i = 0; i < 20; i++) fs.appendFileSync('n.txt', '{}');",
                i
            );
            spawn(&env, &format!("worker{}", i), &source)
        })
        .collect();

    for (i, (process, _, error)) in processes.into_iter().enumerate() {
        let outcome = process.join_timeout(Duration::from_secs(30)).expect("process hung");
        assert_eq!(outcome, ProcessOutcome::Exited(0));
        assert_eq!(*error.lock(), None);
        let written = std::fs::read_to_string(env.home_dir(&format!("worker{}", i)).join("n.txt")).unwrap();
        assert_eq!(written, i.to_string().repeat(20));
    }
}
