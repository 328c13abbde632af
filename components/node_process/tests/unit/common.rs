//! Shared listener for process tests

use builtins::CaptureSink;
use node_process::{HostEnvironment, JsContext, Process, ProcessError, ProcessListener, ProcessOutcome};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub type Check = Box<dyn FnOnce(&mut JsContext) + Send>;

/// Evaluates a script on start and runs `check` against the drained context.
pub struct Script {
    source: String,
    check: Option<Check>,
    events: Arc<Mutex<Vec<String>>>,
}

impl Script {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            check: None,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on_done(mut self, check: impl FnOnce(&mut JsContext) + Send + 'static) -> Self {
        self.check = Some(Box::new(check));
        self
    }

    pub fn events(&self) -> Arc<Mutex<Vec<String>>> {
        self.events.clone()
    }
}

impl ProcessListener for Script {
    fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
        self.events.lock().push("start".to_string());
        if let Err(error) = context.evaluate_script(&self.source) {
            self.events.lock().push(format!("threw {}", error));
        }
    }

    fn on_process_about_to_exit(&mut self, _process: &Process, context: &mut JsContext, exit_code: i32) {
        self.events.lock().push(format!("about_to_exit {}", exit_code));
        if let Some(check) = self.check.take() {
            check(context);
        }
    }

    fn on_process_exit(&mut self, _process: &Process, exit_code: i32) {
        self.events.lock().push(format!("exit {}", exit_code));
    }

    fn on_process_failed(&mut self, _process: &Process, error: &ProcessError) {
        self.events.lock().push(format!("failed {}", error));
    }
}

pub struct Run {
    pub outcome: ProcessOutcome,
    pub events: Vec<String>,
    pub console: Vec<String>,
}

/// Runs `script` to completion in a process labelled `label`.
pub fn run(env: &HostEnvironment, label: &str, script: Script) -> Run {
    let events = script.events();
    let sink = Arc::new(CaptureSink::new());
    let process = Process::builder(env, label).console(sink.clone()).spawn(script);
    let outcome = process
        .join_timeout(Duration::from_secs(30))
        .expect("process did not finish");
    let events = events.lock().clone();
    Run {
        outcome,
        events,
        console: sink.lines(),
    }
}
