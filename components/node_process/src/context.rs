//! The script context a process hands to its listener.

use crate::config::HostEnvironment;
use crate::error::ProcessResult;
use crate::globals::{self, exit_code_of, HostState};
use crate::sandbox::Sandbox;
use async_runtime::{EventLoopConfig, LoopHandle, RunOutcome};
use builtins::ConsoleSink;
use core_types::{ErrorKind, JsError};
use interpreter::{to_int32, Exception, Interpreter, InterpreterConfig, JsObject, Value};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// A script value read out of a context.
///
/// String and number conversions run when the value is read, while the
/// context is still live, so a `ScriptValue` stays usable after the
/// context is disposed.
#[derive(Debug, Clone)]
pub struct ScriptValue {
    value: Value,
    text: String,
    number: f64,
}

impl ScriptValue {
    pub(crate) fn new(interp: &mut Interpreter, value: Value) -> Self {
        let text = match interp.to_js_string(&value) {
            Ok(text) => text.to_string(),
            Err(_) => interp.display_string(&value),
        };
        let number = interp.to_number(&value).unwrap_or(f64::NAN);
        Self {
            value,
            text,
            number,
        }
    }

    /// The underlying value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the wrapper.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Script `ToNumber`.
    pub fn to_number(&self) -> f64 {
        self.number
    }

    /// Script `ToInt32`.
    pub fn to_i32(&self) -> i32 {
        to_int32(self.number)
    }

    /// Script truthiness.
    pub fn to_bool(&self) -> bool {
        self.value.is_truthy()
    }

    /// Script `ToString`.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True for `undefined`.
    pub fn is_undefined(&self) -> bool {
        self.value.is_undefined()
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// How the event loop stopped.
#[derive(Debug)]
pub(crate) enum Settled {
    Idle,
    Exited(i32),
    Interrupted,
    Uncaught(JsError),
}

/// The live global environment of one process.
///
/// A context is created on the process thread and never leaves it; the
/// listener receives it by reference. It is disposed after
/// `on_process_about_to_exit` returns, and every later evaluation fails.
///
/// # Examples
///
/// ```
/// use builtins::LogSink;
/// use node_process::{HostEnvironment, JsContext};
/// use std::sync::Arc;
///
/// let dir = tempfile::tempdir().unwrap();
/// let env = HostEnvironment::new(dir.path()).with_max_call_depth(64);
/// let mut context = JsContext::new(&env, "doc", Arc::new(LogSink)).unwrap();
///
/// context.set_property("base", 20);
/// let result = context.evaluate_script("base + 1").unwrap();
/// assert_eq!(result.to_i32(), 21);
/// assert_eq!(context.property("base").to_string(), "20");
/// ```
pub struct JsContext {
    interp: Interpreter,
    host: Rc<HostState>,
    process: JsObject,
    sandbox: Arc<Sandbox>,
    label: String,
}

impl JsContext {
    /// Provisions the sandbox for `label` and boots a runtime in it.
    ///
    /// Script recursion runs on the native stack of the calling thread. The
    /// default `max_call_depth` of 512 needs a thread with
    /// [`DEFAULT_STACK_SIZE`](crate::DEFAULT_STACK_SIZE), which is what
    /// [`Process`](crate::Process) spawns. Callers running scripts on a
    /// smaller stack must lower `max_call_depth` to match, or deep
    /// recursion overflows the thread instead of raising a `RangeError`.
    pub fn new(env: &HostEnvironment, label: &str, console: Arc<dyn ConsoleSink>) -> ProcessResult<Self> {
        env.validate()?;
        let sandbox = Arc::new(Sandbox::provision(env, label)?);

        let mut interp = Interpreter::with_config(InterpreterConfig {
            max_call_depth: env.max_call_depth,
            event_loop: EventLoopConfig {
                worker_threads: env.io_threads,
                thread_name: format!("corten-io-{}", label),
            },
        });
        interp.event_loop_mut().start_workers()?;
        builtins::install(&mut interp, console);

        let host = Rc::new(HostState::default());
        let process = globals::install(&mut interp, &host, &sandbox, env);
        log::debug!("context '{}' ready", label);

        Ok(Self {
            interp,
            host,
            process,
            sandbox,
            label: label.to_string(),
        })
    }

    /// The process label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The file system roots of this context.
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// The global object.
    pub fn global(&self) -> JsObject {
        self.interp.global()
    }

    /// The underlying interpreter.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// The underlying interpreter, for native functions and objects.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interp
    }

    /// Reads a global, running getters.
    ///
    /// A getter that throws reads as `undefined`.
    pub fn property(&mut self, name: &str) -> ScriptValue {
        let global = Value::Object(self.interp.global());
        let value = match self.interp.get_property(&global, name) {
            Ok(value) => value,
            Err(exception) => {
                let error = self.interp.exception_to_error(exception);
                log::warn!("reading global '{}' failed: {}", name, error);
                Value::Undefined
            }
        };
        ScriptValue::new(&mut self.interp, value)
    }

    /// Assigns a global, running setters.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) {
        let global = Value::Object(self.interp.global());
        if let Err(exception) = self.interp.set_property(&global, name, value.into()) {
            let error = self.interp.exception_to_error(exception);
            log::warn!("assigning global '{}' failed: {}", name, error);
        }
    }

    /// Evaluates `source` as a script.
    ///
    /// An uncaught exception comes back as the error; it does not end the
    /// process.
    pub fn evaluate_script(&mut self, source: &str) -> Result<ScriptValue, JsError> {
        self.evaluate_script_named(source, "<eval>")
    }

    /// Evaluates `source`, naming it `url` in stack traces.
    pub fn evaluate_script_named(&mut self, source: &str, url: &str) -> Result<ScriptValue, JsError> {
        match self.interp.run_script(source, url) {
            Ok(value) => Ok(ScriptValue::new(&mut self.interp, value)),
            Err(exception) => Err(self.interp.exception_to_error(exception)),
        }
    }

    /// Runs pending callbacks, timers and I/O completions until none remain.
    ///
    /// `process.exit` stops the loop and is reported as a termination error.
    pub fn drain_event_loop(&mut self) -> Result<(), JsError> {
        match self.settle() {
            Settled::Idle => Ok(()),
            Settled::Exited(code) => Err(JsError::new(
                ErrorKind::Termination,
                format!("process exited with code {}", code),
            )),
            Settled::Interrupted => Err(JsError::termination()),
            Settled::Uncaught(error) => Err(error),
        }
    }

    pub(crate) fn settle(&mut self) -> Settled {
        if let Some(code) = self.exit_requested() {
            return Settled::Exited(code);
        }
        match self.interp.run_event_loop() {
            Ok(RunOutcome::Idle) => Settled::Idle,
            Ok(RunOutcome::Interrupted) | Err(Exception::Terminated) => Settled::Interrupted,
            Err(Exception::Exit(code)) => Settled::Exited(code),
            Err(exception) => Settled::Uncaught(self.interp.exception_to_error(exception)),
        }
    }

    /// The code passed to `process.exit`, once it was called.
    pub fn exit_requested(&self) -> Option<i32> {
        self.host.exit_code.get()
    }

    /// Ends the process with `code` as if script had called `process.exit`.
    /// Pending callbacks are dropped.
    pub fn request_exit(&mut self, code: i32) {
        if self.host.exit_code.get().is_none() {
            self.host.exit_code.set(Some(code));
        }
    }

    /// The status the process exits with: the `process.exit` argument, else
    /// `process.exitCode`, else 0.
    pub fn exit_code(&mut self) -> i32 {
        if let Some(code) = self.exit_requested() {
            return code;
        }
        let process = Value::Object(self.process.clone());
        let result = self
            .interp
            .get_property(&process, "exitCode")
            .and_then(|value| exit_code_of(&mut self.interp, &value));
        result.unwrap_or_else(|exception| {
            log::warn!("process.exitCode is unusable: {:?}", exception);
            1
        })
    }

    /// Interrupts running script and the event loop from any thread.
    pub fn loop_handle(&self) -> LoopHandle {
        self.interp.loop_handle()
    }

    /// True once the context has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.interp.is_torn_down()
    }

    /// Drops pending callbacks, stops the I/O workers and frees every
    /// script object.
    pub(crate) fn dispose(&mut self) {
        if !self.is_disposed() {
            self.interp.teardown();
            log::debug!("context '{}' disposed", self.label);
        }
    }
}

impl fmt::Debug for JsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsContext")
            .field("label", &self.label)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
