//! Process lifecycle: a dedicated thread owning one script context.
//!
//! A [`Process`] provisions its sandbox and boots its context on its own
//! thread, hands the live context to the listener, drains the event loop and
//! then reports exactly one terminal outcome. Callers on other threads wait
//! for that outcome with [`Process::join`].

use crate::config::HostEnvironment;
use crate::context::{JsContext, Settled};
use crate::error::ProcessError;
use async_runtime::LoopHandle;
use builtins::{ConsoleSink, LogSink};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Stack reserved for a process thread; the tree-walking evaluator recurses
/// once per script call frame.
pub const DEFAULT_STACK_SIZE: usize = 32 * 1024 * 1024;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Where a process is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    NotStarted,
    Running,
    AboutToExit,
    Exited,
    Failed,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Exited | ProcessState::Failed)
    }
}

/// How a process ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The event loop drained or `process.exit` was called
    Exited(i32),
    /// See [`ProcessError`]
    Failed(ProcessError),
}

impl ProcessOutcome {
    /// The exit status, if the process exited.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessOutcome::Exited(code) => Some(*code),
            ProcessOutcome::Failed(_) => None,
        }
    }

    /// Returns true for `Exited(0)`.
    pub fn is_success(&self) -> bool {
        self.exit_code() == Some(0)
    }
}

/// Lifecycle callbacks, all invoked on the process thread and never
/// concurrently.
///
/// A run produces either `start`, `about_to_exit`, `exit`, or a single
/// `failed` (possibly after `start`). `exit` and `failed` never both fire.
pub trait ProcessListener: Send {
    /// The context is live; evaluate the program here.
    fn on_process_start(&mut self, process: &Process, context: &mut JsContext);

    /// The event loop has drained. The context is still readable and is
    /// disposed when this returns.
    fn on_process_about_to_exit(&mut self, _process: &Process, _context: &mut JsContext, _exit_code: i32) {}

    /// The context is gone. Joiners are released after this returns.
    fn on_process_exit(&mut self, _process: &Process, _exit_code: i32) {}

    /// The process failed before it could exit.
    fn on_process_failed(&mut self, _process: &Process, _error: &ProcessError) {}
}

type ListenerSlot = Arc<Mutex<Option<Box<dyn ProcessListener>>>>;

struct Status {
    state: ProcessState,
    outcome: Option<ProcessOutcome>,
}

struct Shared {
    id: u64,
    label: String,
    status: Mutex<Status>,
    finished: Condvar,
    cancelled: AtomicBool,
    interrupt: Mutex<Option<LoopHandle>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// A handle on a running script process. Cloning shares the process.
///
/// # Examples
///
/// ```
/// use node_process::{HostEnvironment, JsContext, Process, ProcessListener};
///
/// struct Hello;
///
/// impl ProcessListener for Hello {
///     fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
///         context.evaluate_script("setTimeout(() => { process.exitCode = 3 }, 1)").unwrap();
///     }
/// }
///
/// let dir = tempfile::tempdir().unwrap();
/// let process = Process::new(&HostEnvironment::new(dir.path()), "hello", Hello);
/// assert_eq!(process.join().exit_code(), Some(3));
/// ```
#[derive(Clone)]
pub struct Process {
    shared: Arc<Shared>,
}

impl Process {
    /// Starts a process with the default console sink.
    pub fn new(env: &HostEnvironment, label: &str, listener: impl ProcessListener + 'static) -> Self {
        Self::builder(env, label).spawn(listener)
    }

    /// Configures a process before starting it.
    pub fn builder(env: &HostEnvironment, label: &str) -> ProcessBuilder {
        ProcessBuilder {
            env: env.clone(),
            label: label.to_string(),
            console: Arc::new(LogSink),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    pub fn state(&self) -> ProcessState {
        self.shared.status.lock().state
    }

    /// The terminal outcome, once there is one.
    pub fn outcome(&self) -> Option<ProcessOutcome> {
        self.shared.status.lock().outcome.clone()
    }

    /// Blocks until the process exits or fails.
    ///
    /// Must not be called from a listener callback of the same process.
    pub fn join(&self) -> ProcessOutcome {
        let outcome = {
            let mut status = self.shared.status.lock();
            loop {
                if let Some(outcome) = &status.outcome {
                    break outcome.clone();
                }
                self.shared.finished.wait(&mut status);
            }
        };
        self.reap();
        outcome
    }

    /// Like [`Process::join`], giving up after `timeout`.
    pub fn join_timeout(&self, timeout: Duration) -> Option<ProcessOutcome> {
        let deadline = Instant::now() + timeout;
        let outcome = {
            let mut status = self.shared.status.lock();
            loop {
                if let Some(outcome) = &status.outcome {
                    break outcome.clone();
                }
                if self.shared.finished.wait_until(&mut status, deadline).timed_out() {
                    return status.outcome.clone();
                }
            }
        };
        self.reap();
        Some(outcome)
    }

    /// Interrupts running script and fails the process with
    /// [`ProcessError::Cancelled`].
    ///
    /// Only a process that has not yet reached `AboutToExit` can be
    /// cancelled. Past that point the exit code is already decided and this
    /// returns false, as it does for a finished process.
    pub fn cancel(&self) -> bool {
        {
            let status = self.shared.status.lock();
            if !matches!(status.state, ProcessState::NotStarted | ProcessState::Running) {
                return false;
            }
            self.shared.cancelled.store(true, Ordering::SeqCst);
        }
        if let Some(handle) = self.shared.interrupt.lock().as_ref() {
            handle.interrupt();
        }
        log::debug!("process {} ({}) cancel requested", self.id(), self.label());
        true
    }

    fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    fn reap(&self) {
        let handle = self.shared.thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                log::error!("process {} thread panicked", self.id());
            }
        }
    }

    fn set_state(&self, state: ProcessState) {
        self.shared.status.lock().state = state;
    }

    /// Moves to `AboutToExit` unless a cancel got in first.
    fn begin_exit(&self) -> bool {
        let mut status = self.shared.status.lock();
        if self.is_cancelled() {
            return false;
        }
        status.state = ProcessState::AboutToExit;
        true
    }

    fn finish(&self, outcome: ProcessOutcome) {
        let mut status = self.shared.status.lock();
        if status.outcome.is_none() {
            status.state = match outcome {
                ProcessOutcome::Exited(_) => ProcessState::Exited,
                ProcessOutcome::Failed(_) => ProcessState::Failed,
            };
            status.outcome = Some(outcome);
        }
        self.shared.finished.notify_all();
    }

    fn fail(&self, listener: &mut dyn ProcessListener, error: ProcessError) {
        log::error!("process {} ({}) failed: {}", self.id(), self.label(), error);
        self.set_state(ProcessState::Failed);
        if let Err(message) = guarded(|| listener.on_process_failed(self, &error)) {
            log::error!("on_process_failed panicked: {}", message);
        }
        self.finish(ProcessOutcome::Failed(error));
    }

    fn fail_with_context(&self, listener: &mut dyn ProcessListener, context: &mut JsContext, error: ProcessError) {
        context.dispose();
        self.fail(listener, error);
    }

    fn run(&self, env: HostEnvironment, console: Arc<dyn ConsoleSink>, slot: ListenerSlot) {
        let _guard = AbortGuard(self.clone());
        let mut listener = match slot.lock().take() {
            Some(listener) => listener,
            None => return,
        };
        let listener = listener.as_mut();

        let mut context = match JsContext::new(&env, self.label(), console) {
            Ok(context) => context,
            Err(error) => return self.fail(listener, error),
        };
        *self.shared.interrupt.lock() = Some(context.loop_handle());
        if self.is_cancelled() {
            return self.fail_with_context(listener, &mut context, ProcessError::Cancelled);
        }

        self.set_state(ProcessState::Running);
        log::info!("process {} ({}) started", self.id(), self.label());
        if let Err(message) = guarded(|| listener.on_process_start(self, &mut context)) {
            let error = ProcessError::ListenerPanicked {
                hook: "on_process_start",
                message,
            };
            return self.fail_with_context(listener, &mut context, error);
        }

        let exit_code = match context.settle() {
            _ if self.is_cancelled() => {
                return self.fail_with_context(listener, &mut context, ProcessError::Cancelled)
            }
            Settled::Interrupted => {
                return self.fail_with_context(listener, &mut context, ProcessError::Cancelled)
            }
            Settled::Uncaught(error) => {
                log::error!("uncaught exception:\n{}", error.stack_trace());
                let error = ProcessError::UncaughtException(error);
                return self.fail_with_context(listener, &mut context, error);
            }
            Settled::Exited(code) => code,
            Settled::Idle => context.exit_code(),
        };

        if !self.begin_exit() {
            return self.fail_with_context(listener, &mut context, ProcessError::Cancelled);
        }
        log::debug!("process {} about to exit with {}", self.id(), exit_code);
        if let Err(message) = guarded(|| listener.on_process_about_to_exit(self, &mut context, exit_code)) {
            let error = ProcessError::ListenerPanicked {
                hook: "on_process_about_to_exit",
                message,
            };
            return self.fail_with_context(listener, &mut context, error);
        }
        context.dispose();
        drop(context);

        self.set_state(ProcessState::Exited);
        if let Err(message) = guarded(|| listener.on_process_exit(self, exit_code)) {
            log::error!("on_process_exit panicked: {}", message);
        }
        log::info!("process {} ({}) exited with {}", self.id(), self.label(), exit_code);
        self.finish(ProcessOutcome::Exited(exit_code));
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("state", &self.state())
            .finish()
    }
}

/// Builder returned by [`Process::builder`].
pub struct ProcessBuilder {
    env: HostEnvironment,
    label: String,
    console: Arc<dyn ConsoleSink>,
    stack_size: usize,
}

impl ProcessBuilder {
    /// Where `console.*` output goes. Defaults to the `log` facade.
    pub fn console(mut self, sink: Arc<dyn ConsoleSink>) -> Self {
        self.console = sink;
        self
    }

    /// Stack size of the process thread.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Starts the process thread.
    ///
    /// Never fails: a thread that cannot be spawned is reported through
    /// `on_process_failed` and the returned handle's outcome.
    pub fn spawn(self, listener: impl ProcessListener + 'static) -> Process {
        let process = Process {
            shared: Arc::new(Shared {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                label: self.label,
                status: Mutex::new(Status {
                    state: ProcessState::NotStarted,
                    outcome: None,
                }),
                finished: Condvar::new(),
                cancelled: AtomicBool::new(false),
                interrupt: Mutex::new(None),
                thread: Mutex::new(None),
            }),
        };
        let listener: Box<dyn ProcessListener> = Box::new(listener);
        let slot: ListenerSlot = Arc::new(Mutex::new(Some(listener)));

        let spawned = {
            let process = process.clone();
            let slot = slot.clone();
            let env = self.env;
            let console = self.console;
            thread::Builder::new()
                .name(format!("corten-process-{}", process.label()))
                .stack_size(self.stack_size)
                .spawn(move || process.run(env, console, slot))
        };
        match spawned {
            Ok(handle) => *process.shared.thread.lock() = Some(handle),
            Err(error) => {
                let error = ProcessError::Spawn(error.to_string());
                let listener = slot.lock().take();
                match listener {
                    Some(mut listener) => process.fail(listener.as_mut(), error),
                    None => process.finish(ProcessOutcome::Failed(error)),
                }
            }
        }
        process
    }
}

/// Releases joiners if the process thread unwinds without an outcome.
struct AbortGuard(Process);

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if self.0.outcome().is_none() {
            log::error!("process {} ({}) aborted", self.0.id(), self.0.label());
            self.0.finish(ProcessOutcome::Failed(ProcessError::Aborted));
        }
    }
}

fn guarded<F: FnOnce()>(f: F) -> Result<(), String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
