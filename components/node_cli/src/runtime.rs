//! Runs programs inside a sandboxed process
//!
//! The Runtime owns the host configuration and starts one
//! [`node_process::Process`] per program. The program is evaluated from
//! the process listener; the process then drains the event loop and reports
//! its exit status.

use crate::error::{CliError, CliResult};
use builtins::inspect::inspect;
use builtins::{ConsoleSink, StdoutSink};
use core_types::JsError;
use node_process::{HostEnvironment, JsContext, Process, ProcessListener, ProcessOutcome};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Exit status for an uncaught top-level exception, as in Node.
pub const UNCAUGHT_EXIT_CODE: i32 = 1;

/// Main runtime that runs scripts as processes
pub struct Runtime {
    env: HostEnvironment,
    label: String,
    console: Arc<dyn ConsoleSink>,
}

impl Runtime {
    /// Create a runtime whose processes use the sandbox for `label`
    ///
    /// # Example
    /// ```
    /// use node_cli::Runtime;
    /// use node_process::HostEnvironment;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let runtime = Runtime::new(HostEnvironment::new(dir.path()), "doc");
    /// assert_eq!(runtime.execute_string("process.exitCode = 2").unwrap(), 2);
    /// ```
    pub fn new(env: HostEnvironment, label: &str) -> Self {
        Self {
            env,
            label: label.to_string(),
            console: Arc::new(StdoutSink),
        }
    }

    /// Where `console.*` output goes; stdout/stderr by default
    pub fn with_console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = console;
        self
    }

    /// The host configuration
    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    /// The sandbox label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Execute a script file and return its exit status
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read or the process fails
    pub fn execute_file(&self, path: impl AsRef<Path>) -> CliResult<i32> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.run(Program::new(source, path.display().to_string(), false))
    }

    /// Execute inline source and return its exit status
    ///
    /// A result other than `undefined` is printed to stdout.
    pub fn execute_string(&self, source: &str) -> CliResult<i32> {
        self.run(Program::new(source.to_string(), "[eval]".to_string(), true))
    }

    fn run(&self, program: Program) -> CliResult<i32> {
        let uncaught = program.uncaught.clone();
        let process = Process::builder(&self.env, &self.label)
            .console(self.console.clone())
            .spawn(program);
        match process.join() {
            ProcessOutcome::Exited(code) => {
                if let Some(error) = uncaught.lock().take() {
                    eprintln!("Uncaught {}", error.stack_trace());
                }
                Ok(code)
            }
            ProcessOutcome::Failed(error) => Err(CliError::Process(error)),
        }
    }
}

/// Listener evaluating one program.
struct Program {
    source: String,
    url: String,
    print_result: bool,
    uncaught: Arc<Mutex<Option<JsError>>>,
}

impl Program {
    fn new(source: String, url: String, print_result: bool) -> Self {
        Self {
            source,
            url,
            print_result,
            uncaught: Arc::new(Mutex::new(None)),
        }
    }
}

impl ProcessListener for Program {
    fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
        match context.evaluate_script_named(&self.source, &self.url) {
            Ok(result) => {
                if self.print_result && !result.is_undefined() {
                    println!("{}", inspect(context.interpreter(), result.value()));
                }
            }
            Err(error) if error.is_termination() => {}
            Err(error) => {
                log::debug!("uncaught exception in {}", self.url);
                *self.uncaught.lock() = Some(error);
                context.request_exit(UNCAUGHT_EXIT_CODE);
            }
        }
    }

    fn on_process_exit(&mut self, process: &Process, exit_code: i32) {
        log::info!("{} exited with {}", process.label(), exit_code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use builtins::CaptureSink;

    fn runtime(dir: &Path) -> (Runtime, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::new());
        let runtime = Runtime::new(HostEnvironment::new(dir), "cli").with_console(sink.clone());
        (runtime, sink)
    }

    #[test]
    fn test_execute_string_runs_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, sink) = runtime(dir.path());
        let code = runtime
            .execute_string("setTimeout(() => console.log('later'), 1); console.log('now')")
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(sink.lines(), vec!["now", "later"]);
    }

    #[test]
    fn test_uncaught_error_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, sink) = runtime(dir.path());
        let code = runtime
            .execute_string("setImmediate(() => console.log('skipped')); null.x")
            .unwrap();
        assert_eq!(code, UNCAUGHT_EXIT_CODE);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_execute_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("main.js");
        std::fs::write(&script, "console.log(process.argv.length); process.exit(7)").unwrap();
        let (runtime, sink) = runtime(dir.path());
        assert_eq!(runtime.execute_file(&script).unwrap(), 7);
        assert_eq!(sink.lines(), vec!["0"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, _) = runtime(dir.path());
        let error = runtime.execute_file(dir.path().join("nope.js")).unwrap_err();
        assert!(matches!(error, CliError::Io { .. }));
    }

    #[test]
    fn test_async_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, _) = runtime(dir.path());
        let error = runtime
            .execute_string("setTimeout(() => { throw new Error('late') }, 1)")
            .unwrap_err();
        assert!(error.to_string().starts_with("uncaught exception: Error: late"));
    }
}
