//! Process error types

use crate::config::ConfigError;
use async_runtime::TaskError;
use core_types::JsError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a process failed instead of exiting.
///
/// Every variant is delivered exactly once, through
/// `ProcessListener::on_process_failed`, and is the payload of
/// `ProcessOutcome::Failed`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// The host environment or label is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The sandbox directories could not be created
    #[error("failed to provision sandbox at {path}: {message}")]
    Provisioning {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        message: String,
    },

    /// The process thread could not be started
    #[error("failed to spawn process thread: {0}")]
    Spawn(String),

    /// The event loop or its worker pool failed
    #[error("runtime failure: {0}")]
    Runtime(#[from] TaskError),

    /// An exception escaped an asynchronous callback
    #[error("uncaught exception: {0}")]
    UncaughtException(JsError),

    /// A listener callback panicked
    #[error("listener panicked in {hook}: {message}")]
    ListenerPanicked {
        /// Callback that panicked
        hook: &'static str,
        /// Panic payload
        message: String,
    },

    /// [`crate::Process::cancel`] was called before the process exited
    #[error("process was cancelled")]
    Cancelled,

    /// The process thread ended without reporting an outcome
    #[error("process thread terminated unexpectedly")]
    Aborted,
}

/// Result type for process operations
pub type ProcessResult<T> = Result<T, ProcessError>;
