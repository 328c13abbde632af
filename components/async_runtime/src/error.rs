//! Event loop error types

use thiserror::Error;

/// Failures raised by the event loop itself rather than by the tasks it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The background worker threads could not be started
    #[error("failed to provision worker threads: {0}")]
    Provisioning(String),

    /// A background job panicked before producing a result
    #[error("background job panicked: {0}")]
    JobPanicked(String),

    /// A job result did not have the type its continuation expected
    #[error("background job produced an unexpected result type")]
    ResultType,

    /// The loop has been shut down and no longer accepts work
    #[error("event loop is shut down")]
    ShutDown,
}
