//! Error types for the CLI

use core_types::JsError;
use node_process::{ConfigError, ProcessError};
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Script file could not be read
    #[error("could not read '{}': {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Host configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Uncaught script error at the top level
    #[error("{}", .0.stack_trace())]
    Script(JsError),

    /// The process failed instead of exiting
    #[error("{0}")]
    Process(#[from] ProcessError),

    /// REPL error
    #[error("REPL error: {0}")]
    Repl(String),
}

impl From<JsError> for CliError {
    fn from(err: JsError) -> Self {
        CliError::Script(err)
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
