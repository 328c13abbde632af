//! Node-style runtime CLI library
//!
//! Provides the argument parser, the [`Runtime`] that runs programs as
//! sandboxed processes, and the REPL.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
