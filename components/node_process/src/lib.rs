//! Node-style script processes.
//!
//! A [`Process`] owns one [`JsContext`] on a dedicated thread and drives it
//! through a fixed lifecycle reported to a [`ProcessListener`]:
//! - `on_process_start` with the live context, where the program runs
//! - `on_process_about_to_exit` once the event loop has drained
//! - `on_process_exit` after the context is disposed
//! - `on_process_failed` instead, when provisioning or the runtime fails
//!
//! Scripts see a small Node surface: `require('fs')` confined to a per-label
//! [`Sandbox`], `process`, timers and `console`. Native types are exposed
//! through [`bridge`] objects.
//!
//! # Example
//!
//! ```
//! use node_process::{HostEnvironment, JsContext, Process, ProcessListener};
//!
//! struct Writer;
//!
//! impl ProcessListener for Writer {
//!     fn on_process_start(&mut self, _process: &Process, context: &mut JsContext) {
//!         context
//!             .evaluate_script("require('fs').writeFile('out.txt', 'hi', err => { if (err) throw err })")
//!             .unwrap();
//!     }
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let env = HostEnvironment::new(dir.path());
//! let outcome = Process::new(&env, "writer", Writer).join();
//! assert!(outcome.is_success());
//! assert_eq!(std::fs::read_to_string(env.home_dir("writer").join("out.txt")).unwrap(), "hi");
//! ```

#![warn(clippy::all)]

pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
mod globals;
pub mod process;
pub mod sandbox;

pub use bridge::{BridgeClass, BridgeError, BridgeObject, BridgeType, NativeValue, Property, ValueType};
pub use config::{ConfigError, HostEnvironment};
pub use context::{JsContext, ScriptValue};
pub use error::{ProcessError, ProcessResult};
pub use fs::{ErrorCode, FsError, Stats};
pub use process::{Process, ProcessBuilder, ProcessListener, ProcessOutcome, ProcessState, DEFAULT_STACK_SIZE};
pub use sandbox::{Access, Sandbox};
