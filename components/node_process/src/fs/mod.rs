//! The `fs` module: sandboxed file system access for script.

mod error;
mod module;
pub mod ops;

pub use error::{ErrorCode, FsError};
pub use ops::Stats;

pub(crate) use module::create_fs_module;
