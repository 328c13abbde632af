//! Integration test suite for the Corten Node runtime
//!
//! These tests drive several components together: the parser and
//! interpreter, the process lifecycle, the sandboxed file system and the
//! bridge layer.

/// Re-export components for test convenience
pub mod components {
    pub use builtins;
    pub use core_types;
    pub use interpreter;
    pub use node_cli;
    pub use node_process;
    pub use parser;
}
