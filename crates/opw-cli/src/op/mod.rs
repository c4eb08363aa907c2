//! `op` invocation layer: sub-modules.

pub mod types;
pub mod runner;
pub mod cli;

// Re-export top-level items for convenience.
pub use types::*;
pub use runner::{CommandRunner, ProcessRunner, RawOutput};
pub use cli::OpCli;
