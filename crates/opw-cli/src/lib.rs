//! # opw-cli – async bridge to the 1Password `op` executable
//!
//! Runs `op` subcommands as child processes, maps exit status and stderr
//! to typed errors, and hands JSON output to `opw-items` for parsing.
//! Sign-in is not handled here: an existing account shorthand is forwarded
//! as `--account` and its session token through `OP_SESSION_<account>`.

pub mod op;

pub use op::*;
