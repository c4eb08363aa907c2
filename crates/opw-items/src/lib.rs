//! # opw-items – typed 1Password CLI objects
//!
//! Structured views over the JSON emitted by the 1Password `op` tool:
//!
//! - **Registry** – category discriminator → typed item constructor, with
//!   strict and relaxed validation selected per parse call
//! - **Items** – descriptors (list view) and full items (fields + sections)
//!   with per-category accessors
//! - **New items** – template-based construction for `op item create`,
//!   identifier regeneration and scratch-file ownership
//! - **Item lists** – deterministic ordering over unordered CLI output
//! - **Accounts** – vault, user and group records

pub mod onepassword;

pub use onepassword::*;
