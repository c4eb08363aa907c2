//! Locally generated identifiers in the shapes `op` itself uses.
//!
//! Item and field IDs are 26-character base32 strings; section IDs are
//! `Section_` followed by 32 hex characters. Both come from 16 bytes of OS
//! randomness.

use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;

const ID_BYTES: usize = 16;

pub const SECTION_ID_PREFIX: &str = "Section_";

lazy_static! {
    static ref GENERATED_ID: Regex = Regex::new(
        r"^(?:[a-z2-7]{26}|[A-Z2-7]{26}|[0-9a-fA-F]{32}|Section_[0-9a-fA-F]{32})$"
    )
    .expect("generated-id pattern is valid");
}

fn random_bytes() -> [u8; ID_BYTES] {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Lowercase base32 identifier for items and fields.
pub fn generate_unique_id() -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &random_bytes()).to_lowercase()
}

/// Uppercase base32 identifier, the shape `op` assigns to stored items.
pub fn generate_unique_id_upper() -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &random_bytes())
}

/// Hex identifier without prefix.
pub fn generate_hex_id() -> String {
    hex::encode(random_bytes())
}

/// Prefixed hex identifier for sections.
pub fn generate_section_id() -> String {
    format!("{}{}", SECTION_ID_PREFIX, generate_hex_id())
}

/// Whether `id` has the shape of a randomly generated identifier. Only such
/// IDs are regenerated when an item is duplicated.
pub fn is_generated_id(id: &str) -> bool {
    GENERATED_ID.is_match(id)
}
