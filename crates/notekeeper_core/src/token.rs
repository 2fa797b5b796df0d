//! crates/notekeeper_core/src/token.rs
//!
//! Random opaque secrets for confirmation links and session cookies.

use rand_core::{OsRng, RngCore};

/// Bytes of OS randomness behind every token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Returns a fresh token as lowercase hex (64 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
