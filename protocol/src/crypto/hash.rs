//! # Hashing Utilities
//!
//! Thin wrappers over `sha2` and `blake3`. Multi-part inputs are framed
//! with a little-endian length prefix per part, so `["ab", "c"]` and
//! `["a", "bc"]` never hash to the same digest.

use sha2::{Digest, Sha256};

/// SHA-256 over length-framed parts, hex-encoded.
///
/// The first part is conventionally a domain tag (see the `DIGEST_*`
/// constants in [`crate::config`]).
pub fn sha256_hex_parts(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// BLAKE3 over length-framed parts.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Derive a transaction hash for an invocation that arrived without one.
///
/// Binds the caller, the raw request and a per-process sequence number, so
/// two identical requests submitted back to back still get distinct
/// provenance hashes.
pub fn derive_tx_hash(sender: &str, input: &[u8], sequence: u64) -> String {
    hex::encode(blake3_hash_multi(&[
        sender.as_bytes(),
        input,
        &sequence.to_be_bytes(),
    ]))
}
