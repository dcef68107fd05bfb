//! # Hashing Primitives
//!
//! The ledger never touches curve arithmetic directly: commitments, range
//! proofs and excess signatures are judged by a
//! [`CommitmentOracle`](crate::oracle::CommitmentOracle). What remains here
//! are the digests the rest of the crate leans on:
//!
//! - **SHA-256** for the devnet oracle's proof binding, so that clients in
//!   any language can reproduce an acceptable proof with a stock library.
//! - **BLAKE3** for node-derived transaction hashes (token provenance).

pub mod hash;

pub use hash::{blake3_hash_multi, derive_tx_hash, sha256_hex_parts};
