// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Confidential Token Ledger: Core Library
//!
//! A Mimblewimble-style token ledger. Accounts hold opaque Pedersen
//! commitments, never amounts. A transfer consumes some of the caller's
//! tokens, mints new ones for any number of recipients, and is accepted
//! only if an external verifier confirms that inputs and outputs balance
//! and every new output carries a valid range proof.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants, storage keys and method names.
//! - **crypto**: Hashing helpers (SHA-256, BLAKE3).
//! - **token**: Token ids, confidential outputs, accounts, ledger metadata.
//! - **oracle**: The `CommitmentOracle` boundary plus devnet and test oracles.
//! - **storage**: sled-backed ledger state and the per-invocation write set.
//! - **ledger**: Issuance, transfer and verification, and request dispatch.
//!
//! ## Guarantees
//!
//! 1. Token ids are strictly increasing and never reused.
//! 2. A token is spent at most once.
//! 3. An invocation commits all of its writes or none of them.
//! 4. The ledger never sees a plaintext amount.

pub mod config;
pub mod crypto;
pub mod ledger;
pub mod oracle;
pub mod storage;
pub mod token;

pub use ledger::{InvocationContext, Ledger, LedgerError, LedgerResult, Outcome, Request};
pub use oracle::{CommitmentOracle, DigestOracle, MockOracle};
pub use storage::LedgerDb;
pub use token::{Account, LedgerMetadata, Token, TokenId};
