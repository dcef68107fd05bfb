//! # Token Data Model
//!
//! The ledger's state is nothing but accounts holding confidential tokens.
//!
//! ```text
//! id.rs: TokenId, the strictly increasing decimal identifier
//! output.rs: Token, one unspent confidential output
//! account.rs: Account, the set of tokens one participant can spend
//! metadata.rs: LedgerMetadata, the issuance-time singleton
//! ```
//!
//! Amounts never appear in this module. A token carries a commitment to its
//! value and an owner-only ciphertext of it; the ledger moves those around
//! as opaque strings and leaves every judgement about them to the
//! [`CommitmentOracle`](crate::oracle::CommitmentOracle).

pub mod account;
pub mod id;
pub mod metadata;
pub mod output;

pub use account::Account;
pub use id::TokenId;
pub use metadata::LedgerMetadata;
pub use output::Token;
