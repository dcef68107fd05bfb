//! Confidential outputs.

use serde::{Deserialize, Serialize};

use super::id::TokenId;

/// One unspent confidential output.
///
/// A token is atomic: it is created whole by issuance or by a transfer's
/// output path, and destroyed whole when a transfer names it as an input.
/// Range proofs are checked before a token is built and never stored on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Ledger-assigned identifier.
    pub id: TokenId,
    /// Pedersen commitment to the hidden amount.
    pub commit: String,
    /// Amount ciphertext, readable only by the owner. Opaque to the ledger.
    pub encrypt_value: String,
    /// Public key of the party that produced the commitment.
    pub from_pubkey: String,
    /// Hash of the transaction that created this token.
    pub hash: String,
}
