//! Ledger-wide metadata written once at issuance.

use serde::{Deserialize, Serialize};

/// Name, symbol and token-standard version of the ledger.
///
/// Exists if and only if the ledger has been issued. Never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMetadata {
    pub name: String,
    pub symbol: String,
    pub version: String,
}
