//! # Protocol Configuration & Constants
//!
//! Every fixed name the ledger writes to storage or accepts on the wire
//! lives here. The storage keys are part of the persisted layout: renaming
//! one after a ledger has been issued orphans the old value, so treat them
//! as frozen.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Crate version string, surfaced by the node's `version` endpoints.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version tag recorded in the ledger metadata at issuance. Identifies the
/// confidential token standard the ledger speaks.
pub const TOKEN_STANDARD_VERSION: &str = "ETP10";

// ---------------------------------------------------------------------------
// Storage Layout
// ---------------------------------------------------------------------------

/// sled tree holding one record per account: `account id -> {"tokens":[...]}`.
pub const ACCOUNTS_TREE: &str = "accounts";

/// sled tree holding the global singletons and diagnostic verdicts.
pub const METADATA_TREE: &str = "metadata";

/// Last token id handed out, as a bare decimal string.
pub const MAX_ID_KEY: &str = "max_id";

/// Ledger metadata `{name, symbol, version}`, written once at issuance.
pub const GLOBAL_ATTRIBUTE_KEY: &str = "global_attribute";

/// Verdict of the most recent `rangeproofVerify` call.
pub const RANGEPROOF_VERDICT_KEY: &str = "bpRangeproofVerify";

/// Verdict of the most recent `tallyVerify` call.
pub const TALLY_VERDICT_KEY: &str = "pedersenTallyVerify";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Method name of the one-time genesis mint.
pub const METHOD_ISSUE: &str = "issue";

/// Method name of the confidential transfer.
pub const METHOD_TRANSFER: &str = "transfer";

/// Method name of the standalone tally diagnostic.
pub const METHOD_TALLY_VERIFY: &str = "tallyVerify";

/// Method name of the standalone range-proof diagnostic.
pub const METHOD_RANGEPROOF_VERIFY: &str = "rangeproofVerify";

// ---------------------------------------------------------------------------
// Devnet Oracle
// ---------------------------------------------------------------------------

/// Domain separator for digest range proofs.
pub const DIGEST_RANGE_DOMAIN: &[u8] = b"ctoken:range:v1";

/// Domain separator for digest excess signatures.
pub const DIGEST_TALLY_DOMAIN: &[u8] = b"ctoken:tally:v1";

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the JSON-RPC and REST API.
pub const DEFAULT_RPC_PORT: u16 = 9841;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_keys_are_distinct() {
        let keys = [
            MAX_ID_KEY,
            GLOBAL_ATTRIBUTE_KEY,
            RANGEPROOF_VERDICT_KEY,
            TALLY_VERDICT_KEY,
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn trees_are_distinct() {
        assert_ne!(ACCOUNTS_TREE, METADATA_TREE);
    }
}
