//! Error types for ledger invocations.
//!
//! Every failure is fatal to the invocation that raised it and leaves
//! durable state exactly as it was. The variants name the check that
//! failed so a client can correct the request and resubmit.

use thiserror::Error;

use crate::storage::DbError;

/// Errors that abort an issue, transfer or verification call.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request does not have the required shape.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A requested output token is malformed.
    #[error("invalid token format: {0}")]
    InvalidTokenFormat(String),

    /// Issuance was attempted on a ledger that already has metadata.
    #[error("ledger already issued")]
    AlreadyIssued,

    /// The caller has no account on this ledger.
    #[error("source account not found: {0}")]
    SourceAccountNotFound(String),

    /// An input names a token the caller does not hold, or one already
    /// consumed earlier in the same request.
    #[error("no such token: {id}")]
    TokenNotFound {
        /// The id exactly as the client sent it.
        id: String,
    },

    /// The oracle rejected the range proof of a new token.
    #[error("range proof verification failed for commitment {commit}")]
    ProofVerificationFailed {
        /// Commitment whose proof was rejected.
        commit: String,
    },

    /// The oracle rejected the transfer's excess signature.
    #[error("conservation check failed: excess signature does not balance inputs and outputs")]
    ConservationCheckFailed,

    /// The dispatched method name is not one the ledger understands.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// The token id counter cannot advance past `u64::MAX`.
    #[error("token id space exhausted")]
    IdSpaceExhausted,

    /// The storage substrate failed or returned an undecodable record.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

impl LedgerError {
    /// Stable machine-readable name of the failed check.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidArguments(_) => "InvalidArguments",
            LedgerError::InvalidTokenFormat(_) => "InvalidTokenFormat",
            LedgerError::AlreadyIssued => "AlreadyIssued",
            LedgerError::SourceAccountNotFound(_) => "SourceAccountNotFound",
            LedgerError::TokenNotFound { .. } => "TokenNotFound",
            LedgerError::ProofVerificationFailed { .. } => "ProofVerificationFailed",
            LedgerError::ConservationCheckFailed => "ConservationCheckFailed",
            LedgerError::UnknownMethod(_) => "UnknownMethod",
            LedgerError::IdSpaceExhausted => "IdSpaceExhausted",
            LedgerError::Storage(_) => "Storage",
        }
    }

    /// JSON-RPC error code for this failure.
    ///
    /// Request-shape problems reuse the standard JSON-RPC codes; protocol
    /// rejections live in the implementation-defined `-320xx` band.
    pub fn rpc_code(&self) -> i32 {
        match self {
            LedgerError::InvalidArguments(_) => -32602,
            LedgerError::UnknownMethod(_) => -32601,
            LedgerError::InvalidTokenFormat(_) => -32010,
            LedgerError::AlreadyIssued => -32011,
            LedgerError::SourceAccountNotFound(_) => -32012,
            LedgerError::TokenNotFound { .. } => -32013,
            LedgerError::ProofVerificationFailed { .. } => -32014,
            LedgerError::ConservationCheckFailed => -32015,
            LedgerError::IdSpaceExhausted => -32016,
            LedgerError::Storage(_) => -32603,
        }
    }

    /// `true` for rejections caused by the request itself, as opposed to a
    /// storage failure on the ledger's side.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_not_found_names_the_id() {
        let err = LedgerError::TokenNotFound { id: "17".into() };
        assert_eq!(err.to_string(), "no such token: 17");
        assert_eq!(err.kind(), "TokenNotFound");
    }

    #[test]
    fn rpc_codes_are_unique() {
        let errors = [
            LedgerError::InvalidArguments(String::new()),
            LedgerError::InvalidTokenFormat(String::new()),
            LedgerError::AlreadyIssued,
            LedgerError::SourceAccountNotFound(String::new()),
            LedgerError::TokenNotFound { id: String::new() },
            LedgerError::ProofVerificationFailed {
                commit: String::new(),
            },
            LedgerError::ConservationCheckFailed,
            LedgerError::UnknownMethod(String::new()),
            LedgerError::IdSpaceExhausted,
            LedgerError::Storage(DbError::Serialization(String::new())),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.rpc_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn storage_errors_are_not_client_errors() {
        assert!(LedgerError::ConservationCheckFailed.is_client_error());
        assert!(!LedgerError::Storage(DbError::Serialization("x".into())).is_client_error());
    }
}
