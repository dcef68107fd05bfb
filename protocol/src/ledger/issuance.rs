//! One-time genesis mint.

use serde::Serialize;
use tracing::{debug, info};

use super::accounts::AccountLedger;
use super::error::{LedgerError, LedgerResult};
use super::ids::IdAllocator;
use super::request::IssueRequest;
use super::{log_abort, InvocationContext, Ledger};
use crate::config::{GLOBAL_ATTRIBUTE_KEY, METHOD_ISSUE, TOKEN_STANDARD_VERSION};
use crate::oracle::CommitmentOracle;
use crate::storage::{DbError, WriteSet};
use crate::token::{Account, LedgerMetadata, Token, TokenId};

/// Result of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueReceipt {
    pub issuer: String,
    pub token_id: TokenId,
    pub metadata: LedgerMetadata,
}

impl<O: CommitmentOracle> Ledger<O> {
    /// Create the ledger's metadata and its first token, owned by the caller.
    ///
    /// Succeeds at most once per ledger.
    pub fn issue(&self, ctx: &InvocationContext, request: &IssueRequest) -> LedgerResult<IssueReceipt> {
        let result = self.try_issue(ctx, request);
        log_abort(METHOD_ISSUE, ctx, &result);
        result
    }

    fn try_issue(&self, ctx: &InvocationContext, request: &IssueRequest) -> LedgerResult<IssueReceipt> {
        let mut writes = WriteSet::new(&self.db);

        if writes.metadata(GLOBAL_ATTRIBUTE_KEY)?.is_some() {
            return Err(LedgerError::AlreadyIssued);
        }
        request.validate()?;

        let metadata = LedgerMetadata {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            version: TOKEN_STANDARD_VERSION.to_string(),
        };
        let encoded = serde_json::to_string(&metadata)
            .map_err(|e| DbError::Serialization(format!("{GLOBAL_ATTRIBUTE_KEY}: {e}")))?;
        writes.put_metadata(GLOBAL_ATTRIBUTE_KEY, encoded);

        let mut ids = IdAllocator::new();
        let token_id = ids.allocate(&writes)?;
        let token = Token {
            id: token_id,
            commit: request.token.commit.clone(),
            encrypt_value: request.token.encrypt_value.clone(),
            from_pubkey: request.token.from_pubkey.clone(),
            hash: ctx.tx_hash.clone(),
        };

        if !self
            .oracle
            .verify_range_proof(&request.token.commit, &request.token.range_proof)
        {
            return Err(LedgerError::ProofVerificationFailed {
                commit: request.token.commit.clone(),
            });
        }
        debug!(id = %token_id, "genesis range proof accepted");

        let mut account = Account::new();
        account.insert(token);
        AccountLedger::new(&mut writes).save(&ctx.sender, account);
        ids.persist(&mut writes);
        writes.commit()?;

        info!(
            issuer = %ctx.sender,
            name = %metadata.name,
            symbol = %metadata.symbol,
            id = %token_id,
            "ledger issued"
        );

        Ok(IssueReceipt {
            issuer: ctx.sender.clone(),
            token_id,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_ID_KEY;
    use crate::ledger::request::IssueToken;
    use crate::oracle::{MockOracle, Policy};
    use crate::storage::LedgerDb;

    fn request() -> IssueRequest {
        IssueRequest {
            name: "Coin".into(),
            symbol: "COIN".into(),
            token: IssueToken {
                commit: "C0".into(),
                range_proof: "P0".into(),
                from_pubkey: "K0".into(),
                encrypt_value: "E0".into(),
            },
        }
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new("issuer", "tx0")
    }

    #[test]
    fn issue_writes_metadata_account_and_counter() {
        let oracle = MockOracle::strict().accept_range_proof("C0", "P0");
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), oracle);

        let receipt = ledger.issue(&ctx(), &request()).unwrap();
        assert_eq!(receipt.token_id, TokenId::new(1));
        assert_eq!(receipt.metadata.version, "ETP10");

        let account = ledger.account("issuer").unwrap().unwrap();
        let token = account.get(&TokenId::new(1)).unwrap();
        assert_eq!(token.commit, "C0");
        assert_eq!(token.encrypt_value, "E0");
        assert_eq!(token.hash, "tx0");
        assert_eq!(ledger.db().get_metadata(MAX_ID_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn second_issue_is_rejected() {
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), MockOracle::permissive());
        ledger.issue(&ctx(), &request()).unwrap();
        let before = ledger.db().snapshot().unwrap();

        let err = ledger.issue(&ctx(), &request()).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyIssued));
        assert_eq!(ledger.db().snapshot().unwrap(), before);
    }

    #[test]
    fn already_issued_wins_over_bad_arguments() {
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), MockOracle::permissive());
        ledger.issue(&ctx(), &request()).unwrap();

        let mut bad = request();
        bad.name.clear();
        assert!(matches!(
            ledger.issue(&ctx(), &bad).unwrap_err(),
            LedgerError::AlreadyIssued
        ));
    }

    #[test]
    fn already_issued_wins_over_an_empty_body() {
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), MockOracle::permissive());
        ledger.issue(&ctx(), &request()).unwrap();

        assert!(matches!(
            ledger.issue(&ctx(), &IssueRequest::default()).unwrap_err(),
            LedgerError::AlreadyIssued
        ));
        assert_eq!(ledger.oracle().range_proof_calls(), 1);
    }

    #[test]
    fn rejected_range_proof_leaves_ledger_unissued() {
        let oracle = MockOracle::strict().with_range_policy(Policy::RejectAll);
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), oracle);

        let err = ledger.issue(&ctx(), &request()).unwrap_err();
        assert!(matches!(err, LedgerError::ProofVerificationFailed { ref commit } if commit == "C0"));
        assert!(ledger.metadata().unwrap().is_none());
        assert_eq!(ledger.max_id().unwrap(), TokenId::ZERO);
        assert!(ledger.account("issuer").unwrap().is_none());
    }

    #[test]
    fn missing_fields_are_invalid_arguments() {
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), MockOracle::permissive());
        let mut bad = request();
        bad.token.range_proof.clear();

        let err = ledger.issue(&ctx(), &bad).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArguments(_)));
        assert_eq!(ledger.oracle().range_proof_calls(), 0);
    }
}
