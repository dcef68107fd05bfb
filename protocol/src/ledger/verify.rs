//! Stateless diagnostic checks.
//!
//! Each call asks the oracle for one verdict and records it under a fixed
//! metadata key, overwriting the previous one. Accounts and the id counter
//! are never touched.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::LedgerResult;
use super::request::{RangeproofVerifyRequest, TallyVerifyRequest};
use super::{log_abort, InvocationContext, Ledger};
use crate::config::{
    METHOD_RANGEPROOF_VERIFY, METHOD_TALLY_VERIFY, RANGEPROOF_VERDICT_KEY, TALLY_VERDICT_KEY,
};
use crate::oracle::CommitmentOracle;
use crate::storage::WriteSet;

/// Most recently recorded diagnostic verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdicts {
    pub rangeproof: Option<bool>,
    pub tally: Option<bool>,
}

impl<O: CommitmentOracle> Ledger<O> {
    /// Check a tally proof and record the verdict.
    pub fn tally_verify(
        &self,
        ctx: &InvocationContext,
        request: &TallyVerifyRequest,
    ) -> LedgerResult<bool> {
        let verdict = self.oracle.verify_tally(
            &request.inputs,
            &request.outputs,
            &request.excess_msg,
            &request.excess_sig,
        );
        let result = self.record_verdict(TALLY_VERDICT_KEY, verdict);
        log_abort(METHOD_TALLY_VERIFY, ctx, &result);
        if result.is_ok() {
            info!(sender = %ctx.sender, verdict, "tally verdict recorded");
        }
        result
    }

    /// Check a range proof and record the verdict.
    pub fn rangeproof_verify(
        &self,
        ctx: &InvocationContext,
        request: &RangeproofVerifyRequest,
    ) -> LedgerResult<bool> {
        let verdict = self
            .oracle
            .verify_range_proof(&request.commit, &request.proof);
        let result = self.record_verdict(RANGEPROOF_VERDICT_KEY, verdict);
        log_abort(METHOD_RANGEPROOF_VERIFY, ctx, &result);
        if result.is_ok() {
            info!(sender = %ctx.sender, verdict, "range proof verdict recorded");
        }
        result
    }

    /// Last recorded verdicts, `None` for a check never run.
    pub fn last_verdicts(&self) -> LedgerResult<Verdicts> {
        Ok(Verdicts {
            rangeproof: self.db.get_verdict(RANGEPROOF_VERDICT_KEY)?,
            tally: self.db.get_verdict(TALLY_VERDICT_KEY)?,
        })
    }

    fn record_verdict(&self, key: &str, verdict: bool) -> LedgerResult<bool> {
        let mut writes = WriteSet::new(&self.db);
        writes.put_metadata(key, verdict.to_string());
        writes.commit()?;
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, Policy};
    use crate::storage::LedgerDb;
    use crate::token::TokenId;

    fn ctx() -> InvocationContext {
        InvocationContext::new("auditor", "tx")
    }

    #[test]
    fn verdicts_are_recorded_and_overwritten() {
        let oracle = MockOracle::strict().accept_range_proof("C1", "P1");
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), oracle);
        assert_eq!(ledger.last_verdicts().unwrap(), Verdicts::default());

        let good = RangeproofVerifyRequest {
            commit: "C1".into(),
            proof: "P1".into(),
        };
        assert!(ledger.rangeproof_verify(&ctx(), &good).unwrap());
        assert_eq!(ledger.last_verdicts().unwrap().rangeproof, Some(true));

        let bad = RangeproofVerifyRequest {
            commit: "C1".into(),
            proof: "nope".into(),
        };
        assert!(!ledger.rangeproof_verify(&ctx(), &bad).unwrap());
        assert_eq!(ledger.last_verdicts().unwrap().rangeproof, Some(false));
        assert_eq!(
            ledger.db().get_metadata(RANGEPROOF_VERDICT_KEY).unwrap().as_deref(),
            Some("false")
        );
    }

    #[test]
    fn tally_verdict_does_not_touch_accounts_or_counter() {
        let oracle = MockOracle::strict().with_tally_policy(Policy::AcceptAll);
        let ledger = Ledger::new(LedgerDb::open_temporary().unwrap(), oracle);

        let request = TallyVerifyRequest {
            inputs: vec!["C0".into()],
            outputs: vec!["C1".into()],
            excess_msg: "m".into(),
            excess_sig: "s".into(),
        };
        assert!(ledger.tally_verify(&ctx(), &request).unwrap());
        assert_eq!(ledger.last_verdicts().unwrap().tally, Some(true));
        assert_eq!(ledger.db().account_count(), 0);
        assert_eq!(ledger.max_id().unwrap(), TokenId::ZERO);
    }
}
