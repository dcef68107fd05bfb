//! # Confidential Token Ledger
//!
//! The state machine behind the four ledger methods. Every invocation runs
//! against a fresh [`WriteSet`](crate::storage::WriteSet): reads see the
//! invocation's own staged writes, and the set is committed in one atomic
//! step only after every check has passed. Any error drops the set, so a
//! failed call is indistinguishable from one that never ran.
//!
//! ```text
//! error.rs: LedgerError taxonomy
//! request.rs: typed requests and the {method, params} envelope
//! ids.rs: IdAllocator over the max_id counter
//! accounts.rs: AccountLedger: load / consume / add / save
//! issuance.rs: one-time genesis mint
//! transfer.rs: five-stage confidential transfer
//! verify.rs: stateless diagnostic verdicts
//! ```
//!
//! Callers are responsible for serialising invocations against one
//! database. The ledger itself holds no locks.

pub mod accounts;
pub mod error;
pub mod ids;
pub mod issuance;
pub mod request;
pub mod transfer;
pub mod verify;

pub use accounts::AccountLedger;
pub use error::{LedgerError, LedgerResult};
pub use ids::IdAllocator;
pub use issuance::IssueReceipt;
pub use request::{
    InputRef, IssueRequest, IssueToken, OutputSpec, RangeproofVerifyRequest, Request,
    TallyVerifyRequest, TransferRequest,
};
pub use transfer::{Destination, MintedToken, TransferReceipt};
pub use verify::Verdicts;

use serde::Serialize;
use tracing::{debug, warn};

use crate::oracle::CommitmentOracle;
use crate::storage::LedgerDb;
use crate::token::{Account, LedgerMetadata, TokenId};

// ---------------------------------------------------------------------------
// Invocation Context
// ---------------------------------------------------------------------------

/// Who is calling, and under which transaction.
///
/// `sender` is the account inputs are spent from and the issuer account at
/// genesis. `tx_hash` is stamped on every token the invocation creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub sender: String,
    pub tx_hash: String,
}

impl InvocationContext {
    pub fn new(sender: impl Into<String>, tx_hash: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            tx_hash: tx_hash.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Effect of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Issued(IssueReceipt),
    Transferred(TransferReceipt),
    TallyVerdict { verdict: bool },
    RangeproofVerdict { verdict: bool },
}

impl Outcome {
    /// Number of tokens created by the invocation.
    pub fn minted(&self) -> usize {
        match self {
            Outcome::Issued(_) => 1,
            Outcome::Transferred(receipt) => receipt.minted.len(),
            Outcome::TallyVerdict { .. } | Outcome::RangeproofVerdict { .. } => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A confidential token ledger bound to one database and one oracle.
#[derive(Debug, Clone)]
pub struct Ledger<O> {
    db: LedgerDb,
    oracle: O,
}

impl<O: CommitmentOracle> Ledger<O> {
    pub fn new(db: LedgerDb, oracle: O) -> Self {
        Self { db, oracle }
    }

    pub fn db(&self) -> &LedgerDb {
        &self.db
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Decode a `{method, params}` request and run it.
    pub fn execute(&self, ctx: &InvocationContext, input: &str) -> LedgerResult<Outcome> {
        let request = match Request::parse(input) {
            Ok(request) => request,
            Err(e) => {
                warn!(sender = %ctx.sender, kind = e.kind(), error = %e, "request rejected");
                return Err(e);
            }
        };
        self.dispatch(ctx, &request)
    }

    /// Run an already-decoded request.
    pub fn dispatch(&self, ctx: &InvocationContext, request: &Request) -> LedgerResult<Outcome> {
        debug!(method = request.method(), sender = %ctx.sender, tx = %ctx.tx_hash, "dispatching");
        match request {
            Request::Issue(params) => self.issue(ctx, params).map(Outcome::Issued),
            Request::Transfer(params) => self.transfer(ctx, params).map(Outcome::Transferred),
            Request::TallyVerify(params) => self
                .tally_verify(ctx, params)
                .map(|verdict| Outcome::TallyVerdict { verdict }),
            Request::RangeproofVerify(params) => self
                .rangeproof_verify(ctx, params)
                .map(|verdict| Outcome::RangeproofVerdict { verdict }),
        }
    }

    // -- Queries ------------------------------------------------------------

    /// Committed token set of an account.
    pub fn account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.db.get_account(account_id)?)
    }

    /// Ledger metadata, `None` before issuance.
    pub fn metadata(&self) -> LedgerResult<Option<LedgerMetadata>> {
        Ok(self.db.get_ledger_metadata()?)
    }

    /// Last assigned token id, or zero if nothing has been minted.
    pub fn max_id(&self) -> LedgerResult<TokenId> {
        Ok(self.db.get_max_id()?.unwrap_or(TokenId::ZERO))
    }
}

/// Log a failed invocation. Aborts are expected client-side outcomes, so
/// they are warnings unless storage itself failed.
fn log_abort<T>(method: &str, ctx: &InvocationContext, result: &LedgerResult<T>) {
    if let Err(e) = result {
        if e.is_client_error() {
            warn!(method, sender = %ctx.sender, tx = %ctx.tx_hash, kind = e.kind(), error = %e, "invocation aborted");
        } else {
            tracing::error!(method, sender = %ctx.sender, tx = %ctx.tx_hash, error = %e, "invocation failed in storage");
        }
    }
}
