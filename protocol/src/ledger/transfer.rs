//! Confidential transfer.
//!
//! `Validating -> ResolvingInputs -> ConstructingOutputs ->
//! VerifyingConservation -> Committing`. Every stage before the last only
//! touches in-memory state; a failure anywhere drops it and the ledger is
//! left exactly as it was.

use serde::Serialize;
use tracing::{debug, info};

use super::accounts::AccountLedger;
use super::error::{LedgerError, LedgerResult};
use super::ids::IdAllocator;
use super::request::TransferRequest;
use super::{log_abort, InvocationContext, Ledger};
use crate::config::METHOD_TRANSFER;
use crate::oracle::CommitmentOracle;
use crate::storage::WriteSet;
use crate::token::{Token, TokenId};

/// Where a newly built output ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    /// Addressed to the sender; added to the sender's staged account.
    Retained,
    /// Addressed to another account; written there at commit.
    Deliverable { account: String },
}

impl Destination {
    pub fn resolve(sender: &str, to: &str) -> Self {
        if to == sender {
            Destination::Retained
        } else {
            Destination::Deliverable {
                account: to.to_string(),
            }
        }
    }
}

/// A token created by a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintedToken {
    pub id: TokenId,
    pub commit: String,
    pub destination: Destination,
}

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Input ids, in request order.
    pub consumed: Vec<TokenId>,
    /// New tokens, in request order.
    pub minted: Vec<MintedToken>,
    /// Every account rewritten by the commit, in key order.
    pub accounts_written: Vec<String>,
}

impl<O: CommitmentOracle> Ledger<O> {
    /// Spend tokens held by the caller and create new ones.
    pub fn transfer(
        &self,
        ctx: &InvocationContext,
        request: &TransferRequest,
    ) -> LedgerResult<TransferReceipt> {
        let result = self.try_transfer(ctx, request);
        log_abort(METHOD_TRANSFER, ctx, &result);
        result
    }

    fn try_transfer(
        &self,
        ctx: &InvocationContext,
        request: &TransferRequest,
    ) -> LedgerResult<TransferReceipt> {
        // Stage 1: request shape, before any state is read.
        request.validate_shape()?;

        let mut writes = WriteSet::new(&self.db);
        let mut ids = IdAllocator::new();

        // Stage 2: consume the inputs from the sender's staged account.
        let mut accounts = AccountLedger::new(&mut writes);
        if accounts.load(&ctx.sender)?.is_none() {
            return Err(LedgerError::SourceAccountNotFound(ctx.sender.clone()));
        }

        let mut consumed = Vec::with_capacity(request.inputs.len());
        let mut input_commits = Vec::with_capacity(request.inputs.len());
        for input in &request.inputs {
            let raw = input.raw_id().ok_or_else(|| LedgerError::TokenNotFound {
                id: input.id.to_string(),
            })?;
            let token = accounts.consume(&ctx.sender, raw)?;
            consumed.push(token.id);
            input_commits.push(token.commit);
        }
        debug!(sender = %ctx.sender, inputs = consumed.len(), "inputs resolved");

        // Stage 3: build outputs. Range proofs gate id allocation.
        let mut minted = Vec::with_capacity(request.outputs.len());
        let mut output_commits = Vec::with_capacity(request.outputs.len());
        let mut deliveries: Vec<(String, Token)> = Vec::new();
        for (index, output) in request.outputs.iter().enumerate() {
            output.validate(index)?;

            if !self
                .oracle
                .verify_range_proof(&output.commit, &output.range_proof)
            {
                return Err(LedgerError::ProofVerificationFailed {
                    commit: output.commit.clone(),
                });
            }

            let id = ids.allocate(accounts.writes())?;
            let token = Token {
                id,
                commit: output.commit.clone(),
                encrypt_value: output.encrypt_value.clone(),
                from_pubkey: output.from_pubkey.clone(),
                hash: ctx.tx_hash.clone(),
            };

            let destination = Destination::resolve(&ctx.sender, &output.to);
            match &destination {
                Destination::Retained => accounts.add(&ctx.sender, token)?,
                Destination::Deliverable { account } => deliveries.push((account.clone(), token)),
            }

            minted.push(MintedToken {
                id,
                commit: output.commit.clone(),
                destination,
            });
            output_commits.push(output.commit.clone());
        }
        debug!(outputs = minted.len(), deliveries = deliveries.len(), "outputs constructed");

        // Stage 4: conservation over the ordered commitment lists.
        if !self.oracle.verify_tally(
            &input_commits,
            &output_commits,
            &request.excess_msg,
            &request.excess_sig,
        ) {
            return Err(LedgerError::ConservationCheckFailed);
        }

        // Stage 5: deliver, advance the counter, commit.
        for (account, token) in deliveries {
            accounts.add(&account, token)?;
        }
        ids.persist(&mut writes);

        let accounts_written = writes.staged_accounts();
        writes.commit()?;

        info!(
            sender = %ctx.sender,
            tx = %ctx.tx_hash,
            consumed = consumed.len(),
            minted = minted.len(),
            accounts = accounts_written.len(),
            "transfer committed"
        );

        Ok(TransferReceipt {
            consumed,
            minted,
            accounts_written,
        })
    }
}
