//! Scripted oracle for tests.
//!
//! Verdicts are decided by a [`Policy`] per proof kind. Under
//! `Policy::Registered` only the exact (commit, proof) pairs and
//! (inputs, outputs, message, signature) tuples registered up front verify.
//! Every call is logged so tests can assert which checks ran and in what
//! order.

use parking_lot::Mutex;
use std::collections::HashSet;

use super::CommitmentOracle;

/// How a [`MockOracle`] answers one kind of proof check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    AcceptAll,
    RejectAll,
    Registered,
}

/// One recorded oracle invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    RangeProof {
        commit: String,
        proof: String,
    },
    Tally {
        inputs: Vec<String>,
        outputs: Vec<String>,
        excess_message: String,
        excess_signature: String,
    },
}

type TallyKey = (Vec<String>, Vec<String>, String, String);

#[derive(Debug)]
pub struct MockOracle {
    range_policy: Policy,
    tally_policy: Policy,
    range_proofs: HashSet<(String, String)>,
    tallies: HashSet<TallyKey>,
    calls: Mutex<Vec<OracleCall>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::strict()
    }
}

impl MockOracle {
    /// Accepts only what has been registered.
    pub fn strict() -> Self {
        Self {
            range_policy: Policy::Registered,
            tally_policy: Policy::Registered,
            range_proofs: HashSet::new(),
            tallies: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Accepts every proof.
    pub fn permissive() -> Self {
        Self::strict()
            .with_range_policy(Policy::AcceptAll)
            .with_tally_policy(Policy::AcceptAll)
    }

    pub fn with_range_policy(mut self, policy: Policy) -> Self {
        self.range_policy = policy;
        self
    }

    pub fn with_tally_policy(mut self, policy: Policy) -> Self {
        self.tally_policy = policy;
        self
    }

    /// Register a (commit, proof) pair as valid.
    pub fn accept_range_proof(mut self, commit: &str, proof: &str) -> Self {
        self.range_proofs.insert((commit.to_string(), proof.to_string()));
        self
    }

    /// Register a tally as balanced.
    pub fn accept_tally(
        mut self,
        inputs: &[&str],
        outputs: &[&str],
        excess_message: &str,
        excess_signature: &str,
    ) -> Self {
        self.tallies.insert((
            inputs.iter().map(|s| s.to_string()).collect(),
            outputs.iter().map(|s| s.to_string()).collect(),
            excess_message.to_string(),
            excess_signature.to_string(),
        ));
        self
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().clone()
    }

    pub fn range_proof_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, OracleCall::RangeProof { .. }))
            .count()
    }

    pub fn tally_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, OracleCall::Tally { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl CommitmentOracle for MockOracle {
    fn verify_range_proof(&self, commitment: &str, proof: &str) -> bool {
        self.calls.lock().push(OracleCall::RangeProof {
            commit: commitment.to_string(),
            proof: proof.to_string(),
        });

        match self.range_policy {
            Policy::AcceptAll => true,
            Policy::RejectAll => false,
            Policy::Registered => self
                .range_proofs
                .contains(&(commitment.to_string(), proof.to_string())),
        }
    }

    fn verify_tally(
        &self,
        inputs: &[String],
        outputs: &[String],
        excess_message: &str,
        excess_signature: &str,
    ) -> bool {
        let key: TallyKey = (
            inputs.to_vec(),
            outputs.to_vec(),
            excess_message.to_string(),
            excess_signature.to_string(),
        );
        self.calls.lock().push(OracleCall::Tally {
            inputs: key.0.clone(),
            outputs: key.1.clone(),
            excess_message: key.2.clone(),
            excess_signature: key.3.clone(),
        });

        match self.tally_policy {
            Policy::AcceptAll => true,
            Policy::RejectAll => false,
            Policy::Registered => self.tallies.contains(&key),
        }
    }
}
