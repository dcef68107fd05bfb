//! Hash-bound devnet oracle.
//!
//! Real deployments link a Pedersen/bulletproof library behind
//! [`CommitmentOracle`]. Devnets and local tooling need something that
//! behaves like one, meaning proofs are bound to exactly the commitments
//! they were produced for and anything else is rejected, without pulling
//! in curve arithmetic. `DigestOracle` is that: a proof is accepted iff it
//! equals a domain-separated SHA-256 over the data it claims to cover.
//!
//! It checks binding, not soundness. Anyone can mint an acceptable proof
//! for any commitment, so it must never back a ledger holding real value.

use super::CommitmentOracle;
use crate::config::{DIGEST_RANGE_DOMAIN, DIGEST_TALLY_DOMAIN};
use crate::crypto::sha256_hex_parts;

/// Deterministic oracle whose proofs are SHA-256 digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestOracle;

impl DigestOracle {
    pub fn new() -> Self {
        Self
    }

    /// The range proof this oracle accepts for `commitment`.
    pub fn range_proof_for(commitment: &str) -> String {
        sha256_hex_parts(&[DIGEST_RANGE_DOMAIN, commitment.as_bytes()])
    }

    /// The excess signature this oracle accepts for the given ordered
    /// commitment lists and message.
    pub fn excess_signature_for(inputs: &[String], outputs: &[String], excess_message: &str) -> String {
        let input_count = (inputs.len() as u64).to_le_bytes();
        let output_count = (outputs.len() as u64).to_le_bytes();

        let mut parts: Vec<&[u8]> = Vec::with_capacity(inputs.len() + outputs.len() + 4);
        parts.push(DIGEST_TALLY_DOMAIN);
        parts.push(&input_count);
        parts.extend(inputs.iter().map(|c| c.as_bytes()));
        parts.push(&output_count);
        parts.extend(outputs.iter().map(|c| c.as_bytes()));
        parts.push(excess_message.as_bytes());

        sha256_hex_parts(&parts)
    }
}

impl CommitmentOracle for DigestOracle {
    fn verify_range_proof(&self, commitment: &str, proof: &str) -> bool {
        !commitment.is_empty() && proof == Self::range_proof_for(commitment)
    }

    fn verify_tally(
        &self,
        inputs: &[String],
        outputs: &[String],
        excess_message: &str,
        excess_signature: &str,
    ) -> bool {
        !inputs.is_empty()
            && !outputs.is_empty()
            && excess_signature == Self::excess_signature_for(inputs, outputs, excess_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commits(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn range_proof_binds_commitment() {
        let oracle = DigestOracle::new();
        let proof = DigestOracle::range_proof_for("C1");
        assert!(oracle.verify_range_proof("C1", &proof));
        assert!(!oracle.verify_range_proof("C2", &proof));
        assert!(!oracle.verify_range_proof("C1", "garbage"));
    }

    #[test]
    fn empty_commitment_never_verifies() {
        let oracle = DigestOracle::new();
        let proof = DigestOracle::range_proof_for("");
        assert!(!oracle.verify_range_proof("", &proof));
    }

    #[test]
    fn tally_binds_inputs_outputs_and_message() {
        let oracle = DigestOracle::new();
        let ins = commits(&["C0"]);
        let outs = commits(&["C1", "C2"]);
        let sig = DigestOracle::excess_signature_for(&ins, &outs, "msg");

        assert!(oracle.verify_tally(&ins, &outs, "msg", &sig));
        assert!(!oracle.verify_tally(&ins, &outs, "other", &sig));
        assert!(!oracle.verify_tally(&commits(&["C9"]), &outs, "msg", &sig));
        assert!(!oracle.verify_tally(&ins, &commits(&["C2", "C1"]), "msg", &sig));
    }

    #[test]
    fn tally_distinguishes_list_boundaries() {
        // Moving a commitment from the input side to the output side must
        // change the signature.
        let a = DigestOracle::excess_signature_for(&commits(&["X", "Y"]), &commits(&["Z"]), "m");
        let b = DigestOracle::excess_signature_for(&commits(&["X"]), &commits(&["Y", "Z"]), "m");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_sides_rejected() {
        let oracle = DigestOracle::new();
        let sig = DigestOracle::excess_signature_for(&[], &commits(&["C1"]), "m");
        assert!(!oracle.verify_tally(&[], &commits(&["C1"]), "m", &sig));
    }
}
