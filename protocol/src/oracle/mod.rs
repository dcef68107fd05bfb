//! # Commitment Oracle
//!
//! The ledger proves conservation without ever seeing an amount, but it
//! does not do the curve arithmetic itself. Both proof checks are delegated
//! to a [`CommitmentOracle`]:
//!
//! - **Range proof**: the committed value of a new output is provably
//!   non-negative. Checked once per output, before an id is allocated.
//! - **Tally**: the ordered input commitments sum to the ordered output
//!   commitments plus the commitment implied by the excess signature.
//!   Checked once per transfer, after every output has been built.
//!
//! A `false` verdict is a rejected proof, not a system failure. Oracles are
//! side-effect free from the ledger's point of view.
//!
//! ```text
//! digest.rs: DigestOracle, deterministic hash-bound stand-in for devnets
//! mock.rs: MockOracle, scripted verdicts and a call log for tests
//! ```

pub mod digest;
pub mod mock;

pub use digest::DigestOracle;
pub use mock::{MockOracle, OracleCall, Policy};

/// Verifier for range proofs and value-conservation (tally) proofs.
///
/// Commitments, proofs, messages and signatures are passed as the opaque
/// strings clients submit; decoding them is the oracle's business.
pub trait CommitmentOracle: Send + Sync {
    /// `true` iff `proof` shows the value committed in `commitment` lies in
    /// the valid non-negative range.
    fn verify_range_proof(&self, commitment: &str, proof: &str) -> bool;

    /// `true` iff `sum(inputs) == sum(outputs) + excess`, where the excess
    /// commitment is the public key `excess_signature` verifies under for
    /// `excess_message`. Order of both sequences is significant.
    fn verify_tally(
        &self,
        inputs: &[String],
        outputs: &[String],
        excess_message: &str,
        excess_signature: &str,
    ) -> bool;
}

impl<T: CommitmentOracle + ?Sized> CommitmentOracle for std::sync::Arc<T> {
    fn verify_range_proof(&self, commitment: &str, proof: &str) -> bool {
        (**self).verify_range_proof(commitment, proof)
    }

    fn verify_tally(
        &self,
        inputs: &[String],
        outputs: &[String],
        excess_message: &str,
        excess_signature: &str,
    ) -> bool {
        (**self).verify_tally(inputs, outputs, excess_message, excess_signature)
    }
}
