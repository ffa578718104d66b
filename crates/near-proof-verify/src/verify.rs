//! Verification routines for full outcome proofs: outcome inclusion in the block's outcome
//! root, then block inclusion in the block merkle root recorded by a light client.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::borsh::DecodeError;
use crate::hash::{sha256, CryptoHash};
use crate::merkle::compute_root;
use crate::proof::FullOutcomeProof;

/// Stage of the verification pipeline a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationStage {
    /// The proof bytes are malformed
    Decode,
    /// The outcome does not hash up to the header's outcome root
    OutcomeRoot,
    /// The header does not hash up to the trusted block merkle root
    BlockRoot,
    /// Nothing could be concluded within the configured cost bound
    Inconclusive,
}

/// Error types for proof verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Malformed proof buffer
    #[error("Malformed proof: {0}")]
    Decode(#[from] DecodeError),
    /// Outcome merkle proof is not valid
    #[error("Outcome merkle proof is not valid: computed {computed}, header commits to {expected}")]
    OutcomeRootMismatch {
        computed: CryptoHash,
        expected: CryptoHash,
    },
    /// Block merkle proof is not valid
    #[error("Block proof is not valid: computed {computed}, light client commits to {expected}")]
    BlockRootMismatch {
        computed: CryptoHash,
        expected: CryptoHash,
    },
}

impl VerifyError {
    pub fn stage(&self) -> VerificationStage {
        match self {
            VerifyError::Decode(_) => VerificationStage::Decode,
            VerifyError::OutcomeRootMismatch { .. } => VerificationStage::OutcomeRoot,
            VerifyError::BlockRootMismatch { .. } => VerificationStage::BlockRoot,
        }
    }
}

/// Result of a successful full outcome proof verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Receipt or transaction id whose outcome was verified
    pub outcome_id: CryptoHash,
    /// Hash of the block including the outcome
    pub block_hash: CryptoHash,
    /// Height of the block including the outcome
    pub block_height: u64,
    /// Outcome root the outcome hashes up to
    pub outcome_root: CryptoHash,
    /// Trusted block merkle root the block hashes up to
    pub block_merkle_root: CryptoHash,
}

/// Decode `proof_bytes` and verify it against the block merkle root a light client
/// recorded for some checkpoint height.
pub fn verify_proof(
    proof_bytes: &[u8],
    expected_block_merkle_root: &CryptoHash,
) -> Result<VerificationResult, VerifyError> {
    info!("Decoding outcome proof ({} bytes) ...", proof_bytes.len());
    let proof = FullOutcomeProof::from_bytes(proof_bytes)?;
    verify_full_outcome_proof(&proof, expected_block_merkle_root)
}

/// Verify an already decoded proof end-to-end.
///
/// Both checks must pass; the first failing one is returned.
pub fn verify_full_outcome_proof(
    proof: &FullOutcomeProof,
    expected_block_merkle_root: &CryptoHash,
) -> Result<VerificationResult, VerifyError> {
    let header = &proof.block_header_lite;

    if proof.outcome_proof.block_hash != header.hash {
        warn!(
            "Outcome proof refers to block {} but the light header hashes to {}",
            proof.outcome_proof.block_hash, header.hash
        );
    }

    info!("Verifying outcome inclusion proof ...");
    let outcome_root = outcome_root_of(proof);
    if outcome_root != header.inner_lite.outcome_root {
        return Err(VerifyError::OutcomeRootMismatch {
            computed: outcome_root,
            expected: header.inner_lite.outcome_root,
        });
    }

    info!(
        "Verifying block inclusion proof for block {} at height {} ...",
        header.hash, header.inner_lite.height
    );
    let block_root = block_root_of(proof);
    if block_root != *expected_block_merkle_root {
        return Err(VerifyError::BlockRootMismatch {
            computed: block_root,
            expected: *expected_block_merkle_root,
        });
    }

    info!("Verification successful!");

    Ok(VerificationResult {
        outcome_id: proof.outcome_proof.outcome_with_id.id,
        block_hash: header.hash,
        block_height: header.inner_lite.height,
        outcome_root,
        block_merkle_root: block_root,
    })
}

/// Outcome root implied by the outcome and outcome-root paths.
pub fn outcome_root_of(proof: &FullOutcomeProof) -> CryptoHash {
    let outcome = &proof.outcome_proof;
    let chunk_root = compute_root(outcome.outcome_with_id.hash, &outcome.proof);
    // The chunk outcome root enters the block-level tree hashed once more
    let leaf = sha256(chunk_root.as_bytes());
    let root = compute_root(leaf, &proof.outcome_root_proof);
    debug!("Outcome {} hashes up to {}", outcome.outcome_with_id.id, root);
    root
}

/// Block merkle root implied by the header hash and the block path.
pub fn block_root_of(proof: &FullOutcomeProof) -> CryptoHash {
    compute_root(proof.block_header_lite.hash, &proof.block_proof)
}
