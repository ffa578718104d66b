//! Level-by-level check of a block path against chain history, and end-to-end diagnosis
//! of a receipt's inclusion proof.

use near_proof_verify::{
    compute_root, verify_full_outcome_proof, CryptoHash, Direction, FullOutcomeProof,
    MerklePathItem, VerificationResult, VerifyError,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DebugConfig;
use crate::provider::ChainDataProvider;
use crate::reconstruct::{backward_range_from, forward_range, ReconstructError};

/// Result of recomputing one sibling of a block path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LevelOutcome {
    /// Chain history reproduces the sibling hash
    Match,
    /// Chain history gives a different sibling hash
    Mismatch { recomputed: CryptoHash },
    /// Recomputation is disabled
    Skipped,
    /// The sibling could not be rebuilt within the configured bounds
    Inconclusive { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    pub level: usize,
    pub direction: Direction,
    /// Number of blocks under the sibling subtree
    pub size: u64,
    pub proof_hash: CryptoHash,
    pub outcome: LevelOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockProofReport {
    pub block_height: u64,
    /// Block hash according to the provider; the walk starts from it
    pub block_hash: CryptoHash,
    pub levels: Vec<LevelReport>,
    /// Lowest level whose sibling disagrees with chain history
    pub first_divergence: Option<usize>,
    /// Root implied by the block hash and the path
    pub computed_root: CryptoHash,
    pub expected_root: CryptoHash,
}

impl BlockProofReport {
    pub fn root_matches(&self) -> bool {
        self.computed_root == self.expected_root
    }
}

/// Walk `block_proof` bottom-up from the block at `block_height`, rebuilding every sibling
/// subtree from chain history.
///
/// Right siblings are rebuilt forward from the height after the covered range, left
/// siblings backward from the earliest covered block. Once a side has been skipped its
/// cursor is unknown, and every later level on that side is inconclusive.
pub fn check_block_proof<P: ChainDataProvider + ?Sized>(
    provider: &P,
    block_height: u64,
    block_proof: &[MerklePathItem],
    expected_root: &CryptoHash,
    config: &DebugConfig,
) -> Result<BlockProofReport, ReconstructError> {
    info!(
        "Checking block path of {} levels for block at height {} ...",
        block_proof.len(),
        block_height
    );
    let block = provider.block_by_height(block_height)?;

    let mut cursors = Cursors {
        left: Some(block.hash),
        right: block_height.checked_add(1),
    };
    let mut levels = Vec::with_capacity(block_proof.len());
    let mut size: u64 = 1;

    for (level, item) in block_proof.iter().enumerate() {
        let outcome = if config.recompute_levels {
            recompute_level(provider, item, size, &mut cursors, config)?
        } else {
            LevelOutcome::Skipped
        };

        match &outcome {
            LevelOutcome::Mismatch { recomputed } => warn!(
                "Level {} ({:?}, {} blocks) diverges: path has {}, chain gives {}",
                level, item.direction, size, item.hash, recomputed
            ),
            LevelOutcome::Inconclusive { reason } => {
                debug!("Level {} is inconclusive: {}", level, reason)
            }
            _ => debug!("Level {} ({:?}, {} blocks): {:?}", level, item.direction, size, outcome),
        }

        levels.push(LevelReport {
            level,
            direction: item.direction,
            size,
            proof_hash: item.hash,
            outcome,
        });
        size = size.saturating_mul(2);
    }

    let first_divergence = levels
        .iter()
        .position(|level| matches!(level.outcome, LevelOutcome::Mismatch { .. }));
    let computed_root = compute_root(block.hash, block_proof);

    Ok(BlockProofReport {
        block_height,
        block_hash: block.hash,
        levels,
        first_divergence,
        computed_root,
        expected_root: *expected_root,
    })
}

/// Positions just outside the range covered so far
struct Cursors {
    /// Earliest covered block
    left: Option<CryptoHash>,
    /// First height after the covered range
    right: Option<u64>,
}

fn recompute_level<P: ChainDataProvider + ?Sized>(
    provider: &P,
    item: &MerklePathItem,
    size: u64,
    cursors: &mut Cursors,
    config: &DebugConfig,
) -> Result<LevelOutcome, ReconstructError> {
    let recomputed = match item.direction {
        Direction::Right => {
            let Some(start) = cursors.right else {
                return Ok(lost_cursor("right"));
            };
            if size > config.max_level_size {
                cursors.right = None;
                return Ok(too_large(size, config));
            }
            match forward_range(provider, start, size, config) {
                Ok(range) => {
                    cursors.right = Some(range.next);
                    range.hash
                }
                Err(err) if err.is_inconclusive() => {
                    cursors.right = None;
                    return Ok(LevelOutcome::Inconclusive {
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Direction::Left => {
            let Some(end) = cursors.left else {
                return Ok(lost_cursor("left"));
            };
            if size > config.max_level_size {
                cursors.left = None;
                return Ok(too_large(size, config));
            }
            match backward_range_from(provider, end, size) {
                Ok(range) => {
                    cursors.left = Some(range.next);
                    range.hash
                }
                // Missing history only invalidates the left cursor
                Err(ReconstructError::Provider(err)) => {
                    cursors.left = None;
                    return Ok(LevelOutcome::Inconclusive {
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    };

    if recomputed == item.hash {
        Ok(LevelOutcome::Match)
    } else {
        Ok(LevelOutcome::Mismatch { recomputed })
    }
}

fn lost_cursor(side: &str) -> LevelOutcome {
    LevelOutcome::Inconclusive {
        reason: format!("{} boundary unknown after an earlier skipped level", side),
    }
}

fn too_large(size: u64, config: &DebugConfig) -> LevelOutcome {
    LevelOutcome::Inconclusive {
        reason: format!(
            "subtree of {} blocks exceeds the configured maximum of {}",
            size, config.max_level_size
        ),
    }
}

/// Outcome of diagnosing a receipt's inclusion proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "diagnosis", rename_all = "snake_case")]
pub enum Diagnosis {
    /// The proof verifies against the checkpoint
    Verified(VerificationResult),
    /// The outcome does not hash up to the header's outcome root
    OutcomeRootMismatch {
        computed: CryptoHash,
        expected: CryptoHash,
    },
    /// The block path does not reach the checkpoint's block merkle root
    BlockProof(BlockProofReport),
}

/// Fetch the inclusion proof of `receipt_id` against the checkpoint at `checkpoint_height`,
/// verify it, and locate the diverging level of the block path if it fails.
pub fn diagnose_receipt<P: ChainDataProvider + ?Sized>(
    provider: &P,
    receipt_id: &CryptoHash,
    checkpoint_height: u64,
    config: &DebugConfig,
) -> Result<Diagnosis, ReconstructError> {
    let checkpoint = provider.block_by_height(checkpoint_height)?;
    info!(
        "Checkpoint block {} at height {} commits to block merkle root {}",
        checkpoint.hash, checkpoint.height, checkpoint.block_merkle_root
    );

    let bytes = provider.inclusion_proof_bytes(receipt_id, checkpoint_height)?;
    let proof = FullOutcomeProof::from_bytes(&bytes)?;

    match verify_full_outcome_proof(&proof, &checkpoint.block_merkle_root) {
        Ok(result) => Ok(Diagnosis::Verified(result)),
        Err(VerifyError::OutcomeRootMismatch { computed, expected }) => {
            Ok(Diagnosis::OutcomeRootMismatch { computed, expected })
        }
        Err(VerifyError::BlockRootMismatch { computed, expected }) => {
            warn!(
                "Block path reaches {} instead of {}, checking it against chain history",
                computed, expected
            );
            let report = check_block_proof(
                provider,
                proof.block_header_lite.inner_lite.height,
                &proof.block_proof,
                &expected,
                config,
            )?;
            Ok(Diagnosis::BlockProof(report))
        }
        Err(VerifyError::Decode(err)) => Err(err.into()),
    }
}
