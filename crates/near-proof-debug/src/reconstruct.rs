//! Block-hash Merkle aggregates rebuilt from chain history.
//!
//! Forward ranges walk heights upward, skipping heights where no block was produced.
//! Backward ranges follow `prev_hash` links and so never see skipped heights. Both split a
//! range into halves recursively and return the aggregate together with the cursor just
//! past the range, so no state is shared between the recursive calls.

use near_proof_verify::{combine_hash, merklize, CryptoHash, DecodeError, VerificationStage};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DebugConfig;
use crate::provider::{resolve_block_at_or_after, ChainDataProvider, ProviderError};

/// Error types for range reconstruction and proof diagnosis
#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Range size must be a non-zero power of two, got {0}")]
    InvalidRangeSize(u64),
    #[error("Invalid height interval [{lo}, {hi})")]
    InvalidInterval { lo: u64, hi: u64 },
    /// Refused because the interval is wider than the configured bound
    #[error("Interval [{lo}, {hi}) is wider than the configured maximum of {max} heights")]
    RangeTooExpensive { lo: u64, hi: u64, max: u64 },
    /// Refused because the rebuild would fetch more blocks than the configured bound
    #[error("Rebuilding over {blocks} blocks exceeds the configured maximum of {max}")]
    RebuildTooExpensive { blocks: u64, max: u64 },
    #[error("Malformed proof: {0}")]
    Decode(#[from] DecodeError),
}

impl ReconstructError {
    /// Whether the failure is a cost bound rather than evidence about the chain
    pub fn is_inconclusive(&self) -> bool {
        matches!(
            self,
            ReconstructError::RangeTooExpensive { .. }
                | ReconstructError::RebuildTooExpensive { .. }
                | ReconstructError::Provider(ProviderError::NoBlockFound { .. })
        )
    }

    pub fn stage(&self) -> Option<VerificationStage> {
        match self {
            ReconstructError::Decode(_) => Some(VerificationStage::Decode),
            err if err.is_inconclusive() => Some(VerificationStage::Inconclusive),
            _ => None,
        }
    }
}

/// Aggregate hash of a range of blocks and the cursor just past it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeHash<C> {
    /// Forward: first height after the range. Backward: hash of the earliest block in the
    /// range, which ends the next range to the left.
    pub next: C,
    pub hash: CryptoHash,
}

fn check_range_size(size: u64) -> Result<(), ReconstructError> {
    if size == 0 || !size.is_power_of_two() {
        return Err(ReconstructError::InvalidRangeSize(size));
    }
    Ok(())
}

/// Aggregate of the `size` produced blocks starting at height `start`.
pub fn forward_range<P: ChainDataProvider + ?Sized>(
    provider: &P,
    start: u64,
    size: u64,
    config: &DebugConfig,
) -> Result<RangeHash<u64>, ReconstructError> {
    check_range_size(size)?;
    forward(provider, start, size, config.max_height_probes)
}

fn forward<P: ChainDataProvider + ?Sized>(
    provider: &P,
    start: u64,
    size: u64,
    max_probes: u64,
) -> Result<RangeHash<u64>, ReconstructError> {
    if size == 1 {
        let block = resolve_block_at_or_after(provider, start, max_probes)?;
        return Ok(RangeHash {
            next: block.height + 1,
            hash: block.hash,
        });
    }

    let left = forward(provider, start, size / 2, max_probes)?;
    let right = forward(provider, left.next, size / 2, max_probes)?;
    debug!(
        "Forward range of {} blocks from height {} ends before height {}",
        size, start, right.next
    );
    Ok(RangeHash {
        next: right.next,
        hash: combine_hash(&left.hash, &right.hash),
    })
}

/// Aggregate of the `size` blocks strictly before height `end_height`.
///
/// When no block was produced at `end_height`, the range ends before the first block
/// produced after it, so a forward range and the backward range from its `next` agree.
pub fn backward_range<P: ChainDataProvider + ?Sized>(
    provider: &P,
    end_height: u64,
    size: u64,
    config: &DebugConfig,
) -> Result<RangeHash<CryptoHash>, ReconstructError> {
    check_range_size(size)?;
    let end = resolve_block_at_or_after(provider, end_height, config.max_height_probes)?;
    backward(provider, end.hash, size)
}

/// Aggregate of the `size` blocks strictly before the block with hash `end`.
pub fn backward_range_from<P: ChainDataProvider + ?Sized>(
    provider: &P,
    end: CryptoHash,
    size: u64,
) -> Result<RangeHash<CryptoHash>, ReconstructError> {
    check_range_size(size)?;
    backward(provider, end, size)
}

fn backward<P: ChainDataProvider + ?Sized>(
    provider: &P,
    end: CryptoHash,
    size: u64,
) -> Result<RangeHash<CryptoHash>, ReconstructError> {
    if size == 1 {
        let block = provider.block_by_hash(&end)?;
        return Ok(RangeHash {
            next: block.prev_hash,
            hash: block.prev_hash,
        });
    }

    // The right half is adjacent to `end`, so it is walked first
    let right = backward(provider, end, size / 2)?;
    let left = backward(provider, right.next, size / 2)?;
    Ok(RangeHash {
        next: left.next,
        hash: combine_hash(&left.hash, &right.hash),
    })
}

/// Aggregate over the heights `[lo, hi)`, split at the midpoint. Every height in the
/// interval must hold a block.
pub fn range_between<P: ChainDataProvider + ?Sized>(
    provider: &P,
    lo: u64,
    hi: u64,
    config: &DebugConfig,
) -> Result<CryptoHash, ReconstructError> {
    if lo >= hi {
        return Err(ReconstructError::InvalidInterval { lo, hi });
    }
    if hi - lo > config.max_range_width {
        return Err(ReconstructError::RangeTooExpensive {
            lo,
            hi,
            max: config.max_range_width,
        });
    }
    between(provider, lo, hi)
}

fn between<P: ChainDataProvider + ?Sized>(
    provider: &P,
    lo: u64,
    hi: u64,
) -> Result<CryptoHash, ReconstructError> {
    if hi - lo == 1 {
        return Ok(provider.block_by_height(lo)?.hash);
    }
    let mid = lo + (hi - lo) / 2;
    let left = between(provider, lo, mid)?;
    let right = between(provider, mid, hi)?;
    Ok(combine_hash(&left, &right))
}

/// Block merkle root over the `ordinal` blocks strictly before the block at `height`.
///
/// `ordinal` is the block's position in the chain, so the result is what its
/// `block_merkle_root` commits to. Leaves are combined pairwise with a trailing unpaired
/// node promoted unchanged, which gives the same root as folding the chain's partial
/// merkle tree peaks.
pub fn rebuild_block_merkle_root<P: ChainDataProvider + ?Sized>(
    provider: &P,
    height: u64,
    ordinal: u64,
    config: &DebugConfig,
) -> Result<CryptoHash, ReconstructError> {
    if ordinal > config.max_rebuild_blocks {
        return Err(ReconstructError::RebuildTooExpensive {
            blocks: ordinal,
            max: config.max_rebuild_blocks,
        });
    }

    let block = provider.block_by_height(height)?;
    info!(
        "Rebuilding block merkle root of block {} over {} previous blocks ...",
        block.hash, ordinal
    );

    let mut leaves = Vec::with_capacity(ordinal as usize);
    let mut cursor = block.prev_hash;
    for _ in 0..ordinal {
        let leaf = provider.block_by_hash(&cursor)?;
        leaves.push(leaf.hash);
        cursor = leaf.prev_hash;
    }
    leaves.reverse();

    let (root, _) = merklize(&leaves);
    if root == block.block_merkle_root {
        debug!("Rebuilt root {} matches block {}", root, block.hash);
    } else {
        warn!(
            "Rebuilt root {} differs from {} recorded in block {}",
            root, block.block_merkle_root, block.hash
        );
    }
    Ok(root)
}
