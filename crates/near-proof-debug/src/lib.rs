//! Localization of failing NEAR outcome proofs
//!
//! This crate rebuilds block-hash Merkle aggregates directly from chain history, walking a
//! chain-data provider, and compares them level by level with a proof's block path. It also
//! provides a generic binary search for the height at which some chain property changes.

pub mod boundary;
pub mod check;
pub mod config;
pub mod provider;
pub mod reconstruct;

#[cfg(test)]
mod testing;

pub use boundary::{find_all_boundaries, find_boundary, find_epoch_change};
pub use check::{
    check_block_proof, diagnose_receipt, BlockProofReport, Diagnosis, LevelOutcome, LevelReport,
};
pub use config::{ConfigError, DebugConfig};
pub use provider::{
    resolve_block_at_or_after, BlockRecord, CachedProvider, ChainDataProvider, ChainSnapshot,
    ProviderError, SnapshotProof, SnapshotProvider,
};
pub use reconstruct::{
    backward_range, backward_range_from, forward_range, range_between, rebuild_block_merkle_root,
    RangeHash, ReconstructError,
};
