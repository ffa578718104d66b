//! NEAR light-client proof verification library
//!
//! This crate decodes Borsh-encoded outcome inclusion proofs and checks them end-to-end:
//! the execution outcome against the outcome root of its block, and the block against
//! the block merkle root recorded by a light client at some checkpoint height.
//!
//! # Full Outcome Proof
//!
//! A full outcome proof chains two layers of verification:
//! 1. **Outcome Proof**: Merkle paths from the outcome hash to the header's outcome root
//! 2. **Block Proof**: Merkle path from the header hash to the checkpoint's block merkle root
//!
//! Only the block merkle root is trusted; everything else is recomputed locally.

pub mod borsh;
pub mod hash;
pub mod merkle;
pub mod proof;
pub mod verify;

pub use borsh::{BorshReader, BorshWriter, DecodeError};
pub use hash::{combine_hash, sha256, CryptoHash, HashParseError};
pub use merkle::{compute_root, merklize, Direction, MerklePath, MerklePathItem};
pub use proof::{
    BlockHeaderInnerLite, BlockHeaderLight, ExecutionOutcome, ExecutionOutcomeWithId,
    ExecutionOutcomeWithIdAndProof, ExecutionStatus, FullOutcomeProof,
};
pub use verify::{
    block_root_of, outcome_root_of, verify_full_outcome_proof, verify_proof,
    VerificationResult, VerificationStage, VerifyError,
};
