//! Synthetic chains and proofs for unit tests.

use std::ops::RangeInclusive;

use near_proof_verify::{
    compute_root, merklize, sha256, BlockHeaderInnerLite, BlockHeaderLight, BorshReader,
    BorshWriter, CryptoHash, ExecutionOutcome, ExecutionOutcomeWithId,
    ExecutionOutcomeWithIdAndProof, ExecutionStatus, FullOutcomeProof,
};

use crate::provider::{BlockRecord, ChainSnapshot};

pub fn test_block_hash(height: u64) -> CryptoHash {
    sha256(&height.to_le_bytes())
}

pub fn test_epoch_id(height: u64, epoch_length: u64) -> CryptoHash {
    sha256(&(height / epoch_length).to_be_bytes())
}

/// Blocks at every height of `heights` except `skipped`, hashed with [`test_block_hash`]
pub fn synthetic_chain(
    heights: RangeInclusive<u64>,
    skipped: &[u64],
    epoch_length: u64,
) -> ChainSnapshot {
    let blocks: Vec<(u64, CryptoHash)> = heights
        .filter(|h| !skipped.contains(h))
        .map(|h| (h, test_block_hash(h)))
        .collect();
    chain_from_hashes(&blocks, epoch_length)
}

/// Link `(height, hash)` pairs into a chain; each block commits to the merkle root of all
/// blocks before it.
pub fn chain_from_hashes(blocks: &[(u64, CryptoHash)], epoch_length: u64) -> ChainSnapshot {
    let hashes: Vec<CryptoHash> = blocks.iter().map(|(_, hash)| *hash).collect();
    let blocks = blocks
        .iter()
        .enumerate()
        .map(|(i, (height, hash))| BlockRecord {
            height: *height,
            hash: *hash,
            prev_hash: if i == 0 {
                CryptoHash::default()
            } else {
                hashes[i - 1]
            },
            epoch_id: test_epoch_id(*height, epoch_length),
            block_merkle_root: merklize(&hashes[..i]).0,
        })
        .collect();
    ChainSnapshot {
        blocks,
        proofs: Vec::new(),
    }
}

/// Outcome proof for a receipt in a block at `height`, with a consistent outcome root and an
/// empty block path.
pub fn outcome_proof_at(height: u64, receipt_id: CryptoHash) -> FullOutcomeProof {
    let outcome = ExecutionOutcome {
        logs: vec![],
        receipt_ids: vec![sha256(b"child receipt")],
        gas_burnt: 2_428_000_000_000,
        tokens_burnt: 242_800_000_000_000_000_000,
        executor_id: b"relay.aurora".to_vec(),
        status: ExecutionStatus::SuccessReceiptId(sha256(b"child receipt")),
        merkelization_hashes: vec![],
    };
    let mut writer = BorshWriter::new();
    writer.write_hash(&receipt_id);
    outcome.encode(&mut writer);
    let bytes = writer.into_bytes();
    let outcome_with_id =
        ExecutionOutcomeWithId::decode(&mut BorshReader::new(&bytes)).expect("Valid outcome");

    let outcome_root = sha256(compute_root(outcome_with_id.hash, &[]).as_bytes());
    let header = BlockHeaderLight {
        prev_block_hash: test_block_hash(height - 1),
        inner_rest_hash: sha256(b"inner rest"),
        inner_lite: BlockHeaderInnerLite {
            height,
            epoch_id: sha256(b"epoch"),
            next_epoch_id: sha256(b"next epoch"),
            prev_state_root: sha256(b"state"),
            outcome_root,
            timestamp: 1_642_374_301_087_263_118,
            next_bp_hash: sha256(b"next bp"),
            block_merkle_root: sha256(b"block merkle root"),
            hash: CryptoHash::default(),
        },
        hash: CryptoHash::default(),
    };
    // Round trip so the derived header hashes are populated
    let mut writer = BorshWriter::new();
    header.encode(&mut writer);
    let bytes = writer.into_bytes();
    let header = BlockHeaderLight::decode(&mut BorshReader::new(&bytes)).expect("Valid header");

    FullOutcomeProof {
        outcome_proof: ExecutionOutcomeWithIdAndProof {
            proof: vec![],
            block_hash: header.hash,
            outcome_with_id,
        },
        outcome_root_proof: vec![],
        block_header_lite: header,
        block_proof: vec![],
    }
}
