use std::io::Write;

use near_proof_debug::{
    backward_range, find_epoch_change, forward_range, range_between, rebuild_block_merkle_root,
    BlockRecord, CachedProvider, ChainDataProvider, ChainSnapshot, DebugConfig, ProviderError,
    SnapshotProvider,
};
use near_proof_verify::{combine_hash, merklize, sha256, CryptoHash};

fn block_hash(height: u64) -> CryptoHash {
    sha256(format!("block {}", height).as_bytes())
}

/// Heights 1000..=1040 with 1013 and 1027 skipped; a new epoch starts at 1020
fn snapshot() -> ChainSnapshot {
    let mut prev_hash = CryptoHash::default();
    let mut blocks = Vec::new();
    for height in (1000..=1040).filter(|h| *h != 1013 && *h != 1027) {
        let epoch = if height < 1020 { "epoch a" } else { "epoch b" };
        let hash = block_hash(height);
        blocks.push(BlockRecord {
            height,
            hash,
            prev_hash,
            epoch_id: sha256(epoch.as_bytes()),
            block_merkle_root: CryptoHash::default(),
        });
        prev_hash = hash;
    }
    ChainSnapshot {
        blocks,
        proofs: Vec::new(),
    }
}

fn write_snapshot(snapshot: &ChainSnapshot) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(snapshot).unwrap().as_bytes())
        .unwrap();
    file
}

#[test]
fn snapshot_file_round_trips() {
    let file = write_snapshot(&snapshot());
    let provider = SnapshotProvider::from_json_file(file.path()).unwrap();
    assert_eq!(provider.head_height(), Some(1040));

    let block = provider.block_by_height(1014).unwrap();
    assert_eq!(block.prev_hash, block_hash(1012));
    assert!(matches!(
        provider.block_by_height(1013),
        Err(ProviderError::UnknownBlockHeight(1013))
    ));
}

#[test]
fn hashes_are_base58_in_snapshot_files() {
    let json = serde_json::to_value(snapshot()).unwrap();
    assert_eq!(json["blocks"][0]["hash"], block_hash(1000).to_string());
}

#[test]
fn forward_and_backward_ranges_agree_over_skipped_heights() {
    let provider = CachedProvider::new(SnapshotProvider::new(snapshot()).unwrap());
    let config = DebugConfig::default();

    for start in [1000, 1009, 1010, 1024] {
        for size in [1, 2, 4, 8] {
            let forward = forward_range(&provider, start, size, &config).unwrap();
            let backward = backward_range(&provider, forward.next, size, &config).unwrap();
            assert_eq!(forward.hash, backward.hash, "start {} size {}", start, size);
        }
    }
}

#[test]
fn range_between_is_bounded() {
    let provider = SnapshotProvider::new(snapshot()).unwrap();
    let config = DebugConfig {
        max_range_width: 4,
        ..DebugConfig::default()
    };
    let hash = range_between(&provider, 1000, 1004, &config).unwrap();
    let expected = combine_hash(
        &combine_hash(&block_hash(1000), &block_hash(1001)),
        &combine_hash(&block_hash(1002), &block_hash(1003)),
    );
    assert_eq!(hash, expected);

    let err = range_between(&provider, 1000, 1005, &config).unwrap_err();
    assert!(err.is_inconclusive());
}

#[test]
fn rebuilt_root_spans_skipped_heights() {
    let provider = CachedProvider::new(SnapshotProvider::new(snapshot()).unwrap());
    let leaves: Vec<CryptoHash> = (1000..1014)
        .filter(|h| *h != 1013)
        .map(block_hash)
        .collect();
    let (expected, _) = merklize(&leaves);

    let root =
        rebuild_block_merkle_root(&provider, 1014, 13, &DebugConfig::default()).unwrap();
    assert_eq!(root, expected);
}

#[test]
fn epoch_change_is_found() {
    let file = write_snapshot(&snapshot());
    let provider = CachedProvider::new(SnapshotProvider::from_json_file(file.path()).unwrap());
    let block = find_epoch_change(&provider, 1000, 1040, 5).unwrap().unwrap();
    assert_eq!(block.height, 1020);
    assert_eq!(block.hash, block_hash(1020));
}
