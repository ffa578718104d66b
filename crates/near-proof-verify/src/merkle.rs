//! Positional Merkle paths and root recomputation.

use serde::{Deserialize, Serialize};

use crate::borsh::{BorshReader, BorshWriter, DecodeError};
use crate::hash::{combine_hash, CryptoHash};

/// Side on which the sibling hash sits relative to the running accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

/// One step of a Merkle path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePathItem {
    pub hash: CryptoHash,
    pub direction: Direction,
}

/// Ordered sibling list from a leaf up to the root
pub type MerklePath = Vec<MerklePathItem>;

impl MerklePathItem {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let hash = reader.read_hash("merkle path item hash")?;
        let offset = reader.position();
        let direction = match reader.read_u8("merkle path item direction")? {
            0 => Direction::Left,
            1 => Direction::Right,
            tag => {
                return Err(DecodeError::InvalidDiscriminant {
                    field: "merkle path item direction",
                    offset,
                    tag,
                })
            }
        };
        Ok(Self { hash, direction })
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        writer.write_hash(&self.hash);
        writer.write_u8(match self.direction {
            Direction::Left => 0,
            Direction::Right => 1,
        });
    }
}

pub fn decode_path(reader: &mut BorshReader<'_>) -> Result<MerklePath, DecodeError> {
    reader.read_list("merkle path", MerklePathItem::decode)
}

pub fn encode_path(writer: &mut BorshWriter, path: &[MerklePathItem]) {
    writer.write_list(path, |w, item| item.encode(w));
}

/// Fold `path` into `leaf`, concatenating in the order fixed by each item's direction.
pub fn compute_root(leaf: CryptoHash, path: &[MerklePathItem]) -> CryptoHash {
    path.iter().fold(leaf, |acc, item| match item.direction {
        Direction::Left => combine_hash(&item.hash, &acc),
        Direction::Right => combine_hash(&acc, &item.hash),
    })
}

/// Build the tree over `leaves` and return its root together with the path of every leaf.
///
/// Pairs are combined left to right; a trailing unpaired node is promoted to the next layer
/// unchanged and contributes no path item at that level. An empty input yields the zero hash.
pub fn merklize(leaves: &[CryptoHash]) -> (CryptoHash, Vec<MerklePath>) {
    if leaves.is_empty() {
        return (CryptoHash::default(), Vec::new());
    }

    let mut layer = leaves.to_vec();
    let mut paths: Vec<MerklePath> = vec![Vec::new(); leaves.len()];
    let mut positions: Vec<usize> = (0..leaves.len()).collect();

    while layer.len() > 1 {
        for (path, position) in paths.iter_mut().zip(positions.iter_mut()) {
            let sibling = *position ^ 1;
            if sibling < layer.len() {
                let direction = if *position % 2 == 0 {
                    Direction::Right
                } else {
                    Direction::Left
                };
                path.push(MerklePathItem {
                    hash: layer[sibling],
                    direction,
                });
            }
            *position /= 2;
        }

        layer = layer
            .chunks(2)
            .map(|chunk| match chunk {
                [left, right] => combine_hash(left, right),
                [single] => *single,
                _ => unreachable!("Chunk size is at most 2"),
            })
            .collect();
    }

    (layer[0], paths)
}
