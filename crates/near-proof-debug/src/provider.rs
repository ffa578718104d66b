//! Chain-data provider boundary: block lookups and inclusion proofs, with a read-through
//! cache and a provider backed by a JSON chain snapshot.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use near_proof_verify::CryptoHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Error types for chain-data provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No block was produced at this height (yet); callers probe the next height
    #[error("Unknown block height {0}")]
    UnknownBlockHeight(u64),
    /// No block with this hash is known
    #[error("Unknown block hash {0}")]
    UnknownBlockHash(CryptoHash),
    /// No inclusion proof is available for the receipt at this checkpoint
    #[error("No inclusion proof for receipt {receipt_id} at checkpoint height {checkpoint_height}")]
    MissingProof {
        receipt_id: CryptoHash,
        checkpoint_height: u64,
    },
    /// Every probed height was skipped
    #[error("No block produced in {probes} heights starting at {from}")]
    NoBlockFound { from: u64, probes: u64 },
    /// Failure of the underlying transport
    #[error("Provider transport error: {0}")]
    Transport(String),
    /// Failed to read a snapshot file
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse a snapshot file
    #[error("Failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// Snapshot proof bytes are not valid hex
    #[error("Invalid proof hex in snapshot: {0}")]
    ProofHex(#[from] hex::FromHexError),
}

/// Block fields the debugger relies on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub height: u64,
    pub hash: CryptoHash,
    pub prev_hash: CryptoHash,
    pub epoch_id: CryptoHash,
    /// Root of the merkle tree over the hashes of all previous blocks
    pub block_merkle_root: CryptoHash,
}

/// Source of chain data; implementations are expected to apply their own timeouts and retries
#[cfg_attr(test, mockall::automock)]
pub trait ChainDataProvider {
    /// Block produced at `height`, or [`ProviderError::UnknownBlockHeight`] if none was
    fn block_by_height(&self, height: u64) -> Result<BlockRecord, ProviderError>;

    /// Block with the given hash
    fn block_by_hash(&self, hash: &CryptoHash) -> Result<BlockRecord, ProviderError>;

    /// Borsh-encoded full outcome proof for `receipt_id`, against the light client head at
    /// `checkpoint_height`
    fn inclusion_proof_bytes(
        &self,
        receipt_id: &CryptoHash,
        checkpoint_height: u64,
    ) -> Result<Vec<u8>, ProviderError>;
}

impl<P: ChainDataProvider + ?Sized> ChainDataProvider for &P {
    fn block_by_height(&self, height: u64) -> Result<BlockRecord, ProviderError> {
        (**self).block_by_height(height)
    }

    fn block_by_hash(&self, hash: &CryptoHash) -> Result<BlockRecord, ProviderError> {
        (**self).block_by_hash(hash)
    }

    fn inclusion_proof_bytes(
        &self,
        receipt_id: &CryptoHash,
        checkpoint_height: u64,
    ) -> Result<Vec<u8>, ProviderError> {
        (**self).inclusion_proof_bytes(receipt_id, checkpoint_height)
    }
}

/// First block produced at `height` or above, probing at most `max_probes` heights.
pub fn resolve_block_at_or_after<P: ChainDataProvider + ?Sized>(
    provider: &P,
    height: u64,
    max_probes: u64,
) -> Result<BlockRecord, ProviderError> {
    for probe in 0..max_probes {
        let Some(candidate) = height.checked_add(probe) else {
            break;
        };
        match provider.block_by_height(candidate) {
            Ok(block) => return Ok(block),
            Err(ProviderError::UnknownBlockHeight(_)) => {
                debug!("Height {} was skipped, probing the next one", candidate);
            }
            Err(err) => return Err(err),
        }
    }
    Err(ProviderError::NoBlockFound {
        from: height,
        probes: max_probes,
    })
}

/// Idempotent read-through cache; only successful lookups are remembered
pub struct CachedProvider<P> {
    inner: P,
    by_height: RefCell<HashMap<u64, BlockRecord>>,
    by_hash: RefCell<HashMap<CryptoHash, BlockRecord>>,
    proofs: RefCell<HashMap<(CryptoHash, u64), Vec<u8>>>,
}

impl<P: ChainDataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            by_height: RefCell::new(HashMap::new()),
            by_hash: RefCell::new(HashMap::new()),
            proofs: RefCell::new(HashMap::new()),
        }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    fn remember(&self, block: &BlockRecord) {
        self.by_height
            .borrow_mut()
            .insert(block.height, block.clone());
        self.by_hash.borrow_mut().insert(block.hash, block.clone());
    }
}

impl<P: ChainDataProvider> ChainDataProvider for CachedProvider<P> {
    fn block_by_height(&self, height: u64) -> Result<BlockRecord, ProviderError> {
        if let Some(block) = self.by_height.borrow().get(&height) {
            return Ok(block.clone());
        }
        let block = self.inner.block_by_height(height)?;
        self.remember(&block);
        Ok(block)
    }

    fn block_by_hash(&self, hash: &CryptoHash) -> Result<BlockRecord, ProviderError> {
        if let Some(block) = self.by_hash.borrow().get(hash) {
            return Ok(block.clone());
        }
        let block = self.inner.block_by_hash(hash)?;
        self.remember(&block);
        Ok(block)
    }

    fn inclusion_proof_bytes(
        &self,
        receipt_id: &CryptoHash,
        checkpoint_height: u64,
    ) -> Result<Vec<u8>, ProviderError> {
        let key = (*receipt_id, checkpoint_height);
        if let Some(proof) = self.proofs.borrow().get(&key) {
            return Ok(proof.clone());
        }
        let proof = self
            .inner
            .inclusion_proof_bytes(receipt_id, checkpoint_height)?;
        self.proofs.borrow_mut().insert(key, proof.clone());
        Ok(proof)
    }
}

/// Inclusion proof recorded in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotProof {
    pub receipt_id: CryptoHash,
    pub checkpoint_height: u64,
    /// Hex-encoded proof bytes
    pub proof: String,
}

/// Recorded slice of chain history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub blocks: Vec<BlockRecord>,
    #[serde(default)]
    pub proofs: Vec<SnapshotProof>,
}

/// Provider answering from a recorded [`ChainSnapshot`]; heights missing from the
/// snapshot are reported as skipped
#[derive(Debug, Default)]
pub struct SnapshotProvider {
    by_height: BTreeMap<u64, BlockRecord>,
    by_hash: HashMap<CryptoHash, u64>,
    proofs: HashMap<(CryptoHash, u64), Vec<u8>>,
}

impl SnapshotProvider {
    pub fn new(snapshot: ChainSnapshot) -> Result<Self, ProviderError> {
        let mut provider = Self::default();
        for block in snapshot.blocks {
            provider.by_hash.insert(block.hash, block.height);
            provider.by_height.insert(block.height, block);
        }
        for SnapshotProof {
            receipt_id,
            checkpoint_height,
            proof,
        } in snapshot.proofs
        {
            let bytes = hex::decode(proof.trim().trim_start_matches("0x"))?;
            provider
                .proofs
                .insert((receipt_id, checkpoint_height), bytes);
        }
        Ok(provider)
    }

    /// Load a snapshot from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ProviderError> {
        info!("Loading chain snapshot from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let snapshot: ChainSnapshot = serde_json::from_str(&contents)?;
        let provider = Self::new(snapshot)?;
        info!(
            "Loaded {} blocks and {} proofs",
            provider.by_height.len(),
            provider.proofs.len()
        );
        Ok(provider)
    }

    /// Highest recorded height
    pub fn head_height(&self) -> Option<u64> {
        self.by_height.keys().next_back().copied()
    }
}

impl ChainDataProvider for SnapshotProvider {
    fn block_by_height(&self, height: u64) -> Result<BlockRecord, ProviderError> {
        self.by_height
            .get(&height)
            .cloned()
            .ok_or(ProviderError::UnknownBlockHeight(height))
    }

    fn block_by_hash(&self, hash: &CryptoHash) -> Result<BlockRecord, ProviderError> {
        self.by_hash
            .get(hash)
            .and_then(|height| self.by_height.get(height))
            .cloned()
            .ok_or(ProviderError::UnknownBlockHash(*hash))
    }

    fn inclusion_proof_bytes(
        &self,
        receipt_id: &CryptoHash,
        checkpoint_height: u64,
    ) -> Result<Vec<u8>, ProviderError> {
        self.proofs
            .get(&(*receipt_id, checkpoint_height))
            .cloned()
            .ok_or(ProviderError::MissingProof {
                receipt_id: *receipt_id,
                checkpoint_height,
            })
    }
}
