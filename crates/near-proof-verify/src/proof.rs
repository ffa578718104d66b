//! Types representing the full outcome proof returned by the light client RPC, with
//! Borsh decoders and encoders and the hashes derived while decoding.

use serde::{Serialize, Serializer};

use crate::borsh::{BorshReader, BorshWriter, DecodeError};
use crate::hash::{combine_hash, sha256, CryptoHash};
use crate::merkle::{decode_path, encode_path, MerklePath};

/// Size of the serialized `BlockHeaderInnerLite`
pub const INNER_LITE_SIZE: usize = 208;

/// Result of executing a receipt or transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExecutionStatus {
    /// The execution is pending or unknown
    Unknown,
    /// The execution failed; failure details are not part of the light proof
    Failure,
    /// The final action succeeded and returned some value
    SuccessValue(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    /// The final action produced a receipt whose id is given
    SuccessReceiptId(CryptoHash),
}

/// Execution outcome of a receipt or transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    /// Logs emitted during execution
    #[serde(serialize_with = "serialize_hex_list")]
    pub logs: Vec<Vec<u8>>,
    /// Receipt ids generated by the execution
    pub receipt_ids: Vec<CryptoHash>,
    /// Gas burnt by the execution
    pub gas_burnt: u64,
    /// Tokens burnt corresponding to the gas
    #[serde(serialize_with = "serialize_decimal")]
    pub tokens_burnt: u128,
    /// Account that executed the receipt
    #[serde(serialize_with = "serialize_utf8_lossy")]
    pub executor_id: Vec<u8>,
    /// Execution status
    pub status: ExecutionStatus,
    /// Hash of the bytes from `receipt_ids` through `status`, followed by the hash of each log
    pub merkelization_hashes: Vec<CryptoHash>,
}

/// Execution outcome together with the id of the receipt or transaction it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcomeWithId {
    pub id: CryptoHash,
    pub outcome: ExecutionOutcome,
    /// Leaf hash of this outcome in its chunk's outcome tree
    pub hash: CryptoHash,
}

/// Outcome together with its Merkle path inside the chunk outcome tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcomeWithIdAndProof {
    pub proof: MerklePath,
    pub block_hash: CryptoHash,
    pub outcome_with_id: ExecutionOutcomeWithId,
}

/// Block header fields needed by a light client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeaderInnerLite {
    pub height: u64,
    pub epoch_id: CryptoHash,
    pub next_epoch_id: CryptoHash,
    pub prev_state_root: CryptoHash,
    pub outcome_root: CryptoHash,
    /// Nanoseconds since the unix epoch
    pub timestamp: u64,
    pub next_bp_hash: CryptoHash,
    pub block_merkle_root: CryptoHash,
    /// Digest of the serialized fields above
    pub hash: CryptoHash,
}

/// Light form of a block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeaderLight {
    pub prev_block_hash: CryptoHash,
    pub inner_rest_hash: CryptoHash,
    pub inner_lite: BlockHeaderInnerLite,
    /// Block hash derived from the three components
    pub hash: CryptoHash,
}

/// A self-contained proof that an execution outcome is included in a block, and that
/// the block belongs to the history committed by some later block merkle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullOutcomeProof {
    pub outcome_proof: ExecutionOutcomeWithIdAndProof,
    pub outcome_root_proof: MerklePath,
    pub block_header_lite: BlockHeaderLight,
    pub block_proof: MerklePath,
}

impl ExecutionStatus {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let offset = reader.position();
        match reader.read_u8("execution status")? {
            0 => Ok(ExecutionStatus::Unknown),
            1 => Ok(ExecutionStatus::Failure),
            2 => Ok(ExecutionStatus::SuccessValue(
                reader.read_bytes("execution status success value")?,
            )),
            3 => Ok(ExecutionStatus::SuccessReceiptId(
                reader.read_hash("execution status success receipt id")?,
            )),
            tag => Err(DecodeError::InvalidDiscriminant {
                field: "execution status",
                offset,
                tag,
            }),
        }
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        match self {
            ExecutionStatus::Unknown => writer.write_u8(0),
            ExecutionStatus::Failure => writer.write_u8(1),
            ExecutionStatus::SuccessValue(value) => {
                writer.write_u8(2);
                writer.write_bytes(value);
            }
            ExecutionStatus::SuccessReceiptId(id) => {
                writer.write_u8(3);
                writer.write_hash(id);
            }
        }
    }
}

impl ExecutionOutcome {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let logs = reader.read_list("logs", |r| r.read_bytes("log"))?;

        let start = reader.position();
        let receipt_ids = reader.read_list("receipt ids", |r| r.read_hash("receipt id"))?;
        let gas_burnt = reader.read_u64("gas burnt")?;
        let tokens_burnt = reader.read_u128("tokens burnt")?;
        let executor_id = reader.read_bytes("executor id")?;
        let status = ExecutionStatus::decode(reader)?;

        let mut merkelization_hashes = Vec::with_capacity(logs.len() + 1);
        merkelization_hashes.push(sha256(reader.consumed_since(start)));
        merkelization_hashes.extend(logs.iter().map(|log| sha256(log)));

        Ok(Self {
            logs,
            receipt_ids,
            gas_burnt,
            tokens_burnt,
            executor_id,
            status,
            merkelization_hashes,
        })
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        writer.write_list(&self.logs, |w, log| w.write_bytes(log));
        writer.write_list(&self.receipt_ids, |w, id| w.write_hash(id));
        writer.write_u64(self.gas_burnt);
        writer.write_u128(self.tokens_burnt);
        writer.write_bytes(&self.executor_id);
        self.status.encode(writer);
    }
}

impl ExecutionOutcomeWithId {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let id = reader.read_hash("outcome id")?;
        let outcome = ExecutionOutcome::decode(reader)?;
        let hash = outcome_with_id_hash(&id, &outcome.merkelization_hashes);
        Ok(Self { id, outcome, hash })
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        writer.write_hash(&self.id);
        self.outcome.encode(writer);
    }
}

/// Digest of the length-prefixed hash list `[id, merkelization_hashes...]`
pub fn outcome_with_id_hash(id: &CryptoHash, merkelization_hashes: &[CryptoHash]) -> CryptoHash {
    let mut writer = BorshWriter::new();
    writer.write_u32((merkelization_hashes.len() + 1) as u32);
    writer.write_hash(id);
    for hash in merkelization_hashes {
        writer.write_hash(hash);
    }
    sha256(&writer.into_bytes())
}

impl ExecutionOutcomeWithIdAndProof {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let proof = decode_path(reader)?;
        let block_hash = reader.read_hash("outcome block hash")?;
        let outcome_with_id = ExecutionOutcomeWithId::decode(reader)?;
        Ok(Self {
            proof,
            block_hash,
            outcome_with_id,
        })
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        encode_path(writer, &self.proof);
        writer.write_hash(&self.block_hash);
        self.outcome_with_id.encode(writer);
    }
}

impl BlockHeaderInnerLite {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        // Hash the serialized region before its fields are parsed
        let hash = reader.peek_digest(INNER_LITE_SIZE, "inner lite header")?;
        Ok(Self {
            height: reader.read_u64("height")?,
            epoch_id: reader.read_hash("epoch id")?,
            next_epoch_id: reader.read_hash("next epoch id")?,
            prev_state_root: reader.read_hash("prev state root")?,
            outcome_root: reader.read_hash("outcome root")?,
            timestamp: reader.read_u64("timestamp")?,
            next_bp_hash: reader.read_hash("next block producers hash")?,
            block_merkle_root: reader.read_hash("block merkle root")?,
            hash,
        })
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        writer.write_u64(self.height);
        writer.write_hash(&self.epoch_id);
        writer.write_hash(&self.next_epoch_id);
        writer.write_hash(&self.prev_state_root);
        writer.write_hash(&self.outcome_root);
        writer.write_u64(self.timestamp);
        writer.write_hash(&self.next_bp_hash);
        writer.write_hash(&self.block_merkle_root);
    }
}

impl BlockHeaderLight {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let prev_block_hash = reader.read_hash("prev block hash")?;
        let inner_rest_hash = reader.read_hash("inner rest hash")?;
        let inner_lite = BlockHeaderInnerLite::decode(reader)?;
        let hash = block_hash(&inner_lite.hash, &inner_rest_hash, &prev_block_hash);
        Ok(Self {
            prev_block_hash,
            inner_rest_hash,
            inner_lite,
            hash,
        })
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        writer.write_hash(&self.prev_block_hash);
        writer.write_hash(&self.inner_rest_hash);
        self.inner_lite.encode(writer);
    }
}

/// `hash(hash(inner_lite ++ inner_rest) ++ prev_block_hash)`
pub fn block_hash(
    inner_lite_hash: &CryptoHash,
    inner_rest_hash: &CryptoHash,
    prev_block_hash: &CryptoHash,
) -> CryptoHash {
    let inner = combine_hash(inner_lite_hash, inner_rest_hash);
    combine_hash(&inner, prev_block_hash)
}

impl FullOutcomeProof {
    pub fn decode(reader: &mut BorshReader<'_>) -> Result<Self, DecodeError> {
        let outcome_proof = ExecutionOutcomeWithIdAndProof::decode(reader)?;
        let outcome_root_proof = decode_path(reader)?;
        let block_header_lite = BlockHeaderLight::decode(reader)?;
        let block_proof = decode_path(reader)?;
        Ok(Self {
            outcome_proof,
            outcome_root_proof,
            block_header_lite,
            block_proof,
        })
    }

    /// Decode a proof that must span the whole buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BorshReader::new(data);
        let proof = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(proof)
    }

    pub fn encode(&self, writer: &mut BorshWriter) {
        self.outcome_proof.encode(writer);
        encode_path(writer, &self.outcome_root_proof);
        self.block_header_lite.encode(writer);
        encode_path(writer, &self.block_proof);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BorshWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn serialize_hex_list<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(items.iter().map(hex::encode))
}

/// Balances are rendered as decimal strings, as the NEAR RPC does
fn serialize_decimal<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn serialize_utf8_lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::{Direction, MerklePathItem};

    fn sample_outcome(status: ExecutionStatus) -> ExecutionOutcomeWithId {
        let mut outcome = ExecutionOutcome {
            logs: vec![b"first".to_vec(), b"second".to_vec()],
            receipt_ids: vec![sha256(b"receipt")],
            gas_burnt: 2_428_000_000,
            tokens_burnt: 242_800_000_000_000_000_000,
            executor_id: b"bridge.near".to_vec(),
            status,
            merkelization_hashes: Vec::new(),
        };
        let mut writer = BorshWriter::new();
        writer.write_hash(&sha256(b"id"));
        outcome.encode(&mut writer);
        let bytes = writer.into_bytes();
        let decoded = ExecutionOutcomeWithId::decode(&mut BorshReader::new(&bytes)).unwrap();
        outcome.merkelization_hashes = decoded.outcome.merkelization_hashes.clone();
        assert_eq!(decoded.outcome, outcome);
        decoded
    }

    #[test]
    fn test_status_variants_roundtrip() {
        for status in [
            ExecutionStatus::Unknown,
            ExecutionStatus::Failure,
            ExecutionStatus::SuccessValue(b"ok".to_vec()),
            ExecutionStatus::SuccessReceiptId(sha256(b"next")),
        ] {
            let decoded = sample_outcome(status.clone());
            assert_eq!(decoded.outcome.status, status);
        }
    }

    #[test]
    fn test_invalid_status_discriminant() {
        let mut reader = BorshReader::new(&[4]);
        assert_eq!(
            ExecutionStatus::decode(&mut reader),
            Err(DecodeError::InvalidDiscriminant {
                field: "execution status",
                offset: 0,
                tag: 4
            })
        );
    }

    #[test]
    fn test_merkelization_hashes() {
        let decoded = sample_outcome(ExecutionStatus::Unknown);
        let outcome = &decoded.outcome;

        // The first hash spans receipt ids through status, excluding the logs
        let mut writer = BorshWriter::new();
        writer.write_list(&outcome.receipt_ids, |w, id| w.write_hash(id));
        writer.write_u64(outcome.gas_burnt);
        writer.write_u128(outcome.tokens_burnt);
        writer.write_bytes(&outcome.executor_id);
        outcome.status.encode(&mut writer);

        assert_eq!(
            outcome.merkelization_hashes,
            vec![
                sha256(&writer.into_bytes()),
                sha256(b"first"),
                sha256(b"second")
            ]
        );
        assert_eq!(
            decoded.hash,
            outcome_with_id_hash(&decoded.id, &outcome.merkelization_hashes)
        );
    }

    #[test]
    fn test_outcome_with_id_hash_layout() {
        let id = sha256(b"id");
        let hashes = [sha256(b"a"), sha256(b"b")];
        let mut preimage = 3u32.to_le_bytes().to_vec();
        preimage.extend_from_slice(id.as_bytes());
        preimage.extend_from_slice(hashes[0].as_bytes());
        preimage.extend_from_slice(hashes[1].as_bytes());
        assert_eq!(outcome_with_id_hash(&id, &hashes), sha256(&preimage));
    }

    #[test]
    fn test_inner_lite_hash_covers_serialized_bytes() {
        let inner = BlockHeaderInnerLite {
            height: 57_544_675,
            epoch_id: sha256(b"epoch"),
            next_epoch_id: sha256(b"next epoch"),
            prev_state_root: sha256(b"state"),
            outcome_root: sha256(b"outcomes"),
            timestamp: 1_642_374_301_087_263_118,
            next_bp_hash: sha256(b"producers"),
            block_merkle_root: sha256(b"blocks"),
            hash: CryptoHash::default(),
        };
        let mut writer = BorshWriter::new();
        inner.encode(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), INNER_LITE_SIZE);

        let mut reader = BorshReader::new(&bytes);
        let decoded = BlockHeaderInnerLite::decode(&mut reader).unwrap();
        reader.finish().unwrap();
        assert_eq!(decoded.hash, sha256(&bytes));
        assert_eq!(decoded.height, inner.height);
        assert_eq!(decoded.block_merkle_root, inner.block_merkle_root);
    }

    #[test]
    fn test_full_proof_roundtrip_and_finish() {
        let outcome_with_id = sample_outcome(ExecutionStatus::Failure);
        let proof = FullOutcomeProof {
            outcome_proof: ExecutionOutcomeWithIdAndProof {
                proof: vec![MerklePathItem {
                    hash: sha256(b"sibling"),
                    direction: Direction::Left,
                }],
                block_hash: sha256(b"block"),
                outcome_with_id,
            },
            outcome_root_proof: Vec::new(),
            block_header_lite: BlockHeaderLight {
                prev_block_hash: sha256(b"prev"),
                inner_rest_hash: sha256(b"rest"),
                inner_lite: BlockHeaderInnerLite {
                    height: 1,
                    epoch_id: CryptoHash::default(),
                    next_epoch_id: CryptoHash::default(),
                    prev_state_root: CryptoHash::default(),
                    outcome_root: CryptoHash::default(),
                    timestamp: 0,
                    next_bp_hash: CryptoHash::default(),
                    block_merkle_root: CryptoHash::default(),
                    hash: CryptoHash::default(),
                },
                hash: CryptoHash::default(),
            },
            block_proof: Vec::new(),
        };

        let bytes = proof.to_bytes();
        let decoded = FullOutcomeProof::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.to_bytes(), bytes);
        assert_eq!(
            decoded.block_header_lite.hash,
            block_hash(
                &decoded.block_header_lite.inner_lite.hash,
                &sha256(b"rest"),
                &sha256(b"prev")
            )
        );

        let mut extended = bytes.clone();
        extended.push(0);
        assert_eq!(
            FullOutcomeProof::from_bytes(&extended),
            Err(DecodeError::TrailingBytes {
                offset: bytes.len(),
                trailing: 1
            })
        );
    }
}
