//! SHA-256 digests used for merkleization and header chaining.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Size of a digest in bytes
pub const HASH_SIZE: usize = 32;

/// Error types for parsing a textual hash
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HashParseError {
    /// Invalid base58 string
    #[error("Invalid base58 hash: {0}")]
    Base58(String),
    /// Invalid hex string
    #[error("Invalid hex hash: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Decoded value has the wrong size
    #[error("Invalid hash length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// 32-byte SHA-256 digest
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CryptoHash(pub [u8; HASH_SIZE]);

impl CryptoHash {
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Parse a hash from a hex string, with or without `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hash from either its base58 form or a hex form.
    ///
    /// 64-character strings are hex; the base58 form of a 32-byte value never reaches 64 chars.
    pub fn parse_any(s: &str) -> Result<Self, HashParseError> {
        let trimmed = s.trim();
        if trimmed.starts_with("0x") || trimmed.len() == 2 * HASH_SIZE {
            Self::from_hex(trimmed)
        } else {
            trimmed.parse()
        }
    }
}

impl TryFrom<&[u8]> for CryptoHash {
    type Error = HashParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| HashParseError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl From<[u8; HASH_SIZE]> for CryptoHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for CryptoHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash({self})")
    }
}

impl FromStr for CryptoHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| HashParseError::Base58(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for CryptoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CryptoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_any(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute the SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> CryptoHash {
    CryptoHash(Sha256::digest(data).into())
}

/// Hash of the concatenation `left ++ right`; the order of the operands is significant
pub fn combine_hash(left: &CryptoHash, right: &CryptoHash) -> CryptoHash {
    let mut hasher = Sha256::new();
    hasher.update(left.0);
    hasher.update(right.0);
    CryptoHash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256(&[]).to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_combine_hash_is_ordered() {
        let zero = CryptoHash::default();
        let ones = CryptoHash([1u8; 32]);
        assert_eq!(
            combine_hash(&zero, &ones).to_hex(),
            "5c85955f709283ecce2b74f1b1552918819f390911816e7bb466805a38ab87f3"
        );
        assert_ne!(combine_hash(&zero, &ones), combine_hash(&ones, &zero));
    }

    #[test]
    fn test_base58_display_and_parse() {
        let hash = CryptoHash::from_hex(
            "1a3662805ec05aec9c17c246ead6c0a45f5e85fe7e5b8a69ea16dccc7683cf42",
        )
        .unwrap();
        assert_eq!(
            hash.to_string(),
            "2mKhW7WJZfqSkMRDtAKuGm62j2Txdt3VfUysZzmAV4vd"
        );
        assert_eq!(
            "2mKhW7WJZfqSkMRDtAKuGm62j2Txdt3VfUysZzmAV4vd"
                .parse::<CryptoHash>()
                .unwrap(),
            hash
        );
        assert_eq!(
            CryptoHash::default().to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn test_parse_any_accepts_both_forms() {
        let from_b58 = CryptoHash::parse_any("2mKhW7WJZfqSkMRDtAKuGm62j2Txdt3VfUysZzmAV4vd").unwrap();
        let from_hex = CryptoHash::parse_any(
            "0x1a3662805ec05aec9c17c246ead6c0a45f5e85fe7e5b8a69ea16dccc7683cf42",
        )
        .unwrap();
        assert_eq!(from_b58, from_hex);
    }

    #[test]
    fn test_invalid_length() {
        assert_eq!(
            CryptoHash::from_hex("abcd"),
            Err(HashParseError::InvalidLength(2))
        );
        assert!("0OIl".parse::<CryptoHash>().is_err());
    }

    #[test]
    fn test_invalid_hex_digit() {
        let err = CryptoHash::from_hex(&"zz".repeat(32)).unwrap_err();
        assert!(matches!(err, HashParseError::Hex(_)));
        assert_eq!(err, CryptoHash::parse_any(&"zz".repeat(32)).unwrap_err());
    }
}
