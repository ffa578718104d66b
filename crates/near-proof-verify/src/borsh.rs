//! Cursor-based Borsh reader and the matching writer.
//!
//! Layout rules: fixed-width integers are little-endian, a `u128` is two `u64` halves
//! combined as `(first << 64) | second`, blobs and lists carry a `u32` length prefix,
//! and a boolean is a single byte that must be 0 or 1.

use thiserror::Error;

use crate::hash::{sha256, CryptoHash, HASH_SIZE};

/// Structural decoding failures; every variant carries the byte offset and the field being decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes remain than the field requires
    #[error("Buffer underrun decoding {field} at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun {
        field: &'static str,
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// Decoding completed before the end of the buffer
    #[error("Trailing bytes after proof: {trailing} unread bytes at offset {offset}")]
    TrailingBytes { offset: usize, trailing: usize },
    /// Boolean byte other than 0 or 1
    #[error("Invalid boolean {value} decoding {field} at offset {offset}")]
    InvalidBool {
        field: &'static str,
        offset: usize,
        value: u8,
    },
    /// Unknown enum discriminant
    #[error("Invalid discriminant {tag} decoding {field} at offset {offset}")]
    InvalidDiscriminant {
        field: &'static str,
        offset: usize,
        tag: u8,
    },
}

impl DecodeError {
    /// Byte offset at which decoding failed
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::BufferUnderrun { offset, .. }
            | DecodeError::TrailingBytes { offset, .. }
            | DecodeError::InvalidBool { offset, .. }
            | DecodeError::InvalidDiscriminant { offset, .. } => *offset,
        }
    }
}

/// Read-only cursor over an immutable byte buffer
#[derive(Debug, Clone)]
pub struct BorshReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BorshReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Return the next `n` bytes and advance the cursor.
    pub fn fetch(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        self.ensure(n, field)?;
        let chunk = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(chunk)
    }

    /// Hash of the next `n` bytes, without advancing the cursor.
    pub fn peek_digest(&self, n: usize, field: &'static str) -> Result<CryptoHash, DecodeError> {
        self.ensure(n, field)?;
        Ok(sha256(&self.data[self.position..self.position + n]))
    }

    /// Raw bytes consumed since `start`, a position previously returned by [`Self::position`].
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.data[start.min(self.position)..self.position]
    }

    /// Check that the whole buffer has been consumed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            trailing => Err(DecodeError::TrailingBytes {
                offset: self.position,
                trailing,
            }),
        }
    }

    fn ensure(&self, n: usize, field: &'static str) -> Result<(), DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::BufferUnderrun {
                field,
                offset: self.position,
                needed: n,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.fetch(1, field)?[0])
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.fetch(4, field)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        let mut word = [0u8; 8];
        word.copy_from_slice(self.fetch(8, field)?);
        Ok(u64::from_le_bytes(word))
    }

    /// Two `u64` halves, the first one being the high half.
    pub fn read_u128(&mut self, field: &'static str) -> Result<u128, DecodeError> {
        let first = self.read_u64(field)? as u128;
        let second = self.read_u64(field)? as u128;
        Ok((first << 64) | second)
    }

    pub fn read_bool(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        let offset = self.position;
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidBool {
                field,
                offset,
                value,
            }),
        }
    }

    pub fn read_hash(&mut self, field: &'static str) -> Result<CryptoHash, DecodeError> {
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(self.fetch(HASH_SIZE, field)?);
        Ok(CryptoHash(hash))
    }

    /// Length-prefixed byte blob
    pub fn read_bytes(&mut self, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u32(field)? as usize;
        Ok(self.fetch(len, field)?.to_vec())
    }

    /// Count-prefixed list; elements are decoded in order by `decode_item`.
    pub fn read_list<T, F>(&mut self, field: &'static str, mut decode_item: F) -> Result<Vec<T>, DecodeError>
    where
        F: FnMut(&mut Self) -> Result<T, DecodeError>,
    {
        let count = self.read_u32(field)? as usize;
        // Every element occupies at least one byte, so a larger count cannot be satisfied.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(decode_item(self)?);
        }
        Ok(items)
    }
}

/// Append-only Borsh encoder mirroring [`BorshReader`]
#[derive(Debug, Default, Clone)]
pub struct BorshWriter {
    buffer: Vec<u8>,
}

impl BorshWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_raw(&value.to_le_bytes());
    }

    pub fn write_u128(&mut self, value: u128) {
        self.write_u64((value >> 64) as u64);
        self.write_u64(value as u64);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_hash(&mut self, hash: &CryptoHash) {
        self.write_raw(&hash.0);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_raw(bytes);
    }

    pub fn write_list<T, F>(&mut self, items: &[T], mut encode_item: F)
    where
        F: FnMut(&mut Self, &T),
    {
        self.write_u32(items.len() as u32);
        for item in items {
            encode_item(self, item);
        }
    }
}
