//! Content digests used as the deduplication key.
//!
//! SHA-256 over the raw bytes. The digest only has to be deterministic:
//! identical bytes must always produce the same key. It is not relied on as a
//! security boundary; a deliberately constructed collision would alias two
//! different contents onto one blob.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

pub const HASH_LEN: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContentHashError {
    #[error("invalid hex digest: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected a {HASH_LEN}-byte digest, got {0} bytes")]
    Length(usize),
}

impl FromStr for ContentHash {
    type Err = ContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let arr: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| ContentHashError::Length(len))?;
        Ok(Self(arr))
    }
}
