use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the digest appended to every interior link.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 digest of one linked chunk. Serializes as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ChainHash([u8; DIGEST_LEN]);

impl ChainHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Reads the digest stored in the last `DIGEST_LEN` bytes of `link`.
    /// Returns `None` when the link is too short to carry one.
    pub fn trailing(link: &[u8]) -> Option<Self> {
        let start = link.len().checked_sub(DIGEST_LEN)?;
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&link[start..]);
        Some(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl From<[u8; DIGEST_LEN]> for ChainHash {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ChainHash> for String {
    fn from(h: ChainHash) -> Self {
        h.to_hex()
    }
}

impl TryFrom<String> for ChainHash {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", self.to_hex())
    }
}
