use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::digest::ChainHash;

/// Every failure the encoder or decoder can report.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk size must be non-zero and leave room for a 32-byte digest")]
    InvalidChunkSize,

    #[error("chunk {index}: link is {actual} bytes, expected {expected}")]
    ChunkSizeMismatch { index: u64, expected: usize, actual: usize },

    #[error("invalid hash detected at chunk {index}: expected {expected}, got {actual}")]
    InvalidHashDetected { index: u64, expected: ChainHash, actual: ChainHash },

    #[error("root hash file must hold exactly 32 bytes, found {len}")]
    MalformedRoot { len: usize },

    #[error("chain truncated: successor of chunk {index} is missing")]
    ChainTruncated { index: u64 },

    #[error("chunk {index} found after the terminal chunk")]
    UnexpectedSuccessor { index: u64 },

    #[error("refusing to restore into the chain directory: {path:?}")]
    RestoreIntoChain { path: PathBuf },
}

impl ChainError {
    /// Index of the link that broke the chain, when the failure is tied to one.
    pub fn failing_index(&self) -> Option<u64> {
        match self {
            ChainError::ChunkSizeMismatch { index, .. }
            | ChainError::InvalidHashDetected { index, .. }
            | ChainError::ChainTruncated { index }
            | ChainError::UnexpectedSuccessor { index } => Some(*index),
            ChainError::MalformedRoot { .. } => Some(0),
            ChainError::Io { .. }
            | ChainError::InvalidChunkSize
            | ChainError::RestoreIntoChain { .. } => None,
        }
    }
}

pub type Result<T, E = ChainError> = std::result::Result<T, E>;

/// Adapter for `map_err` that tags an I/O error with the path it concerns.
pub(crate) fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ChainError + '_ {
    move |source| ChainError::Io { path: path.to_path_buf(), source }
}
