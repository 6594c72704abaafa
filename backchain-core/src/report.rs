use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ChainConfig;
use crate::digest::ChainHash;

/// Summary of one `encode_to_dir` run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EncodeReport {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub config: ChainConfig,
    pub file_size: u64,
    pub chunk_count: u64,
    pub bytes_written: u64,
    pub root: ChainHash,
}

/// Outcome of a successful decode: every link from H0 to the terminal
/// chunk matched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub chunks_verified: u64,
    pub payload_bytes: u64,
    pub root: ChainHash,
}
