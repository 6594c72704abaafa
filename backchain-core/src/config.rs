use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::interior_len;
use crate::error::Result;

pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// How the encoder walks the source file.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Read the whole file front to back, then link from the tail.
    #[default]
    ForwardBackwards,
    /// Seek to each chunk from the tail; one chunk in memory at a time.
    BackwardsSeeking,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::ForwardBackwards => "forward-backwards",
            Method::BackwardsSeeking => "backwards-seeking",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub chunk_size: usize,
    pub method: Method,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, method: Method::default() }
    }
}

impl ChainConfig {
    pub fn new(chunk_size: usize, method: Method) -> Self {
        Self { chunk_size, method }
    }

    pub fn validate(&self) -> Result<()> {
        interior_len(self.chunk_size).map(|_| ())
    }
}
