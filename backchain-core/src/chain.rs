//! Backward link construction shared by every encoding strategy.
//!
//! Link `i` is `payload[i] || SHA256(link[i+1])`. The terminal link is the
//! raw tail payload with no trailing digest, so interior links are always
//! `chunk_size + 32` bytes and the terminal one is at most `chunk_size`.

use tracing::debug;

use crate::digest::{ChainHash, DIGEST_LEN};
use crate::error::{ChainError, Result};

/// Receives finished links. Links arrive in descending index order.
pub trait LinkSink {
    fn accept(&mut self, index: u64, link: Vec<u8>) -> Result<()>;
}

/// Length of every interior link for `chunk_size`.
pub fn interior_len(chunk_size: usize) -> Result<usize> {
    if chunk_size == 0 {
        return Err(ChainError::InvalidChunkSize);
    }
    chunk_size.checked_add(DIGEST_LEN).ok_or(ChainError::InvalidChunkSize)
}

/// Number of chunks a source of `len` bytes splits into. Never zero: an empty
/// source still yields one empty terminal chunk.
pub fn chunk_count(len: u64, chunk_size: usize) -> u64 {
    len.div_ceil(chunk_size as u64).max(1)
}

/// Builds links `count-1` down to `0`, pulling each payload from `read_chunk`
/// and handing each link to `sink` as soon as it is complete. Returns H0.
pub fn link_backwards<F>(
    chunk_size: usize,
    count: u64,
    mut read_chunk: F,
    sink: &mut dyn LinkSink,
) -> Result<ChainHash>
where
    F: FnMut(u64) -> Result<Vec<u8>>,
{
    let interior_len = interior_len(chunk_size)?;
    let last = count.max(1) - 1;

    let terminal = read_chunk(last)?;
    if terminal.len() > chunk_size || (terminal.is_empty() && last > 0) {
        return Err(ChainError::ChunkSizeMismatch {
            index: last,
            expected: chunk_size,
            actual: terminal.len(),
        });
    }
    let mut successor = ChainHash::of(&terminal);
    debug!(index = last, len = terminal.len(), hash = %successor, "terminal link");
    sink.accept(last, terminal)?;

    for index in (0..last).rev() {
        let mut link = read_chunk(index)?;
        link.extend_from_slice(successor.as_bytes());
        if link.len() != interior_len {
            return Err(ChainError::ChunkSizeMismatch {
                index,
                expected: interior_len,
                actual: link.len(),
            });
        }
        successor = ChainHash::of(&link);
        debug!(index, len = link.len(), hash = %successor, "linked chunk");
        sink.accept(index, link)?;
    }
    Ok(successor)
}

/// An encoded chain held in memory, links in index order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedChain {
    pub root: ChainHash,
    pub links: Vec<Vec<u8>>,
}

impl EncodedChain {
    pub fn chunk_count(&self) -> u64 {
        self.links.len() as u64
    }

    /// Payload of link `index` with any trailing digest stripped.
    pub fn payload(&self, index: usize) -> Option<&[u8]> {
        let link = self.links.get(index)?;
        if index + 1 == self.links.len() {
            Some(link)
        } else {
            link.get(..link.len().checked_sub(DIGEST_LEN)?)
        }
    }

    /// Concatenated payloads; equals the encoded source.
    pub fn reassemble(&self) -> Vec<u8> {
        (0..self.links.len()).filter_map(|i| self.payload(i)).flatten().copied().collect()
    }
}

/// Collects links in memory.
#[derive(Default)]
pub struct MemorySink {
    descending: Vec<Vec<u8>>,
}

impl MemorySink {
    pub fn into_chain(self, root: ChainHash) -> EncodedChain {
        let mut links = self.descending;
        links.reverse();
        EncodedChain { root, links }
    }
}

impl LinkSink for MemorySink {
    fn accept(&mut self, _index: u64, link: Vec<u8>) -> Result<()> {
        self.descending.push(link);
        Ok(())
    }
}
