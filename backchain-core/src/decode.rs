use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::chain::interior_len;
use crate::digest::ChainHash;
use crate::error::{io_err, ChainError, Result};
use crate::report::VerifyReport;
use crate::store::ChainDir;

/// Verifies the chain stored in `dir`, starting from `h0.bin`. Stops at the
/// first link whose hash does not match the value committed before it.
pub fn decode(dir: &Path, chunk_size: usize) -> Result<VerifyReport> {
    walk(&ChainDir::open(dir), chunk_size, |_, _| Ok(()))
}

/// Verifies the chain and writes the reassembled source to `dest`. Payloads
/// go to a temporary file beside `dest`, which replaces `dest` only once the
/// whole chain verified; `dest` is untouched on failure. `dest` may not lie
/// inside the chain directory.
pub fn restore(dir: &Path, chunk_size: usize, dest: &Path) -> Result<VerifyReport> {
    let chain_dir = fs::canonicalize(dir).map_err(io_err(dir))?;
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dest_parent = fs::canonicalize(parent).map_err(io_err(parent))?;
    if dest_parent.starts_with(&chain_dir) {
        return Err(ChainError::RestoreIntoChain { path: dest.to_path_buf() });
    }

    let mut tmp = NamedTempFile::new_in(&dest_parent).map_err(io_err(&dest_parent))?;
    let result = {
        let mut out = BufWriter::new(tmp.as_file_mut());
        let walked = walk(&ChainDir::open(dir), chunk_size, |_, payload| {
            out.write_all(payload).map_err(io_err(dest))
        });
        walked.and_then(|report| {
            out.flush().map_err(io_err(dest))?;
            Ok(report)
        })
    };
    match result {
        Ok(report) => {
            tmp.persist(dest)
                .map_err(|e| ChainError::Io { path: dest.to_path_buf(), source: e.error })?;
            Ok(report)
        }
        Err(e) => {
            warn!(dest = %dest.display(), error = %e, "restore aborted");
            Err(e)
        }
    }
}

fn walk<F>(chain: &ChainDir, chunk_size: usize, mut on_payload: F) -> Result<VerifyReport>
where
    F: FnMut(u64, &[u8]) -> Result<()>,
{
    let interior_len = interior_len(chunk_size)?;
    let root = chain.read_root()?;
    let mut expected = root;
    let mut payload_bytes = 0u64;
    let mut index = 0u64;

    loop {
        let link = chain.read_link(index, interior_len)?;
        let actual = ChainHash::of(&link);
        debug!(index, len = link.len(), %expected, %actual, "checking link");
        if actual != expected {
            return Err(ChainError::InvalidHashDetected { index, expected, actual });
        }

        if link.len() == interior_len {
            let (payload, _) = link.split_at(chunk_size);
            on_payload(index, payload)?;
            payload_bytes += payload.len() as u64;
            if !chain.has_link(index + 1) {
                return Err(ChainError::ChainTruncated { index });
            }
            expected = ChainHash::trailing(&link).ok_or(ChainError::ChunkSizeMismatch {
                index,
                expected: interior_len,
                actual: link.len(),
            })?;
            index += 1;
        } else if link.len() <= chunk_size && (index == 0 || !link.is_empty()) {
            on_payload(index, &link)?;
            payload_bytes += link.len() as u64;
            if chain.has_link(index + 1) {
                // A link that still commits to the next artifact is an interior
                // link read with too large a chunk size.
                let commits_to_next = chain
                    .read_link(index + 1, interior_len)
                    .ok()
                    .is_some_and(|next| ChainHash::trailing(&link) == Some(ChainHash::of(&next)));
                return Err(if commits_to_next {
                    ChainError::ChunkSizeMismatch {
                        index,
                        expected: interior_len,
                        actual: link.len(),
                    }
                } else {
                    ChainError::UnexpectedSuccessor { index: index + 1 }
                });
            }
            let report = VerifyReport { chunks_verified: index + 1, payload_bytes, root };
            info!(
                dir = %chain.path().display(),
                chunks = report.chunks_verified,
                bytes = report.payload_bytes,
                "chain verified"
            );
            return Ok(report);
        } else {
            return Err(ChainError::ChunkSizeMismatch {
                index,
                expected: interior_len,
                actual: link.len(),
            });
        }
    }
}
