//! On-disk artifact layout: `h0.bin` plus one `b{i}h{i+1}.bin` per link.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::chain::LinkSink;
use crate::digest::{ChainHash, DIGEST_LEN};
use crate::error::{io_err, ChainError, Result};

pub const ROOT_FILE: &str = "h0.bin";

pub fn link_name(index: u64) -> String {
    format!("b{}h{}.bin", index, index + 1)
}

/// Where `backchain encode` writes when no output directory is given: the
/// source path minus its final extension, or `<name>.chain` without one.
pub fn default_output_dir(source: &Path) -> PathBuf {
    if source.extension().is_some() {
        source.with_extension("")
    } else {
        let mut name = source.file_name().unwrap_or(source.as_os_str()).to_os_string();
        name.push(".chain");
        source.with_file_name(name)
    }
}

/// A directory holding one chain's artifacts.
#[derive(Clone, Debug)]
pub struct ChainDir {
    dir: PathBuf,
}

impl ChainDir {
    pub fn open(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(io_err(dir))?;
        Ok(Self::open(dir))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn root_path(&self) -> PathBuf {
        self.dir.join(ROOT_FILE)
    }

    pub fn link_path(&self, index: u64) -> PathBuf {
        self.dir.join(link_name(index))
    }

    pub fn has_link(&self, index: u64) -> bool {
        self.link_path(index).is_file()
    }

    pub fn read_root(&self) -> Result<ChainHash> {
        let path = self.root_path();
        let bytes = fs::read(&path).map_err(io_err(&path))?;
        let bytes: [u8; DIGEST_LEN] =
            bytes.as_slice().try_into().map_err(|_| ChainError::MalformedRoot { len: bytes.len() })?;
        Ok(ChainHash::from(bytes))
    }

    pub fn write_root(&self, root: &ChainHash) -> Result<()> {
        let path = self.root_path();
        fs::write(&path, root.as_bytes()).map_err(io_err(&path))
    }

    /// Reads link `index`, refusing artifacts longer than `max_len` without
    /// buffering them.
    pub fn read_link(&self, index: u64, max_len: usize) -> Result<Vec<u8>> {
        let path = self.link_path(index);
        let f = File::open(&path).map_err(io_err(&path))?;
        let len = f.metadata().map_err(io_err(&path))?.len();
        if len > max_len as u64 {
            return Err(ChainError::ChunkSizeMismatch {
                index,
                expected: max_len,
                actual: usize::try_from(len).unwrap_or(usize::MAX),
            });
        }
        let mut buf = Vec::with_capacity(len as usize);
        f.take(max_len as u64 + 1).read_to_end(&mut buf).map_err(io_err(&path))?;
        if buf.len() > max_len {
            return Err(ChainError::ChunkSizeMismatch { index, expected: max_len, actual: buf.len() });
        }
        Ok(buf)
    }

    pub fn write_link(&self, index: u64, link: &[u8]) -> Result<()> {
        let path = self.link_path(index);
        fs::write(&path, link).map_err(io_err(&path))
    }

    /// Removes consecutive link artifacts starting at `index`, stopping at the
    /// first gap. Returns how many were removed.
    pub fn remove_links_from(&self, index: u64) -> Result<u64> {
        let mut removed = 0u64;
        let mut i = index;
        while self.has_link(i) {
            let path = self.link_path(i);
            fs::remove_file(&path).map_err(io_err(&path))?;
            warn!(path = %path.display(), "removed stale link artifact");
            removed += 1;
            i += 1;
        }
        Ok(removed)
    }
}

/// Writes each link to disk as soon as the encoder produces it.
pub struct DirSink<'a> {
    dir: &'a ChainDir,
    pub links_written: u64,
    pub bytes_written: u64,
}

impl<'a> DirSink<'a> {
    pub fn new(dir: &'a ChainDir) -> Self {
        Self { dir, links_written: 0, bytes_written: 0 }
    }
}

impl LinkSink for DirSink<'_> {
    fn accept(&mut self, index: u64, link: Vec<u8>) -> Result<()> {
        self.dir.write_link(index, &link)?;
        debug!(file = %link_name(index), len = link.len(), "wrote link");
        self.links_written += 1;
        self.bytes_written += link.len() as u64;
        Ok(())
    }
}
