use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info};

use crate::chain::{chunk_count, link_backwards, EncodedChain, LinkSink, MemorySink};
use crate::config::{ChainConfig, Method};
use crate::digest::ChainHash;
use crate::error::{io_err, Result};
use crate::report::EncodeReport;
use crate::store::{ChainDir, DirSink};

/// A way of feeding source chunks to the backward linker. Implementations
/// must produce identical links for identical input.
pub trait ChunkStrategy {
    fn build(&self, source: &Path, chunk_size: usize, sink: &mut dyn LinkSink)
        -> Result<ChainHash>;
}

/// Reads the file once, front to back, then links from the tail.
pub struct ForwardBackwards;

/// Seeks to each chunk from the tail, holding one chunk at a time.
pub struct BackwardsSeeking;

impl ChunkStrategy for ForwardBackwards {
    fn build(
        &self,
        source: &Path,
        chunk_size: usize,
        sink: &mut dyn LinkSink,
    ) -> Result<ChainHash> {
        let f = File::open(source).map_err(io_err(source))?;
        let len = f.metadata().map_err(io_err(source))?.len();
        let cap = len.min(chunk_size as u64) as usize;
        let mut reader = BufReader::new(f);
        let mut raw: Vec<Vec<u8>> = Vec::new();
        loop {
            let mut buf = Vec::with_capacity(cap);
            let n = (&mut reader)
                .take(chunk_size as u64)
                .read_to_end(&mut buf)
                .map_err(io_err(source))?;
            if n == 0 {
                break;
            }
            raw.push(buf);
            if n < chunk_size {
                break;
            }
        }
        debug!(chunks = raw.len(), "source read into memory");
        let count = chunk_count(raw.iter().map(|c| c.len() as u64).sum(), chunk_size);
        // Chunks are consumed from the tail, matching the link order.
        link_backwards(chunk_size, count, |_| Ok(raw.pop().unwrap_or_default()), sink)
    }
}

impl ChunkStrategy for BackwardsSeeking {
    fn build(
        &self,
        source: &Path,
        chunk_size: usize,
        sink: &mut dyn LinkSink,
    ) -> Result<ChainHash> {
        let mut f = File::open(source).map_err(io_err(source))?;
        let len = f.metadata().map_err(io_err(source))?.len();
        let count = chunk_count(len, chunk_size);
        link_backwards(
            chunk_size,
            count,
            |index| {
                let offset = index * chunk_size as u64;
                let want = len.saturating_sub(offset).min(chunk_size as u64);
                f.seek(SeekFrom::Start(offset)).map_err(io_err(source))?;
                let mut buf = Vec::with_capacity(want as usize);
                (&mut f).take(want).read_to_end(&mut buf).map_err(io_err(source))?;
                Ok(buf)
            },
            sink,
        )
    }
}

impl Method {
    pub fn strategy(self) -> &'static dyn ChunkStrategy {
        match self {
            Method::ForwardBackwards => &ForwardBackwards,
            Method::BackwardsSeeking => &BackwardsSeeking,
        }
    }
}

pub struct Encoder;

impl Encoder {
    /// Encodes `source` into an in-memory chain.
    pub fn encode(source: &Path, cfg: &ChainConfig) -> Result<EncodedChain> {
        cfg.validate()?;
        let mut sink = MemorySink::default();
        let root = cfg.method.strategy().build(source, cfg.chunk_size, &mut sink)?;
        Ok(sink.into_chain(root))
    }

    /// Encodes `source` straight into `output`, writing each link as it is
    /// built and `h0.bin` last. Links left over from a longer previous chain
    /// in the same directory are removed.
    pub fn encode_to_dir(source: &Path, output: &Path, cfg: &ChainConfig) -> Result<EncodeReport> {
        cfg.validate()?;
        let file_size = std::fs::metadata(source).map_err(io_err(source))?.len();
        let dir = ChainDir::create(output)?;

        let mut sink = DirSink::new(&dir);
        let root = cfg.method.strategy().build(source, cfg.chunk_size, &mut sink)?;
        let chunk_count = sink.links_written;
        let bytes_written = sink.bytes_written;
        dir.remove_links_from(chunk_count)?;
        dir.write_root(&root)?;

        info!(
            source = %source.display(),
            output = %output.display(),
            method = %cfg.method,
            chunks = chunk_count,
            root = %root,
            "encoded chain"
        );
        Ok(EncodeReport {
            source: source.to_path_buf(),
            output_dir: output.to_path_buf(),
            config: *cfg,
            file_size,
            chunk_count,
            bytes_written: bytes_written + root.as_bytes().len() as u64,
            root,
        })
    }
}
