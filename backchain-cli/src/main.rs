use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use backchain_core::config::{ChainConfig, Method, DEFAULT_CHUNK_SIZE};
use backchain_core::encode::Encoder;
use backchain_core::{decode, store};

// Mirrors `Method` so clap stays out of backchain-core.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    ForwardBackwards,
    BackwardsSeeking,
}

impl From<MethodArg> for Method {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::ForwardBackwards => Method::ForwardBackwards,
            MethodArg::BackwardsSeeking => Method::BackwardsSeeking,
        }
    }
}

#[derive(Parser)]
#[command(name = "backchain", version, about = "Split files into backward SHA-256 hash chains")]
struct Cli {
    /// Verbose diagnostics on stderr
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Chunk a file and write its hash chain
    Encode {
        filepath: PathBuf,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
        chunk_size: u64,
        #[arg(long, value_enum, default_value_t = MethodArg::ForwardBackwards)]
        method: MethodArg,
        /// Artifact directory (default: source path without its extension)
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Verify a chain directory from h0.bin to its terminal chunk
    Decode {
        filepath: PathBuf,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
        chunk_size: u64,
        /// Also write the verified payload back out to this file
        #[arg(long)]
        restore: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.logs);
    match cli.cmd {
        Cmd::Encode { filepath, chunk_size, method, output, json } => {
            encode(&filepath, chunk_size, method, output, json)?
        }
        Cmd::Decode { filepath, chunk_size, restore, json } => {
            decode(&filepath, chunk_size, restore.as_deref(), json)?
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("BACKCHAIN_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn to_chunk_size(v: u64) -> Result<usize> {
    usize::try_from(v).with_context(|| format!("chunk size {} does not fit this platform", v))
}

fn encode(
    source: &Path,
    chunk_size: u64,
    method: MethodArg,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let cfg = ChainConfig::new(to_chunk_size(chunk_size)?, method.into());
    let out_dir = output.unwrap_or_else(|| store::default_output_dir(source));
    let report = Encoder::encode_to_dir(source, &out_dir, &cfg)
        .with_context(|| format!("encode {}", source.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Successfully chunked and hashed file.");
        info!(
            chunks = report.chunk_count,
            output = %report.output_dir.display(),
            method = %report.config.method,
            root = %report.root,
            "wrote chain"
        );
    }
    Ok(())
}

fn decode(dir: &Path, chunk_size: u64, restore: Option<&Path>, json: bool) -> Result<()> {
    let chunk_size = to_chunk_size(chunk_size)?;
    let report = match restore {
        Some(dest) => decode::restore(dir, chunk_size, dest)
            .with_context(|| format!("restore {} into {}", dir.display(), dest.display()))?,
        None => decode::decode(dir, chunk_size)
            .with_context(|| format!("verify chain in {}", dir.display()))?,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "OK: {} chunk(s), {} byte(s) verified against root {}",
            report.chunks_verified, report.payload_bytes, report.root
        );
        if let Some(dest) = restore {
            info!(dest = %dest.display(), "restored source");
        }
    }
    Ok(())
}
