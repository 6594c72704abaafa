use backchain_core::chain::EncodedChain;
use backchain_core::config::{ChainConfig, Method};
use backchain_core::digest::{ChainHash, DIGEST_LEN};
use backchain_core::encode::Encoder;
use backchain_core::ChainError;
use std::fs;
use std::path::Path;

fn encode_both(src: &Path, chunk_size: usize) -> (EncodedChain, EncodedChain) {
    let fwd = Encoder::encode(src, &ChainConfig::new(chunk_size, Method::ForwardBackwards)).unwrap();
    let seek = Encoder::encode(src, &ChainConfig::new(chunk_size, Method::BackwardsSeeking)).unwrap();
    (fwd, seek)
}

fn assert_chain_shape(chain: &EncodedChain, chunk_size: usize, data: &[u8]) {
    let n = chain.links.len();
    assert_eq!(n, data.len().div_ceil(chunk_size).max(1));
    assert_eq!(chain.root, ChainHash::of(&chain.links[0]));
    for i in 0..n - 1 {
        assert_eq!(chain.links[i].len(), chunk_size + DIGEST_LEN);
        assert_eq!(ChainHash::trailing(&chain.links[i]), Some(ChainHash::of(&chain.links[i + 1])));
    }
    assert!(chain.links[n - 1].len() <= chunk_size);
    assert_eq!(chain.reassemble(), data);
}

#[test]
fn exact_multiple_has_full_terminal_chunk() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("exact.bin");
    let data: Vec<u8> = (0..4096 * 4).map(|i| (i as u8).wrapping_mul(31).wrapping_add(7)).collect();
    fs::write(&src, &data).unwrap();

    let (fwd, seek) = encode_both(&src, 4096);
    assert_eq!(fwd, seek);
    assert_eq!(fwd.chunk_count(), 4);
    assert_eq!(fwd.links[3].len(), 4096);
    assert_chain_shape(&fwd, 4096, &data);
}

#[test]
fn remainder_gives_short_terminal_chunk() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("tail.bin");
    let data: Vec<u8> = (0..4096 + 2048).map(|i| (i % 251) as u8).collect();
    fs::write(&src, &data).unwrap();

    let (fwd, seek) = encode_both(&src, 4096);
    assert_eq!(fwd, seek);
    assert_eq!(fwd.chunk_count(), 2);
    assert_eq!(fwd.links[1].len(), 2048);
    assert_chain_shape(&fwd, 4096, &data);
}

#[test]
fn empty_file_is_one_empty_chunk() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("empty.bin");
    fs::write(&src, b"").unwrap();

    let (fwd, seek) = encode_both(&src, 1024);
    assert_eq!(fwd, seek);
    assert_eq!(fwd.links, vec![Vec::<u8>::new()]);
    assert_eq!(fwd.root, ChainHash::of(b""));
}

#[test]
fn file_smaller_than_chunk_is_only_a_terminal() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("small.bin");
    fs::write(&src, b"tiny").unwrap();

    let chain = Encoder::encode(&src, &ChainConfig::default()).unwrap();
    assert_eq!(chain.links, vec![b"tiny".to_vec()]);
    assert_eq!(chain.root, ChainHash::of(b"tiny"));
}

#[test]
fn zero_chunk_size_is_rejected() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.bin");
    fs::write(&src, b"abc").unwrap();
    let err = Encoder::encode(&src, &ChainConfig::new(0, Method::default())).unwrap_err();
    assert!(matches!(err, ChainError::InvalidChunkSize));
}

#[test]
fn missing_source_is_an_io_error() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("missing.bin");
    for method in [Method::ForwardBackwards, Method::BackwardsSeeking] {
        let err = Encoder::encode(&src, &ChainConfig::new(16, method)).unwrap_err();
        match err {
            ChainError::Io { path, .. } => assert_eq!(path, src),
            other => panic!("unexpected error: {other}"),
        }
    }
}
