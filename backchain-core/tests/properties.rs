use backchain_core::config::{ChainConfig, Method};
use backchain_core::decode::decode;
use backchain_core::encode::Encoder;
use backchain_core::store::link_name;
use backchain_core::ChainError;
use proptest::prelude::*;
use std::fs;

fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn strategies_are_byte_identical(data in payload(), chunk_size in 1usize..300) {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("src.bin");
        fs::write(&src, &data).unwrap();

        let fwd = Encoder::encode(&src, &ChainConfig::new(chunk_size, Method::ForwardBackwards)).unwrap();
        let seek = Encoder::encode(&src, &ChainConfig::new(chunk_size, Method::BackwardsSeeking)).unwrap();
        prop_assert_eq!(&fwd, &seek);
        prop_assert_eq!(fwd.reassemble(), data);
    }

    #[test]
    fn round_trip_verifies(data in payload(), chunk_size in 1usize..300, seeking in any::<bool>()) {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("src.bin");
        fs::write(&src, &data).unwrap();
        let method = if seeking { Method::BackwardsSeeking } else { Method::ForwardBackwards };
        let out = td.path().join("chain");

        let enc = Encoder::encode_to_dir(&src, &out, &ChainConfig::new(chunk_size, method)).unwrap();
        let report = decode(&out, chunk_size).unwrap();
        prop_assert_eq!(report.chunks_verified, enc.chunk_count);
        prop_assert_eq!(report.payload_bytes, data.len() as u64);
        prop_assert_eq!(report.root, enc.root);
    }

    #[test]
    fn any_bit_flip_is_rejected_at_its_link(
        data in prop::collection::vec(any::<u8>(), 1..2048),
        chunk_size in 1usize..300,
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("src.bin");
        fs::write(&src, &data).unwrap();
        let out = td.path().join("chain");
        let enc = Encoder::encode_to_dir(&src, &out, &ChainConfig::new(chunk_size, Method::default())).unwrap();

        // Pick a link, then a byte inside it
        let link_idx = pick.index(enc.chunk_count as usize) as u64;
        let path = out.join(link_name(link_idx));
        let mut bytes = fs::read(&path).unwrap();
        let at = pick.index(bytes.len());
        bytes[at] ^= 1 << bit;
        fs::write(&path, &bytes).unwrap();

        match decode(&out, chunk_size) {
            Err(ChainError::InvalidHashDetected { index, .. }) => prop_assert_eq!(index, link_idx),
            other => prop_assert!(false, "expected rejection at {}, got {:?}", link_idx, other),
        }
    }
}
