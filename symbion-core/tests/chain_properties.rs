//! Property tests for the cipher chain and the wire formats around it

mod common;

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use symbion_core::{
    chain::{ciphertext_len, padded_len},
    constants::buffers::MAX_PLAINTEXT_LEN,
    framing::chunk,
    ChainCoder, FixedIv, Key, RngIvSource, TelemetryError,
};

fn coder(seed: u64) -> ChainCoder<RngIvSource<StdRng>> {
    ChainCoder::new(RngIvSource::new(StdRng::seed_from_u64(seed)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_round_trip_any_key_any_payload(
        key in any::<[u8; 16]>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..=MAX_PLAINTEXT_LEN),
        seed in any::<u64>(),
    ) {
        let key = Key::new(key);
        let mut coder = coder(seed);

        let frame = coder.encrypt(&plaintext, &key).unwrap();
        prop_assert_eq!(frame.len(), ciphertext_len(plaintext.len()));
        prop_assert!(padded_len(plaintext.len()) > plaintext.len());
        prop_assert_eq!(frame.len() % 16, 0);

        let recovered = coder.decrypt_strict(&frame, &key).unwrap();
        prop_assert_eq!(recovered.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn prop_aligned_payloads_gain_a_full_block(
        blocks in 1usize..=14,
        fill in any::<u8>(),
    ) {
        let plaintext = vec![fill; blocks * 16];
        let frame = coder(1).encrypt(&plaintext, &Key::zero()).unwrap();
        prop_assert_eq!(frame.len(), 16 + plaintext.len() + 16);
    }

    #[test]
    fn prop_ciphertext_is_not_the_plaintext(
        plaintext in prop::collection::vec(any::<u8>(), 16..=64),
    ) {
        let frame = coder(2).encrypt(&plaintext, &common::bench_key()).unwrap();
        prop_assert_ne!(&frame[16..16 + plaintext.len()], plaintext.as_slice());
    }

    #[test]
    fn prop_same_input_different_frames(
        plaintext in prop::collection::vec(any::<u8>(), 1..100),
        seed in any::<u64>(),
    ) {
        let mut coder = coder(seed);
        let a = coder.encrypt(&plaintext, &common::bench_key()).unwrap();
        let b = coder.encrypt(&plaintext, &common::bench_key()).unwrap();
        prop_assert_ne!(a, b);
    }

    #[test]
    fn prop_decrypt_rejects_or_returns_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let coder = ChainCoder::new(FixedIv::zero());
        match coder.decrypt(&data, &Key::zero()) {
            Ok(plain) => {
                prop_assert!(data.len() >= 32 && data.len() <= 256);
                prop_assert!(plain.len() <= data.len() - 16);
            }
            Err(TelemetryError::InvalidInputLength { len }) => {
                prop_assert_eq!(len, data.len());
                prop_assert!(len < 32 || (len - 16) % 16 != 0);
            }
            Err(TelemetryError::BufferOverflowRisk { required, capacity }) => {
                prop_assert_eq!(required, data.len());
                prop_assert_eq!(capacity, 256);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn prop_framed_ciphertext_reassembles(
        plaintext in prop::collection::vec(any::<u8>(), 0..=MAX_PLAINTEXT_LEN),
        mtu in 1usize..=244,
    ) {
        let key = common::bench_key();
        let mut coder = coder(3);
        let frame = coder.encrypt(&plaintext, &key).unwrap();

        let joined: Vec<u8> = chunk(&frame, mtu).unwrap().flatten().copied().collect();
        prop_assert_eq!(joined.as_slice(), frame.as_slice());
        let recovered = common::receive(&joined, &key).unwrap();
        prop_assert_eq!(recovered.as_slice(), plaintext.as_slice());
    }
}

#[test]
fn oversized_payload_is_refused_not_truncated() {
    let mut coder = coder(4);
    let plaintext = vec![0x11u8; MAX_PLAINTEXT_LEN + 1];
    assert_eq!(
        coder.encrypt(&plaintext, &Key::zero()),
        Err(TelemetryError::BufferOverflowRisk { required: 272, capacity: 256 })
    );
}

#[test]
fn hello_symbion_with_bench_key() {
    let key = common::bench_key();
    let plaintext = *b"Hello Symbion!!\0";

    let frame = coder(5).encrypt(&plaintext, &key).unwrap();
    assert_eq!(frame.len(), 48);
    assert_eq!(common::receive(&frame, &key).unwrap().as_slice(), &plaintext);
}
