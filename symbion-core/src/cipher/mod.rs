//! AES-128 Block Cipher
//!
//! ## Overview
//!
//! The radio link is protected with AES-128 implemented from its primitives,
//! so the device needs no crypto coprocessor driver. This module is the
//! block-level core: a key schedule and the single-block forward and inverse
//! transforms. Chaining, padding and IVs live in [`crate::chain`].
//!
//! Everything here is a pure function over fixed-size arrays. There are no
//! error cases: a [`Key`] is 16 bytes and a [`Block`] is 16 bytes by type.
//!
//! ## Key Schedule
//!
//! ```text
//! w[0..4]  = key
//! w[i]     = w[i-4] ^ temp
//! temp     = SubWord(RotWord(w[i-1])) ^ (RCON[i/4], 0, 0, 0)   if i % 4 == 0
//!          = w[i-1]                                             otherwise
//! ```
//!
//! 44 words, laid out column-major: round key `r` is `w[4r..4r+4]`.
//!
//! ## Block Transform
//!
//! ```text
//! AddRoundKey(0)
//! rounds 1..=9: SubBytes → ShiftRows → MixColumns → AddRoundKey(r)
//! round 10:     SubBytes → ShiftRows → AddRoundKey(10)
//! ```
//!
//! Decryption runs the inverse steps with round keys 10 down to 0.
//!
//! ## Side Channels
//!
//! Table lookups are indexed by secret data. That is acceptable for this
//! device's threat model (no co-resident code, no high-resolution timer
//! exposed to an attacker) but the module must not be reused where cache
//! timing is observable.
//!
//! ## Usage Example
//!
//! ```rust
//! use symbion_core::cipher::{expand_key, encrypt_block, decrypt_block, Key};
//!
//! let key = Key::new([0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6,
//!                     0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c]);
//! let schedule = expand_key(&key);
//!
//! let block = *b"sixteen byte msg";
//! let sealed = encrypt_block(&schedule, &block);
//! assert_ne!(sealed, block);
//! assert_eq!(decrypt_block(&schedule, &sealed), block);
//! ```

mod round;
mod tables;

use core::fmt;

use crate::constants::crypto::{BLOCK_SIZE, EXPANDED_KEY_SIZE, KEY_SIZE, RCON, ROUNDS, SCHEDULE_WORDS};
use crate::errors::{TelemetryError, TelemetryResult};

use round::{
    add_round_key, inv_mix_columns, inv_shift_rows, inv_sub_bytes, mix_columns, shift_rows,
    sub_bytes,
};
use tables::SBOX;
use zeroize::Zeroize;

/// The unit the cipher operates on.
pub type Block = [u8; BLOCK_SIZE];

/// 128-bit cipher key
///
/// Never printed: `Debug` is redacted so a key cannot leak through a log
/// line or a panic message. No `PartialEq`; compare [`Key::as_bytes`] in
/// tests. Bytes are zeroed on drop.
#[derive(Clone)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Wrap raw key bytes.
    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// All-zero key. Placeholder until the device is provisioned.
    pub const fn zero() -> Self {
        Self([0; KEY_SIZE])
    }

    /// Build from a slice, as received from a provisioning channel.
    pub fn from_slice(bytes: &[u8]) -> TelemetryResult<Self> {
        let raw: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| TelemetryError::InvalidInputLength { len: bytes.len() })?;
        Ok(Self(raw))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Eleven round keys derived from a [`Key`]
///
/// Immutable once built. `len == 11 * BLOCK_SIZE` by construction.
/// Zeroed on drop.
#[derive(Clone)]
pub struct ExpandedKey {
    round_keys: [Block; ROUNDS + 1],
}

impl ExpandedKey {
    /// Run the key schedule.
    pub fn new(key: &Key) -> Self {
        let mut words = [[0u8; 4]; SCHEDULE_WORDS];
        for (word, chunk) in words.iter_mut().zip(key.0.chunks_exact(4)) {
            word.copy_from_slice(chunk);
        }

        for i in 4..SCHEDULE_WORDS {
            let mut temp = words[i - 1];
            if i % 4 == 0 {
                temp.rotate_left(1);
                for byte in temp.iter_mut() {
                    *byte = SBOX[*byte as usize];
                }
                temp[0] ^= RCON[i / 4];
            }
            for j in 0..4 {
                words[i][j] = words[i - 4][j] ^ temp[j];
            }
        }

        let mut round_keys = [[0u8; BLOCK_SIZE]; ROUNDS + 1];
        for (round, round_key) in round_keys.iter_mut().enumerate() {
            for (col, word) in words[4 * round..4 * round + 4].iter().enumerate() {
                round_key[4 * col..4 * col + 4].copy_from_slice(word);
            }
        }

        Self { round_keys }
    }

    /// Round key `round` (0..=10).
    pub fn round_key(&self, round: usize) -> &Block {
        &self.round_keys[round]
    }

    /// Flattened schedule, round key 0 first.
    pub fn to_bytes(&self) -> [u8; EXPANDED_KEY_SIZE] {
        let mut out = [0u8; EXPANDED_KEY_SIZE];
        for (chunk, round_key) in out.chunks_exact_mut(BLOCK_SIZE).zip(&self.round_keys) {
            chunk.copy_from_slice(round_key);
        }
        out
    }
}

impl Drop for ExpandedKey {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}

impl fmt::Debug for ExpandedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExpandedKey(<redacted>)")
    }
}

/// Expand `key` into its round keys.
pub fn expand_key(key: &Key) -> ExpandedKey {
    ExpandedKey::new(key)
}

/// Encrypt one block.
pub fn encrypt_block(schedule: &ExpandedKey, input: &Block) -> Block {
    let mut state = *input;
    add_round_key(&mut state, schedule.round_key(0));

    for round in 1..ROUNDS {
        sub_bytes(&mut state);
        shift_rows(&mut state);
        mix_columns(&mut state);
        add_round_key(&mut state, schedule.round_key(round));
    }

    sub_bytes(&mut state);
    shift_rows(&mut state);
    add_round_key(&mut state, schedule.round_key(ROUNDS));
    state
}

/// Decrypt one block.
pub fn decrypt_block(schedule: &ExpandedKey, input: &Block) -> Block {
    let mut state = *input;
    add_round_key(&mut state, schedule.round_key(ROUNDS));

    for round in (1..ROUNDS).rev() {
        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, schedule.round_key(round));
        inv_mix_columns(&mut state);
    }

    inv_shift_rows(&mut state);
    inv_sub_bytes(&mut state);
    add_round_key(&mut state, schedule.round_key(0));
    state
}
