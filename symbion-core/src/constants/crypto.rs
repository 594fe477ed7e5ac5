//! Cipher Constants
//!
//! AES-128 as fixed by FIPS-197. Only the 128-bit key size is supported, so
//! the round count and schedule length are constants rather than parameters.

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Key size in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// Initialization vector size in bytes. Always one block.
pub const IV_SIZE: usize = BLOCK_SIZE;

/// Number of transform rounds for a 128-bit key.
pub const ROUNDS: usize = 10;

/// Number of 32-bit words produced by the key schedule (4 per round key).
pub const SCHEDULE_WORDS: usize = 4 * (ROUNDS + 1);

/// Expanded key size in bytes: 11 round keys of one block each.
pub const EXPANDED_KEY_SIZE: usize = (ROUNDS + 1) * BLOCK_SIZE;

/// Round constants indexed by `word / 4`.
///
/// Entry 0 is unused by the schedule; each following entry is the previous
/// one doubled in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
pub const RCON: [u8; ROUNDS + 1] = [
    0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36,
];

/// Low byte of the AES reduction polynomial 0x11B.
pub const REDUCTION_POLY: u8 = 0x1b;

const _: () = assert!(EXPANDED_KEY_SIZE == 11 * BLOCK_SIZE);
