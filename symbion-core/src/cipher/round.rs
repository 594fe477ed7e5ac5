//! Round primitives
//!
//! The state is the 16-byte block in input order, which FIPS-197 reads as a
//! 4x4 matrix filled column by column: byte `r + 4c` is row `r`, column `c`.

use crate::constants::crypto::REDUCTION_POLY;

use super::tables::{INV_SBOX, SBOX};
use super::Block;

/// Multiply two elements of GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
///
/// Shift-and-add over the bits of `b`; runs a fixed eight iterations.
pub(crate) fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    for _ in 0..8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= REDUCTION_POLY;
        }
        b >>= 1;
    }
    product
}

pub(crate) fn add_round_key(state: &mut Block, round_key: &Block) {
    for (s, k) in state.iter_mut().zip(round_key) {
        *s ^= k;
    }
}

pub(crate) fn sub_bytes(state: &mut Block) {
    for s in state.iter_mut() {
        *s = SBOX[*s as usize];
    }
}

pub(crate) fn inv_sub_bytes(state: &mut Block) {
    for s in state.iter_mut() {
        *s = INV_SBOX[*s as usize];
    }
}

/// Rotate row `r` left by `r` columns.
pub(crate) fn shift_rows(state: &mut Block) {
    let src = *state;
    for row in 1..4 {
        for col in 0..4 {
            state[row + 4 * col] = src[row + 4 * ((col + row) % 4)];
        }
    }
}

/// Rotate row `r` right by `r` columns.
pub(crate) fn inv_shift_rows(state: &mut Block) {
    let src = *state;
    for row in 1..4 {
        for col in 0..4 {
            state[row + 4 * ((col + row) % 4)] = src[row + 4 * col];
        }
    }
}

/// Multiply every column by the circulant matrix (2 3 1 1).
pub(crate) fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [s0, s1, s2, s3] = [column[0], column[1], column[2], column[3]];
        column[0] = gmul(s0, 2) ^ gmul(s1, 3) ^ s2 ^ s3;
        column[1] = s0 ^ gmul(s1, 2) ^ gmul(s2, 3) ^ s3;
        column[2] = s0 ^ s1 ^ gmul(s2, 2) ^ gmul(s3, 3);
        column[3] = gmul(s0, 3) ^ s1 ^ s2 ^ gmul(s3, 2);
    }
}

/// Multiply every column by the inverse matrix (14 11 13 9).
pub(crate) fn inv_mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [s0, s1, s2, s3] = [column[0], column[1], column[2], column[3]];
        column[0] = gmul(s0, 14) ^ gmul(s1, 11) ^ gmul(s2, 13) ^ gmul(s3, 9);
        column[1] = gmul(s0, 9) ^ gmul(s1, 14) ^ gmul(s2, 11) ^ gmul(s3, 13);
        column[2] = gmul(s0, 13) ^ gmul(s1, 9) ^ gmul(s2, 14) ^ gmul(s3, 11);
        column[3] = gmul(s0, 11) ^ gmul(s1, 13) ^ gmul(s2, 9) ^ gmul(s3, 14);
    }
}
