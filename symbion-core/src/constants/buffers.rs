//! Buffer Sizes and Transport Limits
//!
//! The device has no heap. Every buffer the pipeline touches has a capacity
//! fixed here, and inputs that would exceed it are rejected up front.

use super::crypto::{BLOCK_SIZE, IV_SIZE};

// ===== WORKING BUFFERS =====

/// Capacity of the encrypt/decrypt working buffer (IV + padded plaintext).
///
/// Matches the radio characteristic size on the nRF52 firmware:
/// - 16 bytes IV + at most 240 bytes of padded plaintext
/// - largest accepted plaintext is therefore 239 bytes
///
/// Source: BLE TX characteristic buffer (256 bytes)
pub const MAX_FRAME_CAPACITY: usize = 256;

/// Largest plaintext that still fits in [`MAX_FRAME_CAPACITY`] after padding.
pub const MAX_PLAINTEXT_LEN: usize = MAX_FRAME_CAPACITY - IV_SIZE - 1;

/// Smallest configurable frame budget: IV plus one block.
pub const MIN_FRAME_LEN: usize = IV_SIZE + BLOCK_SIZE;

// ===== READINGS =====

/// Serialized size of one reading: six `f32` channels + `u32` timestamp.
pub const READING_WIRE_SIZE: usize = 28;

/// Bytes added per reading after the delta baseline (two `i16`).
pub const DELTA_RECORD_SIZE: usize = 4;

/// Upper bound on readings held in one batch.
///
/// 28 + 31 * 4 = 152 bytes encoded, which pads to 160 and encrypts
/// to 176 bytes, comfortably inside [`MAX_FRAME_CAPACITY`].
pub const MAX_BATCH_READINGS: usize = 32;

/// Default readings per delta-encoded batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

// ===== TRANSPORT =====

/// Default segment size for BLE notifications (ATT MTU 23 minus 3 header bytes).
pub const DEFAULT_MTU: usize = 20;

/// Largest control-command payload accepted from the radio.
pub const MAX_COMMAND_LEN: usize = 8;

const _: () = assert!(READING_WIRE_SIZE + (MAX_BATCH_READINGS - 1) * DELTA_RECORD_SIZE <= MAX_PLAINTEXT_LEN);
