//! Constants for the Symbion telemetry core
//!
//! Every numeric value the pipeline depends on lives here, with its unit and
//! where it comes from. Wire-visible constants (block size, padding, MTU,
//! delta scale) must not change without a matching change on the receiver.
//!
//! ## Organization
//!
//! - **Crypto**: AES-128 geometry and round constants
//! - **Signal**: filter coefficients and default channel tuning
//! - **Buffers**: working-buffer capacities and transport limits
//! - **Time**: sampling intervals

/// AES-128 geometry, round constants and wire sizes.
pub mod crypto;

/// Filter coefficients and per-channel defaults.
pub mod signal;

/// Buffer sizes and transport limits for the radio link.
pub mod buffers;

/// Sampling intervals and time conversions.
pub mod time;

pub use crypto::{BLOCK_SIZE, KEY_SIZE, IV_SIZE, ROUNDS, EXPANDED_KEY_SIZE};

pub use buffers::{
    MAX_FRAME_CAPACITY, DEFAULT_MTU, MAX_BATCH_READINGS,
    DEFAULT_BATCH_SIZE, MAX_COMMAND_LEN, READING_WIRE_SIZE,
};

pub use signal::{DELTA_SCALE, DEFAULT_INITIAL_COVARIANCE};

pub use time::DEFAULT_SAMPLING_INTERVAL_MS;
