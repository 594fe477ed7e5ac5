//! Secure telemetry core for Symbion sensing devices
//!
//! Takes raw electrochemical readings, smooths them, compresses batches,
//! encrypts with AES-128-CBC and slices the result for a BLE link.
//! Designed for the nRF52 class of device.
//!
//! Key constraints:
//! - No heap allocation: every buffer is fixed capacity
//! - No I/O: sensors and radio are injected through [`traits`]
//! - Single-threaded, one reading processed to completion at a time
//!
//! ```rust
//! use symbion_core::{ChainCoder, Key, RngIvSource};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut coder = ChainCoder::new(RngIvSource::new(StdRng::seed_from_u64(1)));
//! let key = Key::new([0x2b; 16]);
//!
//! let frame = coder.encrypt(b"Hello Symbion!!\0", &key)?;
//! assert_eq!(frame.len(), 48);
//! assert_eq!(coder.decrypt(&frame, &key)?.as_slice(), b"Hello Symbion!!\0");
//! # Ok::<(), symbion_core::TelemetryError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod chain;
pub mod cipher;
pub mod command;
pub mod constants;
pub mod delta;
pub mod errors;
pub mod filters;
pub mod framing;
pub mod pipeline;
pub mod reading;
pub mod traits;

// Public API
pub use chain::{ChainCoder, FixedIv, FrameBuffer, IvSource, RngIvSource};
pub use cipher::{Block, ExpandedKey, Key};
pub use command::ControlCommand;
pub use delta::{DecodedBatch, DeltaEncoder, EncodedBatch};
pub use errors::{TelemetryError, TelemetryResult};
pub use filters::{FilterBank, FilterChain};
pub use framing::FrameChunker;
pub use pipeline::{PipelineConfig, PipelineStats, TelemetryPipeline, TransmitMode};
pub use reading::{Channel, Reading, Timestamp};
pub use traits::{SensorSource, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
