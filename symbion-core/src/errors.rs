//! Error Types for the Telemetry Pipeline
//!
//! ## Design Philosophy
//!
//! The pipeline runs on a battery-powered device with no heap, so errors
//! follow the same rules as the rest of the core:
//!
//! 1. **Small and Copy**: every variant carries a few integers or a
//!    `&'static str`, never an owned string.
//! 2. **Recoverable**: nothing here is fatal. Whether a failure warrants a
//!    device reset is the caller's policy, not the pipeline's.
//! 3. **Checked before touching buffers**: size errors are raised before any
//!    byte is written, so a rejected call leaves no partial output.
//!
//! ## Error Categories
//!
//! ### Input Shape
//! - `InvalidInputLength`: ciphertext too short or not block aligned,
//!   command payload empty or oversized
//! - `BufferOverflowRisk`: padded plaintext + IV exceeds the working buffer
//! - `EmptyBatch`: nothing to delta-encode
//!
//! ### Integrity
//! - `PaddingInvalid`: only raised by the strict decrypt path. The default
//!   decrypt keeps the historical last-byte check and cannot detect
//!   tampering; see [`crate::chain`].
//!
//! ### Transport
//! - `TransportNotReady`: link down before the frame started
//! - `PartialTransmission`: a segment was refused mid-frame; the whole
//!   frame is lost and nothing is resent
//!
//! ### Configuration
//! - `InvalidSegmentSize`, `InvalidConfig`, `UnknownCommand`
//!
//! ## Handling Example
//!
//! ```rust
//! use symbion_core::{ChainCoder, FixedIv, Key, TelemetryError};
//!
//! let coder = ChainCoder::new(FixedIv::zero());
//! match coder.decrypt(&[0u8; 8], &Key::zero()) {
//!     Err(TelemetryError::InvalidInputLength { len }) => assert_eq!(len, 8),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for pipeline operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Pipeline errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// Input shorter than the format requires, or not a whole number of blocks
    #[error("Invalid input length: {len} bytes")]
    InvalidInputLength {
        /// Length of the rejected input
        len: usize,
    },

    /// Padded plaintext plus IV would not fit the working buffer
    #[error("Buffer overflow risk: need {required} bytes, capacity {capacity}")]
    BufferOverflowRisk {
        /// Bytes the operation would have written
        required: usize,
        /// Configured working capacity
        capacity: usize,
    },

    /// Strict padding check failed
    #[error("Invalid padding byte {value:#04x}")]
    PaddingInvalid {
        /// Final plaintext byte that was read as the pad count
        value: u8,
    },

    /// Transport refused a segment; the frame is lost
    #[error("Partial transmission: {sent} of {total} segments sent")]
    PartialTransmission {
        /// Segments accepted before the failure
        sent: usize,
        /// Segments in the frame
        total: usize,
    },

    /// Transport reported not ready before the frame started
    #[error("Transport not ready")]
    TransportNotReady,

    /// Segment size of zero
    #[error("Segment size must be positive")]
    InvalidSegmentSize,

    /// Delta encoding requested for zero readings
    #[error("Batch is empty")]
    EmptyBatch,

    /// Control opcode not in the command table
    #[error("Unknown command {opcode:#04x}")]
    UnknownCommand {
        /// Offending opcode
        opcode: u8,
    },

    /// Configuration value rejected
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: &'static str,
    },
}

impl TelemetryError {
    /// True for failures of the radio link rather than of the data.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportNotReady | Self::PartialTransmission { .. })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TelemetryError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidInputLength { len } =>
                defmt::write!(fmt, "Invalid input length {}", len),
            Self::BufferOverflowRisk { required, capacity } =>
                defmt::write!(fmt, "Need {} bytes, capacity {}", required, capacity),
            Self::PaddingInvalid { value } =>
                defmt::write!(fmt, "Invalid padding {=u8:#x}", value),
            Self::PartialTransmission { sent, total } =>
                defmt::write!(fmt, "Sent {} of {} segments", sent, total),
            Self::TransportNotReady =>
                defmt::write!(fmt, "Transport not ready"),
            Self::InvalidSegmentSize =>
                defmt::write!(fmt, "Invalid segment size"),
            Self::EmptyBatch =>
                defmt::write!(fmt, "Empty batch"),
            Self::UnknownCommand { opcode } =>
                defmt::write!(fmt, "Unknown command {=u8:#x}", opcode),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
        }
    }
}
