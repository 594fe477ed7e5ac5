//! Time-Related Constants
//!
//! Sampling is paced by a millisecond tick supplied by the caller.

/// Milliseconds per second.
pub const MS_PER_SECOND: u32 = 1000;

/// Default sampling interval (milliseconds). 1 Hz.
pub const DEFAULT_SAMPLING_INTERVAL_MS: u32 = MS_PER_SECOND;

/// Shortest interval a control command may request.
///
/// Below this the radio cannot drain one frame before the next is ready
/// (13 segments at ~7.5 ms connection interval).
pub const MIN_SAMPLING_INTERVAL_MS: u32 = 100;
