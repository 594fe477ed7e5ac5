//! Signal Processing Constants
//!
//! Coefficients for the fixed 2nd-order Butterworth low-pass and default
//! Kalman tuning for the analyte channels.

// ===== BUTTERWORTH LOW-PASS =====

/// Feed-forward coefficient for the current input.
///
/// The coefficient set describes a 2nd-order low-pass with its cutoff at
/// roughly 0.05x the sample rate. DC gain is exactly 1:
/// (b0 + b1 + b2) / (1 + a1 + a2) = 0.0804 / 0.0804.
pub const BUTTERWORTH_B0: f32 = 0.0201;

/// Feed-forward coefficient for the input delayed by one sample.
pub const BUTTERWORTH_B1: f32 = 0.0402;

/// Feed-forward coefficient for the input delayed by two samples.
pub const BUTTERWORTH_B2: f32 = 0.0201;

/// Feedback coefficient for the output delayed by one sample.
pub const BUTTERWORTH_A1: f32 = -1.5610;

/// Feedback coefficient for the output delayed by two samples.
pub const BUTTERWORTH_A2: f32 = 0.6414;

// ===== KALMAN DEFAULTS =====

/// Starting error covariance for every scalar Kalman channel.
pub const DEFAULT_INITIAL_COVARIANCE: f32 = 1.0;

/// Process noise shared by the analyte channels.
pub const ANALYTE_PROCESS_NOISE: f32 = 0.1;

/// Serotonin channel: initial estimate (nM) and measurement noise.
pub const SEROTONIN_INITIAL_NM: f32 = 100.0;
/// Serotonin measurement noise.
pub const SEROTONIN_MEASUREMENT_NOISE: f32 = 10.0;

/// Dopamine channel: initial estimate (nM).
pub const DOPAMINE_INITIAL_NM: f32 = 200.0;
/// Dopamine measurement noise.
pub const DOPAMINE_MEASUREMENT_NOISE: f32 = 15.0;

/// GABA channel: initial estimate (nM).
pub const GABA_INITIAL_NM: f32 = 500.0;
/// GABA measurement noise.
pub const GABA_MEASUREMENT_NOISE: f32 = 20.0;

// ===== DELTA ENCODING =====

/// Fixed-point scale for delta-encoded channels: one count = 0.1 unit.
pub const DELTA_SCALE: f32 = 10.0;
