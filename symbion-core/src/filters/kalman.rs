//! Scalar Kalman smoother
//!
//! ## Model
//!
//! The channel is modelled as a constant observed through noise, so the
//! filter reduces to one state and one covariance:
//!
//! ```text
//! predict:  p = p + q
//! gain:     k = p / (p + r)
//! update:   x = x + k·(z - x)
//!           p = (1 - k)·p
//! ```
//!
//! `q` (process noise) and `r` (measurement noise) are fixed per channel at
//! construction. A small `r` relative to `q` tracks quickly but passes more
//! noise; a large `r` smooths harder and lags.
//!
//! ## Usage Example
//!
//! ```rust
//! use symbion_core::filters::{KalmanConfig, KalmanFilter};
//!
//! let config = KalmanConfig::default()
//!     .with_process_noise(0.01)
//!     .with_measurement_noise(0.1);
//! let mut kf = KalmanFilter::new(config);
//!
//! let mut estimate = 0.0;
//! for _ in 0..20 {
//!     estimate = kf.update(150.0);
//! }
//! assert!((estimate - 150.0).abs() < 10.0);
//! ```

use crate::constants::signal::DEFAULT_INITIAL_COVARIANCE;

/// Kalman filter configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KalmanConfig {
    /// Initial state estimate
    pub initial_estimate: f32,
    /// Initial error covariance
    pub initial_covariance: f32,
    /// Process noise (q)
    pub process_noise: f32,
    /// Measurement noise (r)
    pub measurement_noise: f32,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            initial_estimate: 0.0,
            initial_covariance: DEFAULT_INITIAL_COVARIANCE,
            process_noise: 0.01,
            measurement_noise: 0.1,
        }
    }
}

impl KalmanConfig {
    /// Set starting estimate
    pub fn with_initial_estimate(mut self, estimate: f32) -> Self {
        self.initial_estimate = estimate;
        self
    }

    /// Set process noise (higher = less trust in the constant model)
    pub fn with_process_noise(mut self, q: f32) -> Self {
        self.process_noise = q;
        self
    }

    /// Set measurement noise (higher = less trust in each sample)
    pub fn with_measurement_noise(mut self, r: f32) -> Self {
        self.measurement_noise = r;
        self
    }

    /// Noise terms must be non-negative and the gain denominator non-zero.
    ///
    /// `p` can collapse to 0 after one update, leaving `q + r` as the
    /// denominator, so that sum must be positive on its own.
    pub fn is_valid(&self) -> bool {
        self.process_noise >= 0.0
            && self.measurement_noise >= 0.0
            && self.initial_covariance >= 0.0
            && self.process_noise + self.measurement_noise > 0.0
            && self.initial_estimate.is_finite()
    }
}

/// Estimate, covariance and fixed noise terms of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    /// Current estimate
    pub x: f32,
    /// Estimation error covariance
    pub p: f32,
    /// Process noise
    pub q: f32,
    /// Measurement noise
    pub r: f32,
}

/// Scalar Kalman filter for one channel
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    state: KalmanState,
    config: KalmanConfig,
}

impl KalmanFilter {
    /// Create filter from configuration
    pub fn new(config: KalmanConfig) -> Self {
        Self {
            state: KalmanState {
                x: config.initial_estimate,
                p: config.initial_covariance,
                q: config.process_noise,
                r: config.measurement_noise,
            },
            config,
        }
    }

    /// Fold in one measurement and return the new estimate.
    pub fn update(&mut self, measurement: f32) -> f32 {
        let s = &mut self.state;
        s.p += s.q;
        let k = s.p / (s.p + s.r);
        s.x += k * (measurement - s.x);
        s.p *= 1.0 - k;
        s.x
    }

    /// Current estimate without updating.
    pub fn estimate(&self) -> f32 {
        self.state.x
    }

    /// Full filter state.
    pub fn state(&self) -> &KalmanState {
        &self.state
    }

    /// Return to the configured initial state.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}
