//! Second-order Butterworth low-pass
//!
//! Direct-form realization of the fixed coefficient set in
//! [`crate::constants::signal`]:
//!
//! ```text
//! y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]
//! ```
//!
//! DC gain is 1, so a constant input settles on itself. The poles sit at
//! radius ~0.80, giving a settling time of a few dozen samples.

use crate::constants::signal::{
    BUTTERWORTH_A1, BUTTERWORTH_A2, BUTTERWORTH_B0, BUTTERWORTH_B1, BUTTERWORTH_B2,
};

/// Delay line of one filter instance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterState {
    /// Input delayed by one sample
    pub x1: f32,
    /// Input delayed by two samples
    pub x2: f32,
    /// Output delayed by one sample
    pub y1: f32,
    /// Output delayed by two samples
    pub y2: f32,
}

/// Low-pass filter for one channel
#[derive(Debug, Clone, Default)]
pub struct ButterworthFilter {
    state: FilterState,
}

impl ButterworthFilter {
    /// Filter with an all-zero delay line.
    pub const fn new() -> Self {
        Self {
            state: FilterState { x1: 0.0, x2: 0.0, y1: 0.0, y2: 0.0 },
        }
    }

    /// Push one sample and return the filtered output.
    pub fn apply(&mut self, input: f32) -> f32 {
        let s = &mut self.state;
        let output = BUTTERWORTH_B0 * input + BUTTERWORTH_B1 * s.x1 + BUTTERWORTH_B2 * s.x2
            - BUTTERWORTH_A1 * s.y1
            - BUTTERWORTH_A2 * s.y2;

        s.x2 = s.x1;
        s.x1 = input;
        s.y2 = s.y1;
        s.y1 = output;
        output
    }

    /// Current delay line.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Clear the delay line.
    pub fn reset(&mut self) {
        self.state = FilterState::default();
    }
}
