//! Per-Channel Signal Filtering
//!
//! ## Overview
//!
//! Raw electrochemical readings are noisy. Each filtered channel runs two
//! stages in a fixed order:
//!
//! ```text
//! raw ─► Butterworth low-pass ─► scalar Kalman ─► filtered
//! ```
//!
//! The low-pass removes high-frequency electrode noise; the Kalman stage
//! smooths what is left toward a slowly varying estimate. Stages keep state
//! between samples and never look at other channels.
//!
//! ## Ownership
//!
//! A [`FilterBank`] owns one optional [`FilterChain`] per [`Channel`],
//! indexed by the channel's wire position. Channels without a chain pass
//! through untouched, as does the timestamp.
//!
//! ```rust
//! use symbion_core::filters::{FilterBank, KalmanConfig};
//! use symbion_core::{Channel, Reading};
//!
//! let mut bank = FilterBank::new();
//! bank.configure(Channel::Serotonin, KalmanConfig::default());
//!
//! let raw = Reading { serotonin_nm: 1000.0, ph_level: 6.5, ..Reading::default() };
//! let filtered = bank.apply(&raw);
//! assert_ne!(filtered.serotonin_nm, raw.serotonin_nm);
//! assert_eq!(filtered.ph_level, raw.ph_level);
//! ```

mod butterworth;
mod kalman;

pub use butterworth::{ButterworthFilter, FilterState};
pub use kalman::{KalmanConfig, KalmanFilter, KalmanState};

use crate::constants::signal::{
    ANALYTE_PROCESS_NOISE, DOPAMINE_INITIAL_NM, DOPAMINE_MEASUREMENT_NOISE, GABA_INITIAL_NM,
    GABA_MEASUREMENT_NOISE, SEROTONIN_INITIAL_NM, SEROTONIN_MEASUREMENT_NOISE,
};
use crate::reading::{Channel, Reading, CHANNEL_COUNT};

/// Butterworth followed by Kalman for one channel
#[derive(Debug, Clone)]
pub struct FilterChain {
    low_pass: ButterworthFilter,
    smoother: KalmanFilter,
}

impl FilterChain {
    /// Chain with a zeroed low-pass and the given Kalman tuning.
    pub fn new(config: KalmanConfig) -> Self {
        Self {
            low_pass: ButterworthFilter::new(),
            smoother: KalmanFilter::new(config),
        }
    }

    /// Run one sample through both stages.
    pub fn apply(&mut self, input: f32) -> f32 {
        let smoothed = self.low_pass.apply(input);
        self.smoother.update(smoothed)
    }

    /// Low-pass stage.
    pub fn low_pass(&self) -> &ButterworthFilter {
        &self.low_pass
    }

    /// Kalman stage.
    pub fn smoother(&self) -> &KalmanFilter {
        &self.smoother
    }

    /// Return both stages to their initial state.
    pub fn reset(&mut self) {
        self.low_pass.reset();
        self.smoother.reset();
    }
}

/// One optional filter chain per channel
#[derive(Debug, Clone, Default)]
pub struct FilterBank {
    chains: [Option<FilterChain>; CHANNEL_COUNT],
}

impl FilterBank {
    /// Bank that filters nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Firmware defaults: serotonin, dopamine and GABA are filtered.
    pub fn analyte_defaults() -> Self {
        let mut bank = Self::new();
        bank.configure(Channel::Serotonin, default_config(Channel::Serotonin));
        bank.configure(Channel::Dopamine, default_config(Channel::Dopamine));
        bank.configure(Channel::Gaba, default_config(Channel::Gaba));
        bank
    }

    /// Install (or replace) the chain for `channel`.
    pub fn configure(&mut self, channel: Channel, config: KalmanConfig) {
        self.chains[channel.index()] = Some(FilterChain::new(config));
    }

    /// Stop filtering `channel`.
    pub fn remove(&mut self, channel: Channel) {
        self.chains[channel.index()] = None;
    }

    /// Chain for `channel`, if filtered.
    pub fn chain(&self, channel: Channel) -> Option<&FilterChain> {
        self.chains[channel.index()].as_ref()
    }

    /// Channels that have a chain.
    pub fn filtered_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL
            .into_iter()
            .filter(move |c| self.chains[c.index()].is_some())
    }

    /// Filter every configured channel of `raw`.
    pub fn apply(&mut self, raw: &Reading) -> Reading {
        let mut out = *raw;
        for channel in Channel::ALL {
            if let Some(chain) = self.chains[channel.index()].as_mut() {
                out = out.with(channel, chain.apply(raw.get(channel)));
            }
        }
        out
    }

    /// Reset every chain to its initial state.
    pub fn reset(&mut self) {
        for chain in self.chains.iter_mut().flatten() {
            chain.reset();
        }
    }
}

/// Kalman tuning the firmware ships with for `channel`.
///
/// Channels the firmware does not filter get [`KalmanConfig::default`].
pub fn default_config(channel: Channel) -> KalmanConfig {
    let (initial, r) = match channel {
        Channel::Serotonin => (SEROTONIN_INITIAL_NM, SEROTONIN_MEASUREMENT_NOISE),
        Channel::Dopamine => (DOPAMINE_INITIAL_NM, DOPAMINE_MEASUREMENT_NOISE),
        Channel::Gaba => (GABA_INITIAL_NM, GABA_MEASUREMENT_NOISE),
        _ => return KalmanConfig::default(),
    };
    KalmanConfig::default()
        .with_initial_estimate(initial)
        .with_process_noise(ANALYTE_PROCESS_NOISE)
        .with_measurement_noise(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(serotonin: f32, dopamine: f32) -> Reading {
        Reading {
            serotonin_nm: serotonin,
            dopamine_nm: dopamine,
            gaba_nm: 2000.0,
            ph_level: 6.5,
            temperature_c: 37.0,
            calprotectin_ug_g: 50.0,
            timestamp_ms: 1000,
        }
    }

    #[test]
    fn chain_runs_low_pass_then_kalman() {
        let config = KalmanConfig::default();
        let mut chain = FilterChain::new(config);

        let mut low_pass = ButterworthFilter::new();
        let mut smoother = KalmanFilter::new(config);
        for x in [10.0, 20.0, 15.0, 30.0] {
            let expected = smoother.update(low_pass.apply(x));
            assert_eq!(chain.apply(x), expected);
        }
    }

    #[test]
    fn unfiltered_channels_pass_through() {
        let mut bank = FilterBank::analyte_defaults();
        let raw = reading(1000.0, 500.0);
        let out = bank.apply(&raw);

        assert_ne!(out.serotonin_nm, raw.serotonin_nm);
        assert_ne!(out.gaba_nm, raw.gaba_nm);
        assert_eq!(out.ph_level, raw.ph_level);
        assert_eq!(out.temperature_c, raw.temperature_c);
        assert_eq!(out.calprotectin_ug_g, raw.calprotectin_ug_g);
        assert_eq!(out.timestamp_ms, raw.timestamp_ms);
    }

    #[test]
    fn channels_do_not_interact() {
        let mut a = FilterBank::analyte_defaults();
        let mut b = FilterBank::analyte_defaults();

        // Same serotonin input, wildly different dopamine input
        for i in 0..30 {
            let ra = a.apply(&reading(1000.0, 500.0));
            let rb = b.apply(&reading(1000.0, 5000.0 * (i % 3) as f32));
            assert_eq!(ra.serotonin_nm, rb.serotonin_nm);
        }
    }

    #[test]
    fn constant_input_settles() {
        let mut bank = FilterBank::new();
        bank.configure(Channel::Dopamine, KalmanConfig::default());
        let mut out = Reading::default();
        for _ in 0..100 {
            out = bank.apply(&reading(0.0, 500.0));
        }
        assert!((out.dopamine_nm - 500.0).abs() < 5.0, "dopamine {}", out.dopamine_nm);
    }

    #[test]
    fn configure_and_remove() {
        let mut bank = FilterBank::analyte_defaults();
        let filtered: heapless::Vec<Channel, 6> = bank.filtered_channels().collect();
        assert_eq!(filtered.as_slice(), &[Channel::Serotonin, Channel::Dopamine, Channel::Gaba]);

        bank.remove(Channel::Gaba);
        assert!(bank.chain(Channel::Gaba).is_none());
        assert_eq!(
            bank.chain(Channel::Serotonin).map(|c| c.smoother().estimate()),
            Some(SEROTONIN_INITIAL_NM)
        );
    }

    #[test]
    fn reset_clears_history() {
        let mut bank = FilterBank::analyte_defaults();
        let first = bank.apply(&reading(1000.0, 500.0));
        bank.apply(&reading(3000.0, 900.0));
        bank.reset();
        assert_eq!(bank.apply(&reading(1000.0, 500.0)), first);
    }
}
