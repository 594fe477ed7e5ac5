//! Telemetry Pipeline
//!
//! ## Overview
//!
//! One [`TelemetryPipeline`] owns everything the device needs between the
//! sensor front end and the radio:
//!
//! ```text
//!            ┌────────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! Sensor ──► │ FilterBank │ ─►│ DeltaEncoder │ ─►│ ChainCoder  │ ─►│ FrameChunker │ ─► Transport
//!            │ per channel│   │ (batched)    │   │ AES-128-CBC │   │ MTU segments │
//!            └────────────┘   └──────────────┘   └─────────────┘   └──────────────┘
//! ```
//!
//! In [`TransmitMode::PerReading`] (the firmware default) every filtered
//! reading is encrypted and sent on its own as 28 bytes → 48-byte frame →
//! three 20-byte segments. In [`TransmitMode::Batched`] readings collect in
//! a fixed-capacity batch and go out delta-encoded once it is full.
//!
//! ## Execution Model
//!
//! Single-threaded and cooperative. [`tick`](TelemetryPipeline::tick) is one
//! iteration of the device main loop; each reading is filtered, encoded,
//! encrypted and handed to the transport before the call returns. Nothing
//! blocks and nothing is retried.
//!
//! ## Failure Handling
//!
//! A frame is all-or-nothing. If the transport refuses a segment the rest
//! of the frame is abandoned, counted in [`PipelineStats::frames_lost`] and
//! reported as [`TelemetryError::PartialTransmission`]. Whether to reset the
//! link is the caller's decision.
//!
//! ## Usage Example
//!
//! ```rust
//! use symbion_core::{FixedIv, Key, PipelineConfig, TelemetryPipeline};
//! use symbion_core::{Reading, Transport};
//!
//! struct Sink(usize);
//! impl Transport for Sink {
//!     type Error = ();
//!     fn is_ready(&self) -> bool { true }
//!     fn send_segment(&mut self, segment: &[u8]) -> Result<(), ()> {
//!         self.0 += segment.len();
//!         Ok(())
//!     }
//! }
//!
//! let mut pipeline = TelemetryPipeline::new(
//!     PipelineConfig::default(),
//!     Key::zero(),
//!     FixedIv::zero(),
//! )?;
//!
//! let filtered = pipeline.filter(&Reading { serotonin_nm: 1000.0, ..Reading::default() });
//! let mut sink = Sink(0);
//! assert_eq!(pipeline.transmit_reading(&filtered, &mut sink)?, 3);
//! assert_eq!(sink.0, 48);
//! # Ok::<(), symbion_core::TelemetryError>(())
//! ```

use heapless::Vec;

use crate::chain::{ciphertext_len, ChainCoder, IvSource};
use crate::cipher::{expand_key, ExpandedKey, Key};
use crate::command::ControlCommand;
use crate::constants::buffers::{
    DEFAULT_BATCH_SIZE, DEFAULT_MTU, MAX_BATCH_READINGS, MAX_FRAME_CAPACITY, READING_WIRE_SIZE,
};
use crate::constants::time::{DEFAULT_SAMPLING_INTERVAL_MS, MIN_SAMPLING_INTERVAL_MS};
use crate::delta::{encoded_len, DeltaEncoder};
use crate::errors::{TelemetryError, TelemetryResult};
use crate::filters::{default_config, FilterBank, KalmanConfig};
use crate::framing::FrameChunker;
use crate::reading::{Channel, Reading, Timestamp, CHANNEL_COUNT};
use crate::traits::{SensorSource, Transport};

/// How filtered readings leave the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitMode {
    /// One encrypted frame per reading
    #[default]
    PerReading,
    /// Delta-encoded frame once the batch is full
    Batched,
}

/// Runtime configuration for a [`TelemetryPipeline`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Largest segment the transport accepts
    pub mtu: usize,
    /// Frame budget: IV + padded plaintext
    pub max_frame_len: usize,
    /// Readings per delta-encoded batch
    pub batch_size: usize,
    /// Milliseconds between samples
    pub sampling_interval_ms: u32,
    /// Per-reading or batched transmission
    pub transmit_mode: TransmitMode,
    /// Kalman tuning per channel; `None` leaves the channel unfiltered
    pub channel_filters: [Option<KalmanConfig>; CHANNEL_COUNT],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut channel_filters = [None; CHANNEL_COUNT];
        for channel in [Channel::Serotonin, Channel::Dopamine, Channel::Gaba] {
            channel_filters[channel.index()] = Some(default_config(channel));
        }

        Self {
            mtu: DEFAULT_MTU,
            max_frame_len: MAX_FRAME_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            transmit_mode: TransmitMode::PerReading,
            channel_filters,
        }
    }
}

impl PipelineConfig {
    /// Set the transport MTU.
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    /// Set the frame budget.
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Set readings per batch.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the sampling interval.
    pub fn with_sampling_interval(mut self, interval_ms: u32) -> Self {
        self.sampling_interval_ms = interval_ms;
        self
    }

    /// Set the transmit mode.
    pub fn with_transmit_mode(mut self, mode: TransmitMode) -> Self {
        self.transmit_mode = mode;
        self
    }

    /// Filter `channel` with the given tuning, or stop filtering it with `None`.
    pub fn with_channel_filter(mut self, channel: Channel, config: Option<KalmanConfig>) -> Self {
        self.channel_filters[channel.index()] = config;
        self
    }

    /// Check every field before a pipeline is built from it.
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.mtu == 0 {
            return Err(TelemetryError::InvalidSegmentSize);
        }
        if self.max_frame_len > MAX_FRAME_CAPACITY {
            return Err(TelemetryError::InvalidConfig {
                reason: "max_frame_len exceeds working buffer",
            });
        }
        if ciphertext_len(READING_WIRE_SIZE) > self.max_frame_len {
            return Err(TelemetryError::InvalidConfig {
                reason: "max_frame_len cannot hold one reading",
            });
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_READINGS {
            return Err(TelemetryError::InvalidConfig {
                reason: "batch_size outside 1..=MAX_BATCH_READINGS",
            });
        }
        if ciphertext_len(encoded_len(self.batch_size)) > self.max_frame_len {
            return Err(TelemetryError::InvalidConfig {
                reason: "batch does not fit max_frame_len",
            });
        }
        if self.sampling_interval_ms < MIN_SAMPLING_INTERVAL_MS {
            return Err(TelemetryError::InvalidConfig {
                reason: "sampling interval below minimum",
            });
        }
        if self.channel_filters.iter().flatten().any(|c| !c.is_valid()) {
            return Err(TelemetryError::InvalidConfig {
                reason: "kalman tuning out of range",
            });
        }
        Ok(())
    }
}

/// Counters since the pipeline was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    /// Readings run through the filters
    pub readings_processed: u32,
    /// Readings refused because the batch was already full
    pub readings_dropped: u32,
    /// Frames fully handed to the transport
    pub frames_sent: u32,
    /// Frames abandoned (link down or segment refused)
    pub frames_lost: u32,
    /// Segments accepted by the transport
    pub segments_sent: u32,
    /// Bytes accepted by the transport
    pub bytes_sent: u32,
}

/// When the next sample is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingSchedule {
    active: bool,
    interval_ms: u32,
    last_sample_ms: Timestamp,
}

impl SamplingSchedule {
    /// Inactive schedule with the given interval.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            active: false,
            interval_ms: interval_ms.max(MIN_SAMPLING_INTERVAL_MS),
            last_sample_ms: 0,
        }
    }

    /// Start sampling; the first sample is one interval after `now_ms`.
    pub fn start(&mut self, now_ms: Timestamp) {
        self.active = true;
        self.last_sample_ms = now_ms;
    }

    /// Stop sampling.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Change the interval, clamped to [`MIN_SAMPLING_INTERVAL_MS`].
    pub fn set_interval(&mut self, interval_ms: u32) {
        if interval_ms < MIN_SAMPLING_INTERVAL_MS {
            log_warn!(
                "Sampling interval {} ms below minimum, using {} ms",
                interval_ms,
                MIN_SAMPLING_INTERVAL_MS
            );
        }
        self.interval_ms = interval_ms.max(MIN_SAMPLING_INTERVAL_MS);
    }

    /// True while sampling is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current interval in milliseconds.
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// True when sampling is active and a full interval has passed.
    ///
    /// Tolerates the millisecond counter wrapping.
    pub fn is_due(&self, now_ms: Timestamp) -> bool {
        self.active && now_ms.wrapping_sub(self.last_sample_ms) >= self.interval_ms
    }

    fn mark(&mut self, now_ms: Timestamp) {
        self.last_sample_ms = now_ms;
    }
}

/// Filter → encode → encrypt → frame → send, for one device
pub struct TelemetryPipeline<I> {
    config: PipelineConfig,
    round_keys: ExpandedKey,
    coder: ChainCoder<I>,
    chunker: FrameChunker,
    filters: FilterBank,
    batch: Vec<Reading, MAX_BATCH_READINGS>,
    sampling: SamplingSchedule,
    stats: PipelineStats,
}

impl<I: IvSource> TelemetryPipeline<I> {
    /// Build a pipeline from a validated config.
    pub fn new(config: PipelineConfig, key: Key, iv_source: I) -> TelemetryResult<Self> {
        config.validate()?;

        let mut filters = FilterBank::new();
        for channel in Channel::ALL {
            if let Some(tuning) = config.channel_filters[channel.index()] {
                filters.configure(channel, tuning);
            }
        }

        log_info!(
            "Pipeline ready: mtu={} frame={} batch={} interval={}ms",
            config.mtu,
            config.max_frame_len,
            config.batch_size,
            config.sampling_interval_ms
        );

        Ok(Self {
            round_keys: expand_key(&key),
            coder: ChainCoder::with_capacity(iv_source, config.max_frame_len)?,
            chunker: FrameChunker::new(config.mtu)?,
            filters,
            batch: Vec::new(),
            sampling: SamplingSchedule::new(config.sampling_interval_ms),
            stats: PipelineStats::default(),
            config,
        })
    }

    /// Replace the active key. Frames already sent are unaffected.
    pub fn set_key(&mut self, key: Key) {
        self.round_keys = expand_key(&key);
        log_info!("Encryption key re-provisioned");
    }

    /// Run `raw` through the per-channel filters.
    pub fn filter(&mut self, raw: &Reading) -> Reading {
        self.stats.readings_processed = self.stats.readings_processed.saturating_add(1);
        self.filters.apply(raw)
    }

    /// Encrypt and send one reading on its own. Returns segments sent.
    pub fn transmit_reading<T: Transport>(
        &mut self,
        reading: &Reading,
        transport: &mut T,
    ) -> TelemetryResult<usize> {
        let frame = self.coder.encrypt_with(&reading.to_bytes(), &self.round_keys)?;
        self.send_frame(&frame, transport)
    }

    /// Add a reading to the batch. Returns true once the batch is full.
    ///
    /// A reading pushed into a full batch is dropped.
    pub fn push_reading(&mut self, reading: Reading) -> bool {
        if self.batch.len() >= self.config.batch_size || self.batch.push(reading).is_err() {
            self.stats.readings_dropped = self.stats.readings_dropped.saturating_add(1);
            log_warn!("Batch full, reading at {} ms dropped", reading.timestamp_ms);
            return true;
        }
        self.batch.len() >= self.config.batch_size
    }

    /// Delta-encode, encrypt and send the batch. Returns segments sent.
    ///
    /// The batch is emptied whether or not the frame makes it out.
    pub fn flush_batch<T: Transport>(&mut self, transport: &mut T) -> TelemetryResult<usize> {
        let batch = core::mem::take(&mut self.batch);
        let encoded = DeltaEncoder::encode(&batch)?;
        let frame = self.coder.encrypt_with(&encoded, &self.round_keys)?;
        log_debug!("Flushing batch of {} readings ({} bytes)", batch.len(), encoded.len());
        self.send_frame(&frame, transport)
    }

    /// Send one encrypted frame segment by segment. Returns segments sent.
    ///
    /// Stops at the first refused segment; nothing is resent.
    pub fn send_frame<T: Transport>(
        &mut self,
        frame: &[u8],
        transport: &mut T,
    ) -> TelemetryResult<usize> {
        if !transport.is_ready() {
            self.stats.frames_lost = self.stats.frames_lost.saturating_add(1);
            log_warn!("Transport not ready, {} byte frame dropped", frame.len());
            return Err(TelemetryError::TransportNotReady);
        }

        let total = self.chunker.segment_count(frame.len());
        for (sent, segment) in self.chunker.chunk(frame).enumerate() {
            if let Err(_err) = transport.send_segment(segment) {
                self.stats.frames_lost = self.stats.frames_lost.saturating_add(1);
                log_warn!("Segment {} of {} refused: {:?}", sent + 1, total, _err);
                return Err(TelemetryError::PartialTransmission { sent, total });
            }
            self.stats.segments_sent = self.stats.segments_sent.saturating_add(1);
            self.stats.bytes_sent = self.stats.bytes_sent.saturating_add(segment.len() as u32);
        }

        self.stats.frames_sent = self.stats.frames_sent.saturating_add(1);
        log_debug!("Frame sent: {} bytes in {} segments", frame.len(), total);
        Ok(total)
    }

    /// Apply a control command.
    ///
    /// Sampling commands are handled here. Calibrate (which also stops
    /// sampling), SelfTest and RequestStatus are returned for the caller's
    /// hardware collaborators.
    pub fn handle_command(
        &mut self,
        command: ControlCommand,
        now_ms: Timestamp,
    ) -> Option<ControlCommand> {
        log_info!("Command: {:?}", command);
        match command {
            ControlCommand::StartSampling => {
                self.sampling.start(now_ms);
                None
            }
            ControlCommand::StopSampling => {
                self.sampling.stop();
                None
            }
            ControlCommand::SetInterval(ms) => {
                self.sampling.set_interval(u32::from(ms));
                None
            }
            ControlCommand::Calibrate => {
                self.sampling.stop();
                Some(command)
            }
            ControlCommand::SelfTest | ControlCommand::RequestStatus => Some(command),
        }
    }

    /// Parse and apply a raw control payload.
    pub fn handle_command_bytes(
        &mut self,
        payload: &[u8],
        now_ms: Timestamp,
    ) -> TelemetryResult<Option<ControlCommand>> {
        let command = ControlCommand::parse(payload).map_err(|err| {
            log_warn!("Rejected control payload: {}", err);
            err
        })?;
        Ok(self.handle_command(command, now_ms))
    }

    /// One main-loop iteration.
    ///
    /// Samples only while the transport is ready and an interval has
    /// elapsed. Returns the filtered reading when one was taken.
    pub fn tick<S: SensorSource, T: Transport>(
        &mut self,
        now_ms: Timestamp,
        sensor: &mut S,
        transport: &mut T,
    ) -> TelemetryResult<Option<Reading>> {
        if !transport.is_ready() || !self.sampling.is_due(now_ms) {
            return Ok(None);
        }
        self.sampling.mark(now_ms);

        let raw = sensor.read();
        let filtered = self.filter(&raw);

        match self.config.transmit_mode {
            TransmitMode::PerReading => {
                self.transmit_reading(&filtered, transport)?;
            }
            TransmitMode::Batched => {
                if self.push_reading(filtered) {
                    self.flush_batch(transport)?;
                }
            }
        }
        Ok(Some(filtered))
    }

    /// Counters since creation.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Sampling state.
    pub fn sampling(&self) -> &SamplingSchedule {
        &self.sampling
    }

    /// Readings waiting in the batch.
    pub fn pending(&self) -> &[Reading] {
        &self.batch
    }

    /// Per-channel filters.
    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::FixedIv;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_config_filters_analytes_only() {
        let config = PipelineConfig::default();
        assert!(config.channel_filters[Channel::Serotonin.index()].is_some());
        assert!(config.channel_filters[Channel::Gaba.index()].is_some());
        assert!(config.channel_filters[Channel::Ph.index()].is_none());
    }

    #[test]
    fn rejects_bad_configs() {
        let base = PipelineConfig::default;
        assert_eq!(base().with_mtu(0).validate(), Err(TelemetryError::InvalidSegmentSize));
        assert!(base().with_max_frame_len(257).validate().is_err());
        assert!(base().with_max_frame_len(47).validate().is_err());
        assert!(base().with_max_frame_len(48).with_batch_size(1).validate().is_ok());
        assert!(base().with_batch_size(0).validate().is_err());
        assert!(base().with_batch_size(MAX_BATCH_READINGS + 1).validate().is_err());
        assert!(base().with_sampling_interval(10).validate().is_err());

        let noisy = KalmanConfig::default().with_measurement_noise(-1.0);
        assert!(base()
            .with_channel_filter(Channel::Ph, Some(noisy))
            .validate()
            .is_err());

        let noiseless = KalmanConfig::default().with_process_noise(0.0).with_measurement_noise(0.0);
        let config = base().with_channel_filter(Channel::Ph, Some(noiseless));
        assert!(config.validate().is_err());
        assert!(TelemetryPipeline::new(config, Key::zero(), FixedIv::zero()).is_err());
    }

    #[test]
    fn batch_must_fit_frame_budget() {
        // 10 readings: 64 bytes encoded, 96 on the wire
        assert!(PipelineConfig::default().with_max_frame_len(96).validate().is_ok());
        assert!(PipelineConfig::default().with_max_frame_len(95).validate().is_err());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = PipelineConfig::default().with_mtu(0);
        assert!(TelemetryPipeline::new(config, Key::zero(), FixedIv::zero()).is_err());
    }

    #[test]
    fn schedule_waits_one_interval_after_start() {
        let mut schedule = SamplingSchedule::new(1000);
        assert!(!schedule.is_due(5000));

        schedule.start(5000);
        assert!(!schedule.is_due(5999));
        assert!(schedule.is_due(6000));

        schedule.stop();
        assert!(!schedule.is_due(9000));
    }

    #[test]
    fn schedule_survives_counter_wrap() {
        let mut schedule = SamplingSchedule::new(1000);
        schedule.start(u32::MAX - 100);
        assert!(!schedule.is_due(500));
        assert!(schedule.is_due(900));
    }

    #[test]
    fn interval_clamped_to_minimum() {
        let mut schedule = SamplingSchedule::new(1000);
        schedule.set_interval(0);
        assert_eq!(schedule.interval_ms(), MIN_SAMPLING_INTERVAL_MS);
        schedule.set_interval(2500);
        assert_eq!(schedule.interval_ms(), 2500);
    }

    #[test]
    fn calibrate_stops_sampling_and_is_returned() {
        let mut pipeline =
            TelemetryPipeline::new(PipelineConfig::default(), Key::zero(), FixedIv::zero()).unwrap();

        assert_eq!(pipeline.handle_command(ControlCommand::StartSampling, 0), None);
        assert!(pipeline.sampling().is_active());

        assert_eq!(
            pipeline.handle_command(ControlCommand::Calibrate, 10),
            Some(ControlCommand::Calibrate)
        );
        assert!(!pipeline.sampling().is_active());

        assert_eq!(
            pipeline.handle_command(ControlCommand::RequestStatus, 20),
            Some(ControlCommand::RequestStatus)
        );
    }

    #[test]
    fn push_reading_reports_full_and_drops_overflow() {
        let config = PipelineConfig::default().with_batch_size(2);
        let mut pipeline = TelemetryPipeline::new(config, Key::zero(), FixedIv::zero()).unwrap();

        assert!(!pipeline.push_reading(Reading::default()));
        assert!(pipeline.push_reading(Reading::default()));
        assert!(pipeline.push_reading(Reading::default()));
        assert_eq!(pipeline.pending().len(), 2);
        assert_eq!(pipeline.stats().readings_dropped, 1);
    }
}
