//! Analyte readings and their wire layout
//!
//! A [`Reading`] is one capture from the sensor front end: six analyte and
//! physiological channels plus a millisecond timestamp. It is produced by
//! the sensor collaborator and never mutated afterwards; filtering produces
//! a new value.
//!
//! ## Wire Layout
//!
//! ```text
//! offset  size  field
//!      0     4  serotonin_nm        f32 LE
//!      4     4  dopamine_nm         f32 LE
//!      8     4  gaba_nm             f32 LE
//!     12     4  ph_level            f32 LE
//!     16     4  temperature_c       f32 LE
//!     20     4  calprotectin_ug_g   f32 LE
//!     24     4  timestamp_ms        u32 LE
//! ```
//!
//! Little-endian matches what the receiving app decodes, and is the layout
//! of the delta encoder's baseline.

use crate::constants::READING_WIRE_SIZE;
use crate::errors::{TelemetryError, TelemetryResult};

/// Millisecond timestamp from the device tick counter. Wraps after ~49 days.
pub type Timestamp = u32;

/// Number of floating-point channels in a reading.
pub const CHANNEL_COUNT: usize = 6;

/// One of the six measured channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Serotonin concentration (nM)
    Serotonin = 0,
    /// Dopamine concentration (nM)
    Dopamine = 1,
    /// GABA concentration (nM)
    Gaba = 2,
    /// pH
    Ph = 3,
    /// Temperature (°C)
    Temperature = 4,
    /// Calprotectin (µg/g)
    Calprotectin = 5,
}

impl Channel {
    /// All channels in wire order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Serotonin,
        Channel::Dopamine,
        Channel::Gaba,
        Channel::Ph,
        Channel::Temperature,
        Channel::Calprotectin,
    ];

    /// Position in the wire layout and in per-channel arenas.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Single capture from the sensor front end
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Serotonin (nM)
    pub serotonin_nm: f32,
    /// Dopamine (nM)
    pub dopamine_nm: f32,
    /// GABA (nM)
    pub gaba_nm: f32,
    /// pH
    pub ph_level: f32,
    /// Temperature (°C)
    pub temperature_c: f32,
    /// Calprotectin (µg/g)
    pub calprotectin_ug_g: f32,
    /// Capture time
    pub timestamp_ms: Timestamp,
}

impl Reading {
    /// Value of one channel.
    pub fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Serotonin => self.serotonin_nm,
            Channel::Dopamine => self.dopamine_nm,
            Channel::Gaba => self.gaba_nm,
            Channel::Ph => self.ph_level,
            Channel::Temperature => self.temperature_c,
            Channel::Calprotectin => self.calprotectin_ug_g,
        }
    }

    /// Copy with one channel replaced.
    pub fn with(mut self, channel: Channel, value: f32) -> Self {
        let slot = match channel {
            Channel::Serotonin => &mut self.serotonin_nm,
            Channel::Dopamine => &mut self.dopamine_nm,
            Channel::Gaba => &mut self.gaba_nm,
            Channel::Ph => &mut self.ph_level,
            Channel::Temperature => &mut self.temperature_c,
            Channel::Calprotectin => &mut self.calprotectin_ug_g,
        };
        *slot = value;
        self
    }

    /// True when every channel is a finite number.
    pub fn is_finite(&self) -> bool {
        Channel::ALL.iter().all(|&c| self.get(c).is_finite())
    }

    /// Serialize to the 28-byte little-endian wire layout.
    pub fn to_bytes(&self) -> [u8; READING_WIRE_SIZE] {
        let mut out = [0u8; READING_WIRE_SIZE];
        for channel in Channel::ALL {
            let offset = channel.index() * 4;
            out[offset..offset + 4].copy_from_slice(&self.get(channel).to_le_bytes());
        }
        out[24..28].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        out
    }

    /// Parse the 28-byte wire layout. Extra trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> TelemetryResult<Self> {
        if bytes.len() < READING_WIRE_SIZE {
            return Err(TelemetryError::InvalidInputLength { len: bytes.len() });
        }

        let word = |offset: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[offset..offset + 4]);
            raw
        };

        let mut reading = Reading {
            timestamp_ms: u32::from_le_bytes(word(24)),
            ..Reading::default()
        };
        for channel in Channel::ALL {
            reading = reading.with(channel, f32::from_le_bytes(word(channel.index() * 4)));
        }
        Ok(reading)
    }
}
