//! Reading generators for integration tests
//!
//! Produces analyte series with a realistic shape: a slow baseline, sensor
//! noise and the occasional electrode spike. Seeded, so every run sees the
//! same data.

use rand::{rngs::StdRng, Rng, SeedableRng};

use symbion_core::{Reading, SensorSource, Timestamp};

/// Resting gut-lumen concentrations (nM) and physiological values
pub mod baseline {
    pub const SEROTONIN_NM: f32 = 1000.0;
    pub const DOPAMINE_NM: f32 = 500.0;
    pub const GABA_NM: f32 = 2000.0;
    pub const PH: f32 = 6.5;
    pub const TEMPERATURE_C: f32 = 37.0;
    pub const CALPROTECTIN_UG_G: f32 = 50.0;
}

/// Reading at resting values
pub fn resting(timestamp_ms: Timestamp) -> Reading {
    Reading {
        serotonin_nm: baseline::SEROTONIN_NM,
        dopamine_nm: baseline::DOPAMINE_NM,
        gaba_nm: baseline::GABA_NM,
        ph_level: baseline::PH,
        temperature_c: baseline::TEMPERATURE_C,
        calprotectin_ug_g: baseline::CALPROTECTIN_UG_G,
        timestamp_ms,
    }
}

/// Seeded noisy analyte series
pub struct AnalyteGenerator {
    rng: StdRng,
    /// Peak-to-peak noise on each analyte (nM)
    pub noise_nm: f32,
    /// Probability of a spike per sample
    pub spike_rate: f64,
}

impl AnalyteGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise_nm: 50.0,
            spike_rate: 0.02,
        }
    }

    /// One reading around the resting values.
    pub fn next_reading(&mut self, timestamp_ms: Timestamp) -> Reading {
        let mut reading = resting(timestamp_ms);
        reading.serotonin_nm += self.noise();
        reading.dopamine_nm += self.noise();
        reading.gaba_nm += self.noise();
        reading.ph_level += self.rng.gen_range(-0.05..0.05);

        if self.rng.gen_bool(self.spike_rate) {
            reading.serotonin_nm += 800.0;
        }
        reading
    }

    /// `count` readings spaced `interval_ms` apart.
    pub fn series(&mut self, count: usize, interval_ms: u32) -> Vec<Reading> {
        (0..count)
            .map(|i| self.next_reading(i as u32 * interval_ms))
            .collect()
    }

    fn noise(&mut self) -> f32 {
        let half = self.noise_nm / 2.0;
        self.rng.gen_range(-half..half)
    }
}

/// Sensor that replays a fixed script, then repeats its last reading
pub struct ScriptedSensor {
    script: Vec<Reading>,
    next: usize,
}

impl ScriptedSensor {
    pub fn new(script: Vec<Reading>) -> Self {
        assert!(!script.is_empty(), "script needs at least one reading");
        Self { script, next: 0 }
    }

    /// Readings handed out so far.
    pub fn reads(&self) -> usize {
        self.next
    }
}

impl SensorSource for ScriptedSensor {
    fn read(&mut self) -> Reading {
        let index = self.next.min(self.script.len() - 1);
        self.next += 1;
        self.script[index]
    }
}
