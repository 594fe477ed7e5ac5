//! Baseline-Plus-Delta Batch Compression
//!
//! ## Overview
//!
//! A batch of readings is sent as one full-precision baseline followed by
//! small fixed-point differences, cutting a 10-reading batch from 280 bytes
//! to 64.
//!
//! ```text
//! [ baseline: Reading, 28 bytes LE ]
//! [ Δserotonin i16 BE | Δdopamine i16 BE ]   × (N - 1)
//!
//! Δ = round((value - baseline.value) × 10)      // 0.1 nM resolution
//! ```
//!
//! Deltas are always taken against the baseline, not the previous reading,
//! so one corrupted record does not poison the rest of the batch.
//!
//! ## Channel Coverage
//!
//! Only serotonin and dopamine are carried after the baseline. GABA, pH,
//! temperature, calprotectin and the per-reading timestamps are dropped for
//! readings 2..N. The receiver is built around this layout; covering more
//! channels is a product decision and a wire change, not a fix.
//!
//! Differences beyond ±3276.7 nM saturate at the `i16` limits.

use heapless::Vec;

use crate::constants::buffers::{DELTA_RECORD_SIZE, MAX_PLAINTEXT_LEN, READING_WIRE_SIZE};
use crate::constants::signal::DELTA_SCALE;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::reading::Reading;

/// Most delta records that fit after a baseline in one frame.
pub const MAX_DELTA_RECORDS: usize = (MAX_PLAINTEXT_LEN - READING_WIRE_SIZE) / DELTA_RECORD_SIZE;

/// Encoded batch bytes, ready for encryption.
pub type EncodedBatch = Vec<u8, MAX_PLAINTEXT_LEN>;

/// Encoded size of a batch of `count` readings (`count >= 1`).
pub const fn encoded_len(count: usize) -> usize {
    READING_WIRE_SIZE + count.saturating_sub(1) * DELTA_RECORD_SIZE
}

/// One reading after the baseline, as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeltaRecord {
    /// Serotonin difference in tenths of a nM
    pub serotonin: i16,
    /// Dopamine difference in tenths of a nM
    pub dopamine: i16,
}

impl DeltaRecord {
    fn between(baseline: &Reading, reading: &Reading) -> Self {
        Self {
            serotonin: scaled_delta(reading.serotonin_nm, baseline.serotonin_nm),
            dopamine: scaled_delta(reading.dopamine_nm, baseline.dopamine_nm),
        }
    }

    /// Reconstructed `(serotonin_nm, dopamine_nm)`.
    pub fn resolve(&self, baseline: &Reading) -> (f32, f32) {
        (
            baseline.serotonin_nm + self.serotonin as f32 / DELTA_SCALE,
            baseline.dopamine_nm + self.dopamine as f32 / DELTA_SCALE,
        )
    }
}

/// Decoded form of an [`EncodedBatch`]
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBatch {
    /// First reading, full precision
    pub baseline: Reading,
    /// Readings 2..N
    pub records: Vec<DeltaRecord, MAX_DELTA_RECORDS>,
}

impl DecodedBatch {
    /// Readings in the batch, baseline included.
    pub fn len(&self) -> usize {
        1 + self.records.len()
    }

    /// Never true; a batch always has a baseline.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Reconstructed `(serotonin_nm, dopamine_nm)` for every reading.
    pub fn analytes(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let first = (self.baseline.serotonin_nm, self.baseline.dopamine_nm);
        core::iter::once(first).chain(self.records.iter().map(|r| r.resolve(&self.baseline)))
    }
}

/// Baseline-plus-delta codec
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaEncoder;

impl DeltaEncoder {
    /// Encode `readings`, the first one becoming the baseline.
    pub fn encode(readings: &[Reading]) -> TelemetryResult<EncodedBatch> {
        let (baseline, rest) = readings.split_first().ok_or(TelemetryError::EmptyBatch)?;

        let required = encoded_len(readings.len());
        if required > MAX_PLAINTEXT_LEN {
            return Err(TelemetryError::BufferOverflowRisk {
                required,
                capacity: MAX_PLAINTEXT_LEN,
            });
        }
        let overflow = |_| TelemetryError::BufferOverflowRisk {
            required,
            capacity: MAX_PLAINTEXT_LEN,
        };

        let mut out = EncodedBatch::new();
        out.extend_from_slice(&baseline.to_bytes()).map_err(overflow)?;
        for reading in rest {
            let record = DeltaRecord::between(baseline, reading);
            out.extend_from_slice(&record.serotonin.to_be_bytes()).map_err(overflow)?;
            out.extend_from_slice(&record.dopamine.to_be_bytes()).map_err(overflow)?;
        }
        Ok(out)
    }

    /// Decode a batch produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> TelemetryResult<DecodedBatch> {
        if bytes.len() < READING_WIRE_SIZE
            || (bytes.len() - READING_WIRE_SIZE) % DELTA_RECORD_SIZE != 0
        {
            return Err(TelemetryError::InvalidInputLength { len: bytes.len() });
        }
        if bytes.len() > MAX_PLAINTEXT_LEN {
            return Err(TelemetryError::BufferOverflowRisk {
                required: bytes.len(),
                capacity: MAX_PLAINTEXT_LEN,
            });
        }

        let (head, tail) = bytes.split_at(READING_WIRE_SIZE);
        let baseline = Reading::from_bytes(head)?;

        let mut records = Vec::new();
        for chunk in tail.chunks_exact(DELTA_RECORD_SIZE) {
            let record = DeltaRecord {
                serotonin: i16::from_be_bytes([chunk[0], chunk[1]]),
                dopamine: i16::from_be_bytes([chunk[2], chunk[3]]),
            };
            records.push(record).map_err(|_| TelemetryError::BufferOverflowRisk {
                required: bytes.len(),
                capacity: MAX_PLAINTEXT_LEN,
            })?;
        }

        Ok(DecodedBatch { baseline, records })
    }
}

fn scaled_delta(value: f32, baseline: f32) -> i16 {
    // Float-to-int `as` saturates, NaN becomes 0
    libm::roundf((value - baseline) * DELTA_SCALE) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(serotonin: f32, dopamine: f32, t: u32) -> Reading {
        Reading {
            serotonin_nm: serotonin,
            dopamine_nm: dopamine,
            gaba_nm: 2000.0,
            ph_level: 6.5,
            temperature_c: 37.0,
            calprotectin_ug_g: 50.0,
            timestamp_ms: t,
        }
    }

    #[test]
    fn baseline_then_big_endian_deltas() {
        let batch = [reading(1000.0, 500.0, 0), reading(1000.5, 499.0, 1000)];
        let encoded = DeltaEncoder::encode(&batch).unwrap();

        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[..28], &batch[0].to_bytes());
        assert_eq!(&encoded[28..], &[0x00, 0x05, 0xFF, 0xF6]);
    }

    #[test]
    fn single_reading_is_just_the_baseline() {
        let only = reading(1.0, 2.0, 3);
        let encoded = DeltaEncoder::encode(&[only]).unwrap();
        assert_eq!(encoded.as_slice(), &only.to_bytes());
    }

    #[test]
    fn empty_batch_rejected() {
        assert_eq!(DeltaEncoder::encode(&[]), Err(TelemetryError::EmptyBatch));
    }

    #[test]
    fn deltas_round_to_nearest() {
        let batch = [
            reading(100.0, 100.0, 0),
            reading(100.06, 99.94, 1),
            reading(100.04, 100.0, 2),
        ];
        let decoded = DeltaEncoder::decode(&DeltaEncoder::encode(&batch).unwrap()).unwrap();
        assert_eq!(decoded.records[0], DeltaRecord { serotonin: 1, dopamine: -1 });
        assert_eq!(decoded.records[1], DeltaRecord { serotonin: 0, dopamine: 0 });
    }

    #[test]
    fn large_deltas_saturate() {
        let batch = [
            reading(0.0, 0.0, 0),
            reading(5000.0, -5000.0, 1),
            reading(f32::NAN, 0.0, 2),
        ];
        let decoded = DeltaEncoder::decode(&DeltaEncoder::encode(&batch).unwrap()).unwrap();
        assert_eq!(decoded.records[0], DeltaRecord { serotonin: i16::MAX, dopamine: i16::MIN });
        assert_eq!(decoded.records[1].serotonin, 0);
    }

    #[test]
    fn identical_readings_compress_below_a_third() {
        for n in 5..=MAX_DELTA_RECORDS + 1 {
            let batch: std::vec::Vec<Reading> = (0..n).map(|_| reading(1000.0, 500.0, 0)).collect();
            let encoded = DeltaEncoder::encode(&batch).unwrap();
            assert_eq!(encoded.len(), encoded_len(n));
            assert!(encoded.len() * 3 < n * READING_WIRE_SIZE, "n = {}", n);
        }
    }

    #[test]
    fn oversized_batch_rejected() {
        let batch = [reading(0.0, 0.0, 0); MAX_DELTA_RECORDS + 2];
        assert_eq!(
            DeltaEncoder::encode(&batch),
            Err(TelemetryError::BufferOverflowRisk {
                required: encoded_len(MAX_DELTA_RECORDS + 2),
                capacity: MAX_PLAINTEXT_LEN,
            })
        );
    }

    #[test]
    fn only_serotonin_and_dopamine_survive_after_the_baseline() {
        // Deliberate wire format: changing this needs a receiver update too
        let batch = [
            reading(1000.0, 500.0, 0),
            Reading {
                gaba_nm: 9999.0,
                ph_level: 1.0,
                temperature_c: 99.0,
                calprotectin_ug_g: 0.0,
                timestamp_ms: 5000,
                ..reading(1010.0, 495.0, 0)
            },
        ];
        let encoded = DeltaEncoder::encode(&batch).unwrap();
        assert_eq!(encoded.len() - READING_WIRE_SIZE, DELTA_RECORD_SIZE);

        let decoded = DeltaEncoder::decode(&encoded).unwrap();
        let analytes: std::vec::Vec<(f32, f32)> = decoded.analytes().collect();
        assert_eq!(analytes, [(1000.0, 500.0), (1010.0, 495.0)]);
        assert_eq!(decoded.baseline, batch[0]);
    }

    #[test]
    fn decode_rejects_bad_lengths() {
        for len in [0, 27, 29, 31] {
            let data = [0u8; 31];
            assert_eq!(
                DeltaEncoder::decode(&data[..len]),
                Err(TelemetryError::InvalidInputLength { len })
            );
        }
    }
}
