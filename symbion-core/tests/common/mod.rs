//! Common test utilities for integration tests
//!
//! This module provides:
//! - A scripted BLE-like transport that records every segment
//! - Reading generators and a scripted sensor (see [`generators`])
//! - The provisioning keys used across the suite
//! - A receiver-side decrypt helper

#![allow(dead_code)]

pub mod generators;

use symbion_core::{ChainCoder, FixedIv, FrameBuffer, Key, TelemetryResult, Transport};

/// Key the firmware ships with for bench testing (FIPS-197 example key)
pub const BENCH_KEY: [u8; 16] = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];

/// Second key for re-provisioning tests
pub const ROTATED_KEY: [u8; 16] = [0x5a; 16];

pub fn bench_key() -> Key {
    Key::new(BENCH_KEY)
}

/// Failure reported by [`MockTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Notification queue full
    Congested,
}

/// Transport that records segments and can be told to fail
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Link state reported by `is_ready`
    pub ready: bool,
    /// Accept this many more segments, then refuse one
    pub fail_after: Option<usize>,
    /// Every accepted segment, in order
    pub segments: Vec<Vec<u8>>,
    /// Refused send attempts
    pub refusals: usize,
}

impl MockTransport {
    /// Connected link that accepts everything.
    pub fn connected() -> Self {
        Self { ready: true, ..Self::default() }
    }

    /// Link with no peer.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connected link that accepts `n` segments and refuses the next.
    pub fn failing_after(n: usize) -> Self {
        Self { ready: true, fail_after: Some(n), ..Self::default() }
    }

    /// All accepted bytes, reassembled in arrival order.
    pub fn received(&self) -> Vec<u8> {
        self.segments.concat()
    }

    /// Reassembled stream cut into frames of `frame_len` bytes.
    pub fn frames(&self, frame_len: usize) -> Vec<Vec<u8>> {
        self.received().chunks(frame_len).map(<[u8]>::to_vec).collect()
    }
}

impl Transport for MockTransport {
    type Error = LinkError;

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn send_segment(&mut self, segment: &[u8]) -> Result<(), LinkError> {
        match self.fail_after {
            Some(0) => {
                self.refusals += 1;
                self.fail_after = None;
                Err(LinkError::Congested)
            }
            Some(ref mut n) => {
                *n -= 1;
                self.segments.push(segment.to_vec());
                Ok(())
            }
            None => {
                self.segments.push(segment.to_vec());
                Ok(())
            }
        }
    }
}

/// What the receiving app does with a reassembled frame.
pub fn receive(frame: &[u8], key: &Key) -> TelemetryResult<FrameBuffer> {
    ChainCoder::new(FixedIv::zero()).decrypt(frame, key)
}
