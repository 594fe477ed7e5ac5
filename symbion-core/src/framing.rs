//! MTU Framing
//!
//! The radio accepts at most one MTU per notification, so an encrypted
//! frame leaves the device as a run of segments:
//!
//! ```text
//! frame (64 bytes), MTU 20
//! ┌──────────20──────────┬──────────20──────────┬──────────20──────────┬─4─┐
//! │ segment 0            │ segment 1            │ segment 2            │ 3 │
//! └──────────────────────┴──────────────────────┴──────────────────────┴───┘
//! ```
//!
//! Segments borrow from the frame, come out in order, and concatenate back
//! to it exactly. Only the last one may be short. There is no per-segment
//! header: the receiver reassembles by arrival order, which BLE notifications
//! on one connection preserve.

use core::slice::Chunks;

use crate::errors::{TelemetryError, TelemetryResult};

/// Splits frames into MTU-sized segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameChunker {
    mtu: usize,
}

impl FrameChunker {
    /// Chunker for a transport that takes at most `mtu` bytes per send.
    pub fn new(mtu: usize) -> TelemetryResult<Self> {
        if mtu == 0 {
            return Err(TelemetryError::InvalidSegmentSize);
        }
        Ok(Self { mtu })
    }

    /// Maximum segment length.
    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Number of segments a frame of `len` bytes produces.
    pub fn segment_count(&self, len: usize) -> usize {
        len.div_ceil(self.mtu)
    }

    /// Split `data` into segments. An empty frame yields no segments.
    pub fn chunk<'a>(&self, data: &'a [u8]) -> Segments<'a> {
        Segments { inner: data.chunks(self.mtu) }
    }
}

/// Split `data` into segments of at most `max_segment` bytes.
pub fn chunk(data: &[u8], max_segment: usize) -> TelemetryResult<Segments<'_>> {
    Ok(FrameChunker::new(max_segment)?.chunk(data))
}

/// Ordered segments of one frame
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    inner: Chunks<'a, u8>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}
