//! Collaborator interfaces
//!
//! The pipeline does no I/O of its own. Sensor front ends and radio links
//! are injected through these traits, so the same core runs against the
//! nRF52 drivers on the device and against scripted mocks in tests.

use crate::reading::Reading;

/// Source of raw readings (ADC front end, replay file, mock)
pub trait SensorSource {
    /// Capture one reading. Synchronous; never fails from the pipeline's view.
    fn read(&mut self) -> Reading;
}

/// Segment-oriented transport (BLE notifications)
///
/// `send_segment` is hand-off-and-continue: when it returns `Ok` the segment
/// has been accepted in order, and the next one may follow.
pub trait Transport {
    /// Driver-specific failure
    type Error: core::fmt::Debug;

    /// True when a peer is connected and notifications are enabled.
    fn is_ready(&self) -> bool;

    /// Hand one segment (at most one MTU) to the link.
    fn send_segment(&mut self, segment: &[u8]) -> Result<(), Self::Error>;
}

impl<S: SensorSource + ?Sized> SensorSource for &mut S {
    fn read(&mut self) -> Reading {
        (**self).read()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn send_segment(&mut self, segment: &[u8]) -> Result<(), Self::Error> {
        (**self).send_segment(segment)
    }
}
