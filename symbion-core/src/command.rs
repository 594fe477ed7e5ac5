//! Control Commands from the Receiver
//!
//! The receiving app writes short commands to the device's control
//! characteristic. The first byte is the opcode; only `SetInterval` carries
//! arguments.
//!
//! | Opcode | Command         | Payload                     |
//! |--------|-----------------|-----------------------------|
//! | `0x01` | Start sampling  | -                           |
//! | `0x02` | Stop sampling   | -                           |
//! | `0x03` | Calibrate       | -                           |
//! | `0x04` | Self test       | -                           |
//! | `0x05` | Set interval    | `u16` ms, big-endian, bytes 1..3 |
//! | `0x06` | Request status  | -                           |
//!
//! Trailing bytes after a recognized command are ignored, up to
//! [`MAX_COMMAND_LEN`] in total.

use heapless::Vec;

use crate::constants::buffers::MAX_COMMAND_LEN;
use crate::errors::{TelemetryError, TelemetryResult};

const OP_START_SAMPLING: u8 = 0x01;
const OP_STOP_SAMPLING: u8 = 0x02;
const OP_CALIBRATE: u8 = 0x03;
const OP_SELF_TEST: u8 = 0x04;
const OP_SET_INTERVAL: u8 = 0x05;
const OP_REQUEST_STATUS: u8 = 0x06;

/// Command received over the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Begin periodic sampling
    StartSampling,
    /// Stop periodic sampling
    StopSampling,
    /// Run sensor calibration
    Calibrate,
    /// Run the hardware self test
    SelfTest,
    /// Change the sampling interval (milliseconds)
    SetInterval(u16),
    /// Report device status
    RequestStatus,
}

impl ControlCommand {
    /// Parse a command payload.
    pub fn parse(payload: &[u8]) -> TelemetryResult<Self> {
        if payload.is_empty() || payload.len() > MAX_COMMAND_LEN {
            return Err(TelemetryError::InvalidInputLength { len: payload.len() });
        }

        match payload[0] {
            OP_START_SAMPLING => Ok(Self::StartSampling),
            OP_STOP_SAMPLING => Ok(Self::StopSampling),
            OP_CALIBRATE => Ok(Self::Calibrate),
            OP_SELF_TEST => Ok(Self::SelfTest),
            OP_SET_INTERVAL => match payload {
                [_, hi, lo, ..] => Ok(Self::SetInterval(u16::from_be_bytes([*hi, *lo]))),
                _ => Err(TelemetryError::InvalidInputLength { len: payload.len() }),
            },
            OP_REQUEST_STATUS => Ok(Self::RequestStatus),
            opcode => Err(TelemetryError::UnknownCommand { opcode }),
        }
    }

    /// Opcode byte.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::StartSampling => OP_START_SAMPLING,
            Self::StopSampling => OP_STOP_SAMPLING,
            Self::Calibrate => OP_CALIBRATE,
            Self::SelfTest => OP_SELF_TEST,
            Self::SetInterval(_) => OP_SET_INTERVAL,
            Self::RequestStatus => OP_REQUEST_STATUS,
        }
    }

    /// Wire form, as the receiver would send it.
    pub fn encode(&self) -> Vec<u8, MAX_COMMAND_LEN> {
        let mut out = Vec::new();
        // At most 3 bytes; cannot exceed MAX_COMMAND_LEN
        let _ = out.push(self.opcode());
        if let Self::SetInterval(ms) = self {
            let _ = out.extend_from_slice(&ms.to_be_bytes());
        }
        out
    }
}

impl TryFrom<&[u8]> for ControlCommand {
    type Error = TelemetryError;

    fn try_from(payload: &[u8]) -> TelemetryResult<Self> {
        Self::parse(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_opcode() {
        assert_eq!(ControlCommand::parse(&[0x01]), Ok(ControlCommand::StartSampling));
        assert_eq!(ControlCommand::parse(&[0x02]), Ok(ControlCommand::StopSampling));
        assert_eq!(ControlCommand::parse(&[0x03]), Ok(ControlCommand::Calibrate));
        assert_eq!(ControlCommand::parse(&[0x04]), Ok(ControlCommand::SelfTest));
        assert_eq!(
            ControlCommand::parse(&[0x05, 0x01, 0xF4]),
            Ok(ControlCommand::SetInterval(500))
        );
        assert_eq!(ControlCommand::parse(&[0x06]), Ok(ControlCommand::RequestStatus));
    }

    #[test]
    fn set_interval_needs_two_argument_bytes() {
        assert_eq!(
            ControlCommand::parse(&[0x05, 0x01]),
            Err(TelemetryError::InvalidInputLength { len: 2 })
        );
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert_eq!(
            ControlCommand::parse(&[0x7F]),
            Err(TelemetryError::UnknownCommand { opcode: 0x7F })
        );
        assert_eq!(ControlCommand::parse(&[]), Err(TelemetryError::InvalidInputLength { len: 0 }));
        assert_eq!(
            ControlCommand::parse(&[0x01; 9]),
            Err(TelemetryError::InvalidInputLength { len: 9 })
        );
    }

    #[test]
    fn trailing_bytes_ignored() {
        assert_eq!(
            ControlCommand::parse(&[0x02, 0xFF, 0xFF]),
            Ok(ControlCommand::StopSampling)
        );
    }

    #[test]
    fn encode_matches_parse() {
        let cmd = ControlCommand::SetInterval(2000);
        assert_eq!(cmd.encode().as_slice(), &[0x05, 0x07, 0xD0]);
        assert_eq!(ControlCommand::try_from(cmd.encode().as_slice()), Ok(cmd));
        assert_eq!(ControlCommand::Calibrate.encode().as_slice(), &[0x03]);
    }
}
