use bytes::{BufMut, Bytes, BytesMut};

use crate::identifier::Identifier;
use crate::opcode::Opcode;

/// Commands the host sends to the controller.
///
/// Numeric parameters are encoded as given; mapping user-facing units
/// (degrees, arm numbering) is the caller's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Announce the host with a 16-byte identifier.
    Identify { id: Identifier },
    /// Start a session at the given Unix timestamp (seconds, truncated to 32 bits).
    StartSession { timestamp: u32 },
    /// Update one oscillator's parameters.
    OscillatorUpdate {
        index: u8,
        frequency: f32,
        amplitude: f32,
        offset: f32,
        phase_shift: f32,
    },
    /// End the session.
    EndSession,
    /// Move one arm to an angle.
    SetAngle { index: u8, angle: f32 },
}

impl Command {
    /// Opcode selecting this command's payload layout.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Identify { .. } => Opcode::Identify,
            Self::StartSession { .. } => Opcode::StartSession,
            Self::OscillatorUpdate { .. } => Opcode::OscillatorUpdate,
            Self::EndSession => Opcode::EndSession,
            Self::SetAngle { .. } => Opcode::SetAngle,
        }
    }

    /// Encoded payload size in bytes (opcode excluded).
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Identify { .. } => 16,
            Self::StartSession { .. } => 4,
            Self::OscillatorUpdate { .. } => 1 + 4 * 4,
            Self::EndSession => 0,
            Self::SetAngle { .. } => 1 + 4,
        }
    }

    /// Append the little-endian payload to `dst`.
    pub fn encode_payload(&self, dst: &mut BytesMut) {
        dst.reserve(self.payload_len());
        match self {
            Self::Identify { id } => dst.put_slice(id.as_bytes()),
            Self::StartSession { timestamp } => dst.put_u32_le(*timestamp),
            Self::OscillatorUpdate {
                index,
                frequency,
                amplitude,
                offset,
                phase_shift,
            } => {
                dst.put_u8(*index);
                dst.put_f32_le(*frequency);
                dst.put_f32_le(*amplitude);
                dst.put_f32_le(*offset);
                dst.put_f32_le(*phase_shift);
            }
            Self::EndSession => {}
            Self::SetAngle { index, angle } => {
                dst.put_u8(*index);
                dst.put_f32_le(*angle);
            }
        }
    }

    /// The payload as an owned buffer.
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.payload_len());
        self.encode_payload(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use edmo_frame::{encode_frame, unescape, FrameScanner};

    use super::*;

    fn framed(command: &Command) -> BytesMut {
        let mut wire = BytesMut::new();
        encode_frame(command.opcode().as_u8(), &command.to_payload(), &mut wire);
        wire
    }

    #[test]
    fn identify_payload_is_raw_id() {
        let id = Identifier::from_bytes(*b"EDMO-robot-01234");
        let command = Command::Identify { id };
        assert_eq!(command.to_payload().as_ref(), b"EDMO-robot-01234");
        assert_eq!(command.opcode(), Opcode::Identify);
    }

    #[test]
    fn start_session_is_le_u32() {
        let payload = Command::StartSession {
            timestamp: 0x0102_0304,
        }
        .to_payload();
        assert_eq!(payload.as_ref(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn oscillator_update_field_order() {
        let payload = Command::OscillatorUpdate {
            index: 3,
            frequency: 1.0,
            amplitude: 2.0,
            offset: 3.0,
            phase_shift: 4.0,
        }
        .to_payload();

        assert_eq!(payload.len(), 17);
        assert_eq!(payload[0], 3);
        assert_eq!(&payload[1..5], &1.0f32.to_le_bytes());
        assert_eq!(&payload[5..9], &2.0f32.to_le_bytes());
        assert_eq!(&payload[9..13], &3.0f32.to_le_bytes());
        assert_eq!(&payload[13..17], &4.0f32.to_le_bytes());
    }

    #[test]
    fn end_session_has_empty_payload() {
        assert!(Command::EndSession.to_payload().is_empty());
        assert_eq!(framed(&Command::EndSession).as_ref(), b"ED\x06MO");
    }

    #[test]
    fn set_angle_survives_escape_roundtrip() {
        let wire = framed(&Command::SetAngle {
            index: 2,
            angle: 90.0,
        });
        let body = &wire[2..wire.len() - 2];

        let mut expected = vec![7u8, 2];
        expected.extend_from_slice(&90.0f32.to_bits().to_le_bytes());
        assert_eq!(unescape(body), expected);
    }

    #[test]
    fn every_command_scans_back_intact() {
        let commands = [
            Command::Identify {
                id: Identifier::from_bytes([b'E'; 16]),
            },
            Command::StartSession {
                timestamp: u32::from_le_bytes(*b"MOED"),
            },
            Command::OscillatorUpdate {
                index: b'O',
                frequency: f32::from_le_bytes(*b"\\\\MO"),
                amplitude: -0.0,
                offset: f32::NAN,
                phase_shift: f32::INFINITY,
            },
            Command::EndSession,
            Command::SetAngle {
                index: b'D',
                angle: f32::from_le_bytes(*b"EDMO"),
            },
        ];

        let mut scanner = FrameScanner::new();
        for command in &commands {
            let frames = scanner.feed(&framed(command));
            assert_eq!(frames.len(), 1, "{command:?}");
            let body = frames[0].unescape();
            assert_eq!(body[0], command.opcode().as_u8());
            assert_eq!(&body[1..], command.to_payload().as_ref());
            assert_eq!(body.len() - 1, command.payload_len());
        }
    }
}
