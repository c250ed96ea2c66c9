use std::io::Write;

use edmo_frame::FrameWriter;
use edmo_proto::{Command, Identifier};
use tracing::debug;

use crate::error::Result;

/// Synchronous command sender.
///
/// Every call is one frame write; a failure is returned to the caller and
/// never retried. Callers sharing a commander across threads must provide
/// their own locking.
pub struct Commander<W> {
    writer: FrameWriter<W>,
}

impl<W: Write> Commander<W> {
    /// Wrap a writable link.
    pub fn new(inner: W) -> Self {
        Self {
            writer: FrameWriter::new(inner),
        }
    }

    /// Encode and write any command.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let opcode = command.opcode();
        let payload = command.to_payload();
        self.writer.send(opcode.as_u8(), &payload)?;
        debug!(opcode = opcode.name(), len = payload.len(), "command sent");
        Ok(())
    }

    pub fn identify(&mut self, id: &Identifier) -> Result<()> {
        self.send(&Command::Identify { id: *id })
    }

    /// Parse `input` as a UUID and identify with it.
    ///
    /// Malformed input is rejected before anything is written.
    pub fn identify_str(&mut self, input: &str) -> Result<Identifier> {
        let id = Identifier::parse(input)?;
        self.identify(&id)?;
        Ok(id)
    }

    pub fn start_session(&mut self, timestamp: u32) -> Result<()> {
        self.send(&Command::StartSession { timestamp })
    }

    pub fn end_session(&mut self) -> Result<()> {
        self.send(&Command::EndSession)
    }

    pub fn update_oscillator(
        &mut self,
        index: u8,
        frequency: f32,
        amplitude: f32,
        offset: f32,
        phase_shift: f32,
    ) -> Result<()> {
        self.send(&Command::OscillatorUpdate {
            index,
            frequency,
            amplitude,
            offset,
            phase_shift,
        })
    }

    pub fn set_angle(&mut self, index: u8, angle: f32) -> Result<()> {
        self.send(&Command::SetAngle { index, angle })
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Consume the commander and return the link.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};

    use edmo_frame::{FrameError, FrameReader};

    use super::*;
    use crate::error::SessionError;

    fn bodies(wire: Vec<u8>) -> Vec<Vec<u8>> {
        FrameReader::new(Cursor::new(wire))
            .map(|frame| frame.unwrap().unescape().to_vec())
            .collect()
    }

    #[test]
    fn set_angle_frame_body() {
        let mut commander = Commander::new(Vec::new());
        commander.set_angle(2, 90.0).unwrap();

        let mut expected = vec![7u8, 2];
        expected.extend_from_slice(&90.0f32.to_le_bytes());
        assert_eq!(bodies(commander.into_inner()), vec![expected]);
    }

    #[test]
    fn calls_map_to_opcodes_in_order() {
        let mut commander = Commander::new(Vec::new());
        commander
            .identify(&Identifier::from_bytes([0x11; 16]))
            .unwrap();
        commander.start_session(1_700_000_000).unwrap();
        commander.update_oscillator(1, 0.5, 30.0, 90.0, 0.0).unwrap();
        commander.end_session().unwrap();

        let opcodes: Vec<u8> = bodies(commander.into_inner())
            .iter()
            .map(|body| body[0])
            .collect();
        assert_eq!(opcodes, vec![0, 1, 3, 6]);
    }

    #[test]
    fn malformed_identifier_writes_nothing() {
        let mut commander = Commander::new(Vec::new());
        let err = commander.identify_str("robot-7").unwrap_err();
        assert!(matches!(err, SessionError::Proto(_)));
        assert!(commander.get_ref().is_empty());
    }

    #[test]
    fn identify_str_sends_parsed_bytes() {
        let mut commander = Commander::new(Vec::new());
        let id = commander
            .identify_str("0f0e0d0c-0b0a-0908-0706-050403020100")
            .unwrap();

        let frames = bodies(commander.into_inner());
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][1..], id.as_bytes());
        assert_eq!(frames[0][1], 0x0f);
    }

    #[test]
    fn write_failure_carries_opcode() {
        let mut commander = Commander::new(ClosedPipe);
        let err = commander.end_session().unwrap_err();
        match err {
            SessionError::Frame(FrameError::Write { opcode, source }) => {
                assert_eq!(opcode, 6);
                assert_eq!(source.kind(), ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
