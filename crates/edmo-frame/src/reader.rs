use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{FrameConfig, RawFrame};
use crate::error::{FrameError, Result};
use crate::scanner::{FrameScanner, ScannerStats};

const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads and resynchronization internally; callers always
/// get complete (still-escaped) frame bodies.
pub struct FrameReader<T> {
    inner: T,
    pending: BytesMut,
    scanner: FrameScanner,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            scanner: FrameScanner::with_config(&config),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<RawFrame> {
        loop {
            if let Some(frame) = self.scanner.scan(&mut self.pending) {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            trace!(read, "link bytes received");
            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Scanner counters (frames, discarded bytes, resets).
    pub fn stats(&self) -> ScannerStats {
        self.scanner.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<RawFrame>;

    /// Yields frames until the stream closes; a clean EOF ends iteration.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;
    use crate::scanner::ScanMode;

    fn wire(opcode: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(opcode, payload, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(6, b"")));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.unescape().as_ref(), &[6]);
    }

    #[test]
    fn read_multiple_frames_from_one_chunk() {
        let mut reader = FrameReader::new(Cursor::new([
            wire(0, &[0xAA; 16]),
            wire(1, &1000u32.to_le_bytes()),
            wire(6, b""),
        ]
        .concat()));

        let f1 = reader.read_frame().unwrap().unescape();
        let f2 = reader.read_frame().unwrap().unescape();
        let f3 = reader.read_frame().unwrap().unescape();

        assert_eq!(f1[0], 0);
        assert_eq!(&f1[1..], &[0xAA; 16]);
        assert_eq!(f2.as_ref(), &[1, 0xE8, 0x03, 0, 0]);
        assert_eq!(f3.as_ref(), &[6]);
        assert_eq!(reader.stats().frames, 3);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(7, b"\x01MOED"),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.unescape().as_ref(), b"\x07\x01MOED");
    }

    #[test]
    fn skips_leading_noise() {
        let mut bytes = b"garbage\x00\xff".to_vec();
        bytes.extend_from_slice(&wire(6, b""));
        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap().unescape().as_ref(), &[6]);
    }

    #[test]
    fn literal_mode_configurable() {
        let cfg = FrameConfig {
            scan_mode: ScanMode::Literal,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire(6, b"")), cfg);
        assert_eq!(reader.read_frame().unwrap().unescape().as_ref(), &[6]);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut reader = FrameReader::new(Cursor::new(b"ED\x45\x01\x02".to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn iterator_stops_at_eof() {
        let reader = FrameReader::new(Cursor::new([wire(6, b""), wire(6, b"")].concat()));
        let frames: Vec<_> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn read_error_propagates() {
        let mut reader = FrameReader::new(FailingReader);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(8, b"ok")),
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.unescape().as_ref(), b"\x08ok");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(3, &[0u8; 17]).unwrap();
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.unescape().len(), 18);
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
