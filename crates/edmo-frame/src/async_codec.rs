//! `tokio_util::codec` adapter for async links.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, FrameConfig, RawFrame};
use crate::error::FrameError;
use crate::scanner::{FrameScanner, ScannerStats};

/// Codec yielding [`RawFrame`]s and encoding `(opcode, payload)` pairs.
///
/// Decoding drains the read buffer into an internal [`FrameScanner`], so a
/// stream ending mid-frame is not reported as an error; the partial frame is
/// simply never yielded.
#[derive(Debug, Default)]
pub struct EdmoCodec {
    scanner: FrameScanner,
}

impl EdmoCodec {
    /// Codec with the default (escape-aware) scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with an explicit scanner configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            scanner: FrameScanner::with_config(config),
        }
    }

    /// Scanner counters.
    pub fn stats(&self) -> ScannerStats {
        self.scanner.stats()
    }
}

impl Decoder for EdmoCodec {
    type Item = RawFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.scanner.scan(src))
    }
}

impl Encoder<(u8, Bytes)> for EdmoCodec {
    type Error = FrameError;

    fn encode(&mut self, item: (u8, Bytes), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (opcode, payload) = item;
        encode_frame(opcode, &payload, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[test]
    fn decode_across_partial_buffers() {
        let mut codec = EdmoCodec::new();
        let mut buf = BytesMut::from(&b"ED\x07\x02"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(b"\x00\x00\xb4\x42MOED");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.unescape().as_ref(), b"\x07\x02\x00\x00\xb4\x42");
        assert_eq!(buf.as_ref(), b"ED");
    }

    #[test]
    fn encode_matches_blocking_writer() {
        let mut codec = EdmoCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode((1, Bytes::from_static(&[0xE8, 0x03, 0, 0])), &mut buf)
            .unwrap();
        assert_eq!(buf.as_ref(), b"ED\x01\xe8\x03\x00\x00MO");
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(client, EdmoCodec::new());
        let mut stream = FramedRead::new(server, EdmoCodec::new());

        sink.send((6, Bytes::new())).await.unwrap();
        sink.send((69, Bytes::from_static(b"EDMO"))).await.unwrap();
        drop(sink);

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.unescape().as_ref(), &[6]);
        assert_eq!(second.unescape().as_ref(), b"EEDMO");
        assert!(stream.next().await.is_none());
    }
}
