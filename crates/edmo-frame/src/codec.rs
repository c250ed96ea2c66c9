use bytes::{BufMut, Bytes, BytesMut};

use crate::escape::{escape_into, unescape_into};
use crate::scanner::{ScanMode, DEFAULT_MAX_BUFFER};

/// Marker length in bytes.
pub const MARKER_LEN: usize = 2;

/// Start marker: "ED" (0x45 0x44).
pub const START_MARKER: [u8; MARKER_LEN] = [0x45, 0x44];

/// End marker: "MO" (0x4D 0x4F).
pub const END_MARKER: [u8; MARKER_LEN] = [0x4D, 0x4F];

/// A recognized frame body, still escaped, with both markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    escaped: Bytes,
}

impl RawFrame {
    /// Wrap an escaped frame body.
    pub fn new(escaped: impl Into<Bytes>) -> Self {
        Self {
            escaped: escaped.into(),
        }
    }

    /// The escaped body as received.
    pub fn escaped(&self) -> &Bytes {
        &self.escaped
    }

    /// Remove byte-stuffing, yielding `opcode ++ payload`.
    pub fn unescape(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.escaped.len());
        unescape_into(&self.escaped, &mut out);
        out.freeze()
    }

    /// The total wire size of this frame (markers + escaped body).
    pub fn wire_size(&self) -> usize {
        2 * MARKER_LEN + self.escaped.len()
    }
}

/// Encode one frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────────┬──────────────┐
/// │ Start (2B)   │ escape(opcode ++ payload)    │ End (2B)     │
/// │ 0x45 0x44    │ 0x5C before E, D, M, O, \    │ 0x4D 0x4F    │
/// │ "ED"         │                              │ "MO"         │
/// └──────────────┴──────────────────────────────┴──────────────┘
/// ```
pub fn encode_frame(opcode: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(2 * MARKER_LEN + 2 * (1 + payload.len()));
    dst.put_slice(&START_MARKER);
    escape_into(&[opcode], dst);
    escape_into(payload, dst);
    dst.put_slice(&END_MARKER);
}

/// Configuration for frame scanning.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// How frame boundaries are detected. Default: escape-aware.
    pub scan_mode: ScanMode,
    /// Accumulation ceiling in bytes before the scanner resets. Default: 1024.
    pub max_buffer: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::default(),
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}
