//! Byte-stuffed framing for EDMO serial links.
//!
//! Every frame on the wire is:
//! - the 2-byte start marker `ED`
//! - the opcode and its payload, escaped as one unit
//! - the 2-byte end marker `MO`
//!
//! The escape byte `\` is inserted before any of `E`, `D`, `M`, `O` and `\`
//! itself, so markers never appear literally inside a frame body.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod escape;
pub mod reader;
pub mod scanner;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::EdmoCodec;
pub use codec::{encode_frame, FrameConfig, RawFrame, END_MARKER, MARKER_LEN, START_MARKER};
pub use error::{FrameError, Result};
pub use escape::{escape, escape_into, needs_escape, unescape, unescape_into, ESCAPE};
pub use reader::FrameReader;
pub use scanner::{FrameScanner, ScanMode, ScannerStats, DEFAULT_MAX_BUFFER};
pub use writer::FrameWriter;
