//! Byte-stuffing for frame bodies.
//!
//! Both directions are total: any byte sequence escapes, and any byte
//! sequence unescapes (a trailing lone escape byte is dropped).

use bytes::{BufMut, BytesMut};

use crate::codec::{END_MARKER, START_MARKER};

/// Escape byte: `\` (0x5C).
pub const ESCAPE: u8 = 0x5C;

/// Whether `byte` must be preceded by [`ESCAPE`] inside a frame body.
#[inline]
pub fn needs_escape(byte: u8) -> bool {
    byte == ESCAPE
        || byte == START_MARKER[0]
        || byte == START_MARKER[1]
        || byte == END_MARKER[0]
        || byte == END_MARKER[1]
}

/// Append the escaped form of `src` to `dst`.
pub fn escape_into(src: &[u8], dst: &mut BytesMut) {
    dst.reserve(src.len());
    for &byte in src {
        if needs_escape(byte) {
            dst.put_u8(ESCAPE);
        }
        dst.put_u8(byte);
    }
}

/// Escape `src` into a new buffer.
pub fn escape(src: &[u8]) -> Vec<u8> {
    let mut out = BytesMut::with_capacity(src.len());
    escape_into(src, &mut out);
    out.to_vec()
}

/// Append the unescaped form of `src` to `dst`.
pub fn unescape_into(src: &[u8], dst: &mut BytesMut) {
    dst.reserve(src.len());
    let mut bytes = src.iter();
    while let Some(&byte) = bytes.next() {
        if byte == ESCAPE {
            if let Some(&next) = bytes.next() {
                dst.put_u8(next);
            }
        } else {
            dst.put_u8(byte);
        }
    }
}

/// Unescape `src` into a new buffer.
pub fn unescape(src: &[u8]) -> Vec<u8> {
    let mut out = BytesMut::with_capacity(src.len());
    unescape_into(src, &mut out);
    out.to_vec()
}
