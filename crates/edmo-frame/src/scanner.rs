//! Frame boundary detection over an unframed byte stream.
//!
//! The scanner is fed one byte at a time and yields still-escaped frame
//! bodies. It never blocks and never fails; malformed input is discarded and
//! counted in [`ScannerStats`].

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, trace};

use crate::codec::{FrameConfig, RawFrame, END_MARKER, MARKER_LEN, START_MARKER};
use crate::escape::ESCAPE;

/// Default accumulation ceiling in bytes.
pub const DEFAULT_MAX_BUFFER: usize = 1024;

/// How the scanner decides where frames begin and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Track escape state so escaped marker bytes are never taken as
    /// delimiters. A literal `ED` anywhere outside a frame starts one, and a
    /// literal `ED` inside a frame restarts it.
    #[default]
    EscapeAware,
    /// Compare the buffer's first two bytes against `ED` and its last two
    /// against `MO` after every byte.
    ///
    /// This matches the controller firmware's host tooling byte for byte and
    /// inherits its limitations:
    /// - the end test is not escape-aware;
    /// - stale bytes at the front of the buffer hide a later start marker
    ///   until the buffer passes the ceiling and is cleared;
    /// - a buffer that begins with `ED` but never sees `MO` is not capped.
    ///
    /// Frames produced by [`encode_frame`](crate::codec::encode_frame) never
    /// contain a literal `MO`, so the first limitation only bites on
    /// malformed input.
    Literal,
}

/// Counters describing what the scanner has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerStats {
    /// Frames recognized.
    pub frames: u64,
    /// Bytes dropped because they were outside any frame or in a discarded one.
    pub discarded_bytes: u64,
    /// Times the accumulation buffer hit the ceiling and was cleared.
    pub overflow_resets: u64,
    /// Partial frames abandoned because a new start marker arrived.
    pub restarts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Hunting,
    InFrame,
}

/// Stateful frame scanner.
#[derive(Debug)]
pub struct FrameScanner {
    mode: ScanMode,
    max_buffer: usize,
    buf: BytesMut,
    state: State,
    // Escape-aware bookkeeping.
    pending_start: bool,
    escaped: bool,
    last_literal: Option<u8>,
    stats: ScannerStats,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    /// Escape-aware scanner with the default ceiling.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Scanner with explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            mode: config.scan_mode,
            max_buffer: config.max_buffer,
            buf: BytesMut::with_capacity(config.max_buffer.min(DEFAULT_MAX_BUFFER)),
            state: State::Hunting,
            pending_start: false,
            escaped: false,
            last_literal: None,
            stats: ScannerStats::default(),
        }
    }

    /// Active scan mode.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Counters since construction or the last [`reset`](Self::reset).
    pub fn stats(&self) -> ScannerStats {
        self.stats
    }

    /// Bytes currently held in the accumulation buffer.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame and zero the counters.
    pub fn reset(&mut self) {
        self.clear();
        self.stats = ScannerStats::default();
    }

    /// Consume one byte, returning a frame if this byte completed one.
    pub fn push(&mut self, byte: u8) -> Option<RawFrame> {
        match self.mode {
            ScanMode::Literal => self.push_literal(byte),
            ScanMode::EscapeAware => self.push_escape_aware(byte),
        }
    }

    /// Consume a slice, returning every frame it completed.
    pub fn feed(&mut self, data: &[u8]) -> Vec<RawFrame> {
        data.iter().filter_map(|&byte| self.push(byte)).collect()
    }

    /// Consume bytes from `src` until one frame completes.
    ///
    /// Bytes up to and including the frame's last marker byte are removed from
    /// `src`; anything after it stays for the next call. When no frame
    /// completes, `src` is drained entirely into the scanner.
    pub fn scan(&mut self, src: &mut BytesMut) -> Option<RawFrame> {
        for index in 0..src.len() {
            if let Some(frame) = self.push(src[index]) {
                src.advance(index + 1);
                return Some(frame);
            }
        }
        src.clear();
        None
    }

    fn push_literal(&mut self, byte: u8) -> Option<RawFrame> {
        self.buf.put_u8(byte);

        let len = self.buf.len();
        if len >= MARKER_LEN && self.buf[..MARKER_LEN] == START_MARKER {
            if len >= 2 * MARKER_LEN && self.buf[len - MARKER_LEN..] == END_MARKER {
                let mut body = self.buf.split();
                body.advance(MARKER_LEN);
                body.truncate(body.len() - MARKER_LEN);
                return Some(self.emit(body));
            }
        } else if len > self.max_buffer {
            debug!(len, "no start marker within buffer ceiling, resetting");
            self.stats.overflow_resets += 1;
            self.stats.discarded_bytes += len as u64;
            self.buf.clear();
        }
        None
    }

    fn push_escape_aware(&mut self, byte: u8) -> Option<RawFrame> {
        match self.state {
            State::Hunting => {
                if self.pending_start && byte == START_MARKER[1] {
                    self.pending_start = false;
                    self.begin_frame();
                    return None;
                }
                if self.pending_start {
                    self.stats.discarded_bytes += 1;
                }
                self.pending_start = byte == START_MARKER[0];
                if !self.pending_start {
                    self.stats.discarded_bytes += 1;
                }
                None
            }
            State::InFrame => {
                let literal = !self.escaped && byte != ESCAPE;
                self.escaped = !self.escaped && byte == ESCAPE;

                if literal {
                    if self.last_literal == Some(END_MARKER[0]) && byte == END_MARKER[1] {
                        let mut body = self.buf.split();
                        body.truncate(body.len() - 1);
                        self.state = State::Hunting;
                        return Some(self.emit(body));
                    }
                    if self.last_literal == Some(START_MARKER[0]) && byte == START_MARKER[1] {
                        let abandoned = self.buf.len() - 1;
                        debug!(abandoned, "start marker inside frame, restarting");
                        self.stats.restarts += 1;
                        self.stats.discarded_bytes += abandoned as u64 + MARKER_LEN as u64;
                        self.begin_frame();
                        return None;
                    }
                }

                self.buf.put_u8(byte);
                self.last_literal = literal.then_some(byte);

                if self.buf.len() > self.max_buffer {
                    debug!(
                        len = self.buf.len(),
                        "frame exceeds buffer ceiling, discarding"
                    );
                    self.stats.overflow_resets += 1;
                    self.stats.discarded_bytes += self.buf.len() as u64 + MARKER_LEN as u64;
                    self.clear();
                }
                None
            }
        }
    }

    fn begin_frame(&mut self) {
        self.buf.clear();
        self.state = State::InFrame;
        self.escaped = false;
        self.last_literal = None;
    }

    fn clear(&mut self) {
        self.buf.clear();
        self.state = State::Hunting;
        self.pending_start = false;
        self.escaped = false;
        self.last_literal = None;
    }

    fn emit(&mut self, body: BytesMut) -> RawFrame {
        self.stats.frames += 1;
        self.escaped = false;
        self.last_literal = None;
        trace!(len = body.len(), "frame recognized");
        RawFrame::new(body.freeze())
    }
}
