//! Background scan loop and per-frame dispatch.
//!
//! The scan thread only recognizes frames; unescaping, decoding and
//! reporting happen on a separate dispatch thread so a slow reporter never
//! stalls the link.

use std::io::Read;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use edmo_frame::{FrameConfig, FrameError, FrameReader, RawFrame};
use edmo_proto::{decode_event, Event};
use tracing::{debug, error, info, trace, warn};

use crate::error::{Result, SessionError};

/// Receives decoded inbound events.
pub trait Reporter: Send + Sync + 'static {
    fn report(&self, event: Event);
}

impl<F> Reporter for F
where
    F: Fn(Event) + Send + Sync + 'static,
{
    fn report(&self, event: Event) {
        self(event)
    }
}

impl Reporter for mpsc::Sender<Event> {
    fn report(&self, event: Event) {
        if self.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }
}

/// How a scan loop ended.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The link reached end of stream.
    Closed,
    /// Reading failed; no further frames will be scanned.
    Failed(FrameError),
    /// The scan thread panicked.
    Panicked,
}

/// Handle to a running scan loop.
pub struct ScanHandle {
    scan: JoinHandle<ScanOutcome>,
    dispatch: JoinHandle<u64>,
}

impl ScanHandle {
    /// Whether the scan thread has stopped reading.
    pub fn is_finished(&self) -> bool {
        self.scan.is_finished()
    }

    /// Wait for the scan loop to end and every queued frame to be reported.
    pub fn join(self) -> ScanOutcome {
        let outcome = self.scan.join().unwrap_or(ScanOutcome::Panicked);
        match self.dispatch.join() {
            Ok(dispatched) => debug!(dispatched, "dispatch thread finished"),
            Err(_) => warn!("dispatch thread panicked"),
        }
        outcome
    }
}

/// Start scanning `reader` on a dedicated thread.
///
/// Frames are handed to a second thread in arrival order; it decodes each
/// one and calls `reporter`. The scan loop runs until the link closes or a
/// read fails, which is logged once and returned from [`ScanHandle::join`].
pub fn spawn_scan<T, R>(reader: T, config: FrameConfig, reporter: R) -> Result<ScanHandle>
where
    T: Read + Send + 'static,
    R: Reporter,
{
    let (tx, rx) = mpsc::channel::<RawFrame>();

    let dispatch = thread::Builder::new()
        .name("edmo-dispatch".to_string())
        .spawn(move || dispatch_loop(rx, reporter))
        .map_err(|source| SessionError::Spawn {
            name: "edmo-dispatch",
            source,
        })?;

    let scan = thread::Builder::new()
        .name("edmo-scan".to_string())
        .spawn(move || scan_loop(FrameReader::with_config(reader, config), tx))
        .map_err(|source| SessionError::Spawn {
            name: "edmo-scan",
            source,
        })?;

    Ok(ScanHandle { scan, dispatch })
}

fn scan_loop<T: Read>(mut reader: FrameReader<T>, tx: mpsc::Sender<RawFrame>) -> ScanOutcome {
    let outcome = loop {
        match reader.read_frame() {
            Ok(frame) => {
                trace!(len = frame.escaped().len(), "frame recognized");
                if tx.send(frame).is_err() {
                    warn!("dispatch thread gone, stopping scan");
                    break ScanOutcome::Closed;
                }
            }
            Err(FrameError::ConnectionClosed) => {
                info!("link closed");
                break ScanOutcome::Closed;
            }
            Err(err) => {
                error!(error = %err, "link read failed");
                break ScanOutcome::Failed(err);
            }
        }
    };

    let stats = reader.stats();
    debug!(
        frames = stats.frames,
        discarded_bytes = stats.discarded_bytes,
        overflow_resets = stats.overflow_resets,
        restarts = stats.restarts,
        "scan loop finished"
    );
    outcome
}

fn dispatch_loop<R: Reporter>(rx: mpsc::Receiver<RawFrame>, reporter: R) -> u64 {
    let mut dispatched = 0u64;
    for frame in rx {
        if let Some(event) = decode_event(&frame.unescape()) {
            reporter.report(event);
            dispatched += 1;
        }
    }
    dispatched
}

/// Scan an async reader, spawning one task per recognized frame.
///
/// Tasks run unordered; use [`spawn_scan`] when report order matters.
/// Must be called from within a tokio runtime.
#[cfg(feature = "async")]
pub fn spawn_scan_async<T, R>(
    reader: T,
    config: FrameConfig,
    reporter: std::sync::Arc<R>,
) -> tokio::task::JoinHandle<ScanOutcome>
where
    T: tokio::io::AsyncRead + Unpin + Send + 'static,
    R: Reporter,
{
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    tokio::spawn(async move {
        let mut frames = FramedRead::new(reader, edmo_frame::EdmoCodec::with_config(&config));
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => {
                    let reporter = std::sync::Arc::clone(&reporter);
                    tokio::spawn(async move {
                        if let Some(event) = decode_event(&frame.unescape()) {
                            reporter.report(event);
                        }
                    });
                }
                Err(err) => {
                    error!(error = %err, "link read failed");
                    return ScanOutcome::Failed(err);
                }
            }
        }
        info!("link closed");
        ScanOutcome::Closed
    })
}
