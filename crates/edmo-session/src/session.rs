use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use edmo_frame::FrameConfig;
use edmo_proto::Identifier;
use edmo_transport::Link;
use tracing::{debug, error, info, warn};

use crate::commander::Commander;
use crate::dispatch::{spawn_scan, Reporter, ScanHandle, ScanOutcome};
use crate::error::{Result, SessionError};

const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Scanner settings for the inbound side.
    pub frame: FrameConfig,
    /// How long [`Session::shutdown`] waits for the scan thread to notice the
    /// link closing before leaving it behind. Default: 500ms.
    pub shutdown_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            shutdown_grace: Duration::from_millis(500),
        }
    }
}

/// Steps of the startup handshake that failed.
///
/// A failed step is logged and recorded here; it does not stop the steps
/// after it.
#[derive(Debug, Default)]
pub struct StartupReport {
    pub identify: Option<SessionError>,
    pub start_session: Option<SessionError>,
}

impl StartupReport {
    /// Whether both handshake commands were written.
    pub fn is_clean(&self) -> bool {
        self.identify.is_none() && self.start_session.is_none()
    }
}

/// What happened while tearing a session down.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Set when `EndSession` could not be written.
    pub end_session: Option<SessionError>,
    /// How the scan loop ended, or `None` if it was still blocked in a read
    /// when the grace period ran out.
    pub scan: Option<ScanOutcome>,
}

/// An open session with one controller.
///
/// Owns the link's write half through its [`Commander`]; a cloned read half
/// is scanned on a background thread for the session's lifetime.
pub struct Session {
    id: Identifier,
    timestamp: u32,
    commander: Commander<Link>,
    scan: ScanHandle,
    startup: StartupReport,
    config: SessionConfig,
}

impl Session {
    /// Identify, start the session and begin scanning.
    ///
    /// Only failing to set up the reader is an error; handshake write
    /// failures are recorded in [`startup`](Self::startup).
    pub fn start<R: Reporter>(link: Link, config: SessionConfig, reporter: R) -> Result<Self> {
        let reader = link.try_clone()?;
        let mut commander = Commander::new(link);
        let mut startup = StartupReport::default();

        let id = Identifier::random();
        if let Err(err) = commander.identify(&id) {
            error!(error = %err, "identify failed");
            startup.identify = Some(err);
        }

        let timestamp = unix_timestamp();
        if let Err(err) = commander.start_session(timestamp) {
            error!(error = %err, "start session failed");
            startup.start_session = Some(err);
        }

        let scan = spawn_scan(reader, config.frame.clone(), reporter)?;
        info!(
            %id,
            timestamp,
            link = commander.get_ref().kind(),
            "session started"
        );

        Ok(Self {
            id,
            timestamp,
            commander,
            scan,
            startup,
            config,
        })
    }

    /// Identifier sent with `Identify`.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Timestamp sent with `StartSession`.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn startup(&self) -> &StartupReport {
        &self.startup
    }

    /// Write side for the collaborator-facing command calls.
    pub fn commander(&mut self) -> &mut Commander<Link> {
        &mut self.commander
    }

    /// Whether the scan loop has stopped (link closed or failed).
    pub fn is_scan_finished(&self) -> bool {
        self.scan.is_finished()
    }

    /// End the session and release the link.
    ///
    /// Every step is best-effort: failures are logged and reported, never
    /// returned early.
    pub fn shutdown(mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        if let Err(err) = self.commander.end_session() {
            error!(error = %err, "end session failed");
            report.end_session = Some(err);
        }

        if let Err(err) = self.commander.get_ref().shutdown() {
            warn!(error = %err, "link shutdown failed");
        }

        let deadline = Instant::now() + self.config.shutdown_grace;
        while !self.scan.is_finished() && Instant::now() < deadline {
            thread::sleep(SHUTDOWN_POLL);
        }

        if self.scan.is_finished() {
            report.scan = Some(self.scan.join());
        } else {
            debug!("scan thread still blocked in read, detaching");
        }

        info!(id = %self.id, "session ended");
        report
    }
}

/// Current Unix time in seconds, truncated to 32 bits.
pub fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as u32)
}
