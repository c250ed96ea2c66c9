//! Session handling for EDMO controllers.
//!
//! This is the layer a bridge talks to: open a [`Session`] on a link, send
//! commands through its [`Commander`], and receive decoded [`Event`]s via a
//! [`Reporter`] while a background thread scans the link.
//!
//! [`Event`]: edmo_proto::Event

pub mod commander;
pub mod dispatch;
pub mod error;
pub mod session;

pub use commander::Commander;
#[cfg(feature = "async")]
pub use dispatch::spawn_scan_async;
pub use dispatch::{spawn_scan, Reporter, ScanHandle, ScanOutcome};
pub use error::{Result, SessionError};
pub use session::{unix_timestamp, Session, SessionConfig, ShutdownReport, StartupReport};
