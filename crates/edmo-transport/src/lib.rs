//! Duplex byte links to an EDMO controller.
//!
//! The protocol layers above only need an ordered, full-duplex byte stream.
//! This crate provides one over:
//! - a serial device file (tty), optionally switched to raw mode at a given baud rate
//! - a Unix domain socket (device emulators, bridges such as `socat`, tests)
//!
//! Everything else builds on top of the [`Link`] type provided here.

pub mod address;
pub mod error;
pub mod link;
#[cfg(unix)]
pub mod serial;
#[cfg(unix)]
pub mod uds;

pub use address::LinkAddress;
pub use error::{Result, TransportError};
pub use link::Link;

#[cfg(unix)]
pub use serial::SerialDevice;
#[cfg(unix)]
pub use uds::UnixDomainSocket;
