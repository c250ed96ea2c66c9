//! Bridge between control clients and EDMO oscillator robots.
//!
//! # Crate Structure
//!
//! - [`transport`]: duplex links (serial tty, Unix domain sockets)
//! - [`frame`]: `ED`/`MO` framing, byte stuffing and stream scanning
//! - [`proto`]: opcodes, command payloads and telemetry decoding
//! - [`session`]: handshake, command writer and telemetry dispatch

/// Re-export transport types.
pub mod transport {
    pub use edmo_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use edmo_frame::*;
}

/// Re-export protocol types.
pub mod proto {
    pub use edmo_proto::*;
}

/// Re-export session types.
pub mod session {
    pub use edmo_session::*;
}
