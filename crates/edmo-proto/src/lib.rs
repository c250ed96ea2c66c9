//! EDMO command payloads and telemetry decoding.
//!
//! This crate knows what goes inside a frame: the opcode table, the
//! little-endian payload layout of each outbound command, and the fixed
//! layout of the inbound telemetry record. Framing and escaping live in
//! `edmo-frame`.

pub mod command;
pub mod error;
pub mod event;
pub mod identifier;
pub mod opcode;
pub mod telemetry;

pub use command::Command;
pub use error::{ProtoError, Result};
pub use event::{decode_event, Event};
pub use identifier::Identifier;
pub use opcode::Opcode;
pub use telemetry::{
    Imu, OscillatorState, Quaternion, TelemetryRecord, Vec3, OSCILLATOR_COUNT,
    TELEMETRY_MIN_LEN, TELEMETRY_RECORD_LEN,
};
