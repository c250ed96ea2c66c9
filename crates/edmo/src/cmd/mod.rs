use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use edmo_frame::{FrameConfig, ScanMode};
use edmo_proto::{Command as WireCommand, Identifier};
use edmo_session::unix_timestamp;
use edmo_transport::{Link, LinkAddress};
use tracing::info;

use crate::exit::{proto_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bridge;
pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a session and relay JSON control messages from stdin.
    Bridge(BridgeArgs),
    /// Send a single command.
    Send(SendArgs),
    /// Print decoded events without starting a session.
    Listen(ListenArgs),
    /// Decode a captured byte stream.
    Decode(DecodeArgs),
    /// Print the framed bytes for a command.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Bridge(args) => bridge::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum ScanModeArg {
    #[default]
    EscapeAware,
    Literal,
}

impl From<ScanModeArg> for ScanMode {
    fn from(arg: ScanModeArg) -> Self {
        match arg {
            ScanModeArg::EscapeAware => ScanMode::EscapeAware,
            ScanModeArg::Literal => ScanMode::Literal,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// How frame boundaries are detected on the inbound stream.
    #[arg(long, value_enum, default_value = "escape-aware")]
    pub scan_mode: ScanModeArg,
}

impl ScanArgs {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            scan_mode: self.scan_mode.into(),
            ..FrameConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device path or `unix:<socket path>`. Falls back to SERIAL_PORT.
    #[arg(env = "EDMO_LINK", value_name = "LINK")]
    pub link: Option<String>,
    /// Baud rate for serial devices; the device is left as configured when unset.
    #[arg(long, env = "BAUD_RATE")]
    pub baud: Option<u32>,
}

impl LinkArgs {
    pub fn address(&self) -> CliResult<LinkAddress> {
        let raw = self
            .link
            .clone()
            .or_else(|| std::env::var("SERIAL_PORT").ok())
            .ok_or_else(|| {
                CliError::new(
                    USAGE,
                    "no link given (pass LINK or set EDMO_LINK / SERIAL_PORT)",
                )
            })?;
        LinkAddress::parse(&raw).map_err(|err| transport_error("invalid link", err))
    }

    pub fn open(&self) -> CliResult<Link> {
        let address = self.address()?;
        let link = address
            .open(self.baud)
            .map_err(|err| transport_error("open link failed", err))?;
        info!(%address, baud = ?self.baud, "link open");
        Ok(link)
    }
}

/// A single command given on the command line.
#[derive(Subcommand, Debug, Clone)]
pub enum CommandArgs {
    /// Identify the host (random identifier unless --id is given).
    Identify {
        #[arg(long)]
        id: Option<String>,
    },
    /// Start a session (current time unless --timestamp is given).
    StartSession {
        #[arg(long)]
        timestamp: Option<u32>,
    },
    /// End the session.
    EndSession,
    /// Update one oscillator.
    Oscillator {
        index: u8,
        #[arg(allow_negative_numbers = true)]
        frequency: f32,
        #[arg(allow_negative_numbers = true)]
        amplitude: f32,
        #[arg(allow_negative_numbers = true)]
        offset: f32,
        #[arg(allow_negative_numbers = true)]
        phase_shift: f32,
    },
    /// Set one arm's angle.
    SetAngle {
        index: u8,
        #[arg(allow_negative_numbers = true)]
        angle: f32,
    },
}

impl CommandArgs {
    pub fn to_command(&self) -> CliResult<WireCommand> {
        Ok(match self {
            Self::Identify { id: Some(id) } => WireCommand::Identify {
                id: Identifier::parse(id).map_err(|err| proto_error("invalid --id", err))?,
            },
            Self::Identify { id: None } => WireCommand::Identify {
                id: Identifier::random(),
            },
            Self::StartSession { timestamp } => WireCommand::StartSession {
                timestamp: timestamp.unwrap_or_else(unix_timestamp),
            },
            Self::EndSession => WireCommand::EndSession,
            Self::Oscillator {
                index,
                frequency,
                amplitude,
                offset,
                phase_shift,
            } => WireCommand::OscillatorUpdate {
                index: *index,
                frequency: *frequency,
                amplitude: *amplitude,
                offset: *offset,
                phase_shift: *phase_shift,
            },
            Self::SetAngle { index, angle } => WireCommand::SetAngle {
                index: *index,
                angle: *angle,
            },
        })
    }
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(subcommand)]
    pub command: CommandArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub scan: ScanArgs,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read the capture from a file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Input is hex text (whitespace ignored) rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub command: CommandArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
