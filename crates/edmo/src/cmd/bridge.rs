use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use edmo_proto::Event;
use edmo_session::{
    unix_timestamp, Commander, Result as SessionResult, ScanOutcome, Session, SessionConfig,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::cmd::BridgeArgs;
use crate::exit::{
    session_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, TRANSPORT_ERROR,
};
use crate::output::{print_event, OutputFormat};

const IDLE_POLL: Duration = Duration::from_millis(200);

/// One line of the bridge's stdin protocol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Identify {
        id: String,
    },
    /// Omitting `timestamp` uses the current time.
    StartSession {
        timestamp: Option<u32>,
    },
    EndSession,
    Oscillator {
        index: u8,
        frequency: f32,
        amplitude: f32,
        offset: f32,
        phase_shift: f32,
    },
    SetAngle {
        index: u8,
        angle: f32,
    },
}

impl ControlMessage {
    pub fn apply<W: Write>(&self, commander: &mut Commander<W>) -> SessionResult<()> {
        match self {
            Self::Identify { id } => commander.identify_str(id).map(|_| ()),
            Self::StartSession { timestamp } => {
                commander.start_session(timestamp.unwrap_or_else(unix_timestamp))
            }
            Self::EndSession => commander.end_session(),
            Self::Oscillator {
                index,
                frequency,
                amplitude,
                offset,
                phase_shift,
            } => commander.update_oscillator(*index, *frequency, *amplitude, *offset, *phase_shift),
            Self::SetAngle { index, angle } => commander.set_angle(*index, *angle),
        }
    }
}

enum Input {
    Line(String),
    Eof,
    Interrupt,
}

pub fn run(args: BridgeArgs, format: OutputFormat) -> CliResult<i32> {
    let link = args.link.open()?;
    let config = SessionConfig {
        frame: args.scan.frame_config(),
        ..SessionConfig::default()
    };

    let mut session = Session::start(link, config, move |event: Event| {
        print_event(&event, format)
    })
    .map_err(|err| session_error("session start failed", err))?;
    if !session.startup().is_clean() {
        warn!("handshake incomplete, continuing");
    }

    let (tx, rx) = mpsc::channel();
    install_ctrlc_handler(tx.clone())?;
    spawn_stdin_reader(tx)?;

    loop {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(Input::Line(line)) => handle_line(&mut session, &line),
            Ok(Input::Eof) => {
                info!("control input closed");
                break;
            }
            Ok(Input::Interrupt) => {
                info!("interrupted");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if session.is_scan_finished() {
                    warn!("link no longer readable");
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let report = session.shutdown();
    match report.scan {
        Some(ScanOutcome::Failed(err)) => Err(CliError::new(
            TRANSPORT_ERROR,
            format!("link read failed: {err}"),
        )),
        Some(ScanOutcome::Panicked) => Err(CliError::new(INTERNAL, "scan thread panicked")),
        Some(ScanOutcome::Closed) | None if report.end_session.is_some() => Ok(FAILURE),
        Some(ScanOutcome::Closed) | None => Ok(SUCCESS),
    }
}

fn handle_line(session: &mut Session, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let message = match serde_json::from_str::<ControlMessage>(line) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "ignoring malformed control message");
            return;
        }
    };

    debug!(?message, "control message");
    if let Err(err) = message.apply(session.commander()) {
        error!(error = %err, "command failed");
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<Input>) -> CliResult<()> {
    thread::Builder::new()
        .name("edmo-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(Input::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "stdin read failed");
                        break;
                    }
                }
            }
            let _ = tx.send(Input::Eof);
        })
        .map(|_| ())
        .map_err(|err| CliError::new(INTERNAL, format!("failed to spawn stdin reader: {err}")))
}

fn install_ctrlc_handler(tx: mpsc::Sender<Input>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        let _ = tx.send(Input::Interrupt);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
