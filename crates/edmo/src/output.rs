use std::io::{IsTerminal, Write};

use bytes::BytesMut;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use edmo_proto::{Command, Event, TelemetryRecord};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Print one inbound event.
///
/// `raw` writes the event's payload bytes: the re-encoded 188-byte record
/// for telemetry, the received bytes for a short payload, nothing otherwise.
pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "OPCODE", "DETAIL"])
                .add_row(vec![
                    event.kind().to_string(),
                    event.opcode().to_string(),
                    event_detail(event),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{} {}", event.kind(), event_detail(event)),
        OutputFormat::Raw => match event {
            Event::Telemetry(record) => {
                let mut payload = BytesMut::new();
                record.encode(&mut payload);
                print_raw(&payload);
            }
            Event::PayloadTooShort { raw, .. } => print_raw(raw),
            Event::Unrecognized { .. } => {}
        },
    }
}

fn event_detail(event: &Event) -> String {
    match event {
        Event::Telemetry(record) => telemetry_summary(record),
        Event::PayloadTooShort { raw, .. } => {
            format!("len={} raw={}", raw.len(), hex::encode(raw))
        }
        Event::Unrecognized {
            opcode,
            payload_len,
        } => format!(
            "name={} len={payload_len}",
            edmo_proto::opcode::opcode_name(*opcode)
        ),
    }
}

fn telemetry_summary(record: &TelemetryRecord) -> String {
    let phases: Vec<String> = record
        .oscillators
        .iter()
        .map(|osc| format!("{:.3}", osc.phase))
        .collect();
    let q = record.imu.rotation;
    format!(
        "t={} phases=[{}] rotation=({:.3},{:.3},{:.3},{:.3}){}",
        record.timestamp,
        phases.join(","),
        q.x,
        q.y,
        q.z,
        q.w,
        if record.complete { "" } else { " partial" }
    )
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    opcode: u8,
    name: &'a str,
    payload: String,
    frame: String,
    frame_size: usize,
}

/// Print an outbound command and its framed wire bytes.
pub fn print_frame(command: &Command, wire: &[u8], format: OutputFormat) {
    let opcode = command.opcode();
    let payload = hex::encode(command.to_payload());
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                opcode: opcode.as_u8(),
                name: opcode.name(),
                payload,
                frame: hex::encode(wire),
                frame_size: wire.len(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPCODE", "NAME", "PAYLOAD", "FRAME"])
                .add_row(vec![
                    opcode.as_u8().to_string(),
                    opcode.name().to_string(),
                    payload,
                    hex::encode(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "{} ({}) payload={} frame={}",
            opcode.name(),
            opcode.as_u8(),
            payload,
            hex::encode(wire)
        ),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
