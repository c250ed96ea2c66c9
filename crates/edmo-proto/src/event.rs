use bytes::Bytes;
use serde::{Serialize, Serializer};
use tracing::{debug, trace, warn};

use crate::opcode::{opcode_name, Opcode};
use crate::telemetry::TelemetryRecord;

/// Something the controller told us.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A decoded telemetry record.
    Telemetry(TelemetryRecord),

    /// A known opcode whose payload is too short to decode.
    PayloadTooShort {
        opcode: u8,
        #[serde(serialize_with = "as_hex")]
        raw: Bytes,
    },

    /// An opcode the host does not handle inbound.
    Unrecognized { opcode: u8, payload_len: usize },
}

impl Event {
    /// Opcode that produced this event.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Telemetry(_) => Opcode::Telemetry.as_u8(),
            Self::PayloadTooShort { opcode, .. } | Self::Unrecognized { opcode, .. } => *opcode,
        }
    }

    /// Short label for table and log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Telemetry(_) => "telemetry",
            Self::PayloadTooShort { .. } => "payload_too_short",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Decode one unescaped frame body (opcode first).
///
/// Returns `None` for an empty body. Never fails: malformed payloads and
/// unknown opcodes become events of their own.
pub fn decode_event(body: &[u8]) -> Option<Event> {
    let Some((&opcode, payload)) = body.split_first() else {
        trace!("empty frame body ignored");
        return None;
    };

    let event = match Opcode::from_u8(opcode) {
        Some(Opcode::Telemetry) => match TelemetryRecord::decode(payload) {
            Ok(record) => {
                debug!(
                    timestamp = record.timestamp,
                    complete = record.complete,
                    oscillators = ?record.oscillators,
                    imu = ?record.imu,
                    "telemetry"
                );
                Event::Telemetry(record)
            }
            Err(err) => {
                warn!(opcode, len = payload.len(), error = %err, "telemetry payload rejected");
                Event::PayloadTooShort {
                    opcode,
                    raw: Bytes::copy_from_slice(payload),
                }
            }
        },
        known => {
            if known.is_some_and(Opcode::is_outbound) {
                warn!(
                    opcode,
                    name = opcode_name(opcode),
                    len = payload.len(),
                    "host-only opcode received from controller"
                );
            } else {
                warn!(opcode, len = payload.len(), "unrecognized inbound opcode");
            }
            Event::Unrecognized {
                opcode,
                payload_len: payload.len(),
            }
        }
    };

    Some(event)
}

fn as_hex<S: Serializer>(raw: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(raw))
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::telemetry::TELEMETRY_RECORD_LEN;

    #[test]
    fn empty_body_is_ignored() {
        assert_eq!(decode_event(&[]), None);
    }

    #[test]
    fn short_telemetry_keeps_raw_payload() {
        let mut body = vec![69u8];
        body.extend_from_slice(&[1; 11]);

        let event = decode_event(&body).unwrap();
        assert_eq!(
            event,
            Event::PayloadTooShort {
                opcode: 69,
                raw: Bytes::from_static(&[1; 11]),
            }
        );
        assert_eq!(event.kind(), "payload_too_short");
    }

    #[test]
    fn full_telemetry_decodes() {
        let record = TelemetryRecord {
            timestamp: 1000,
            complete: true,
            ..Default::default()
        };
        let mut body = BytesMut::from(&[69u8][..]);
        record.encode(&mut body);
        assert_eq!(body.len(), 1 + TELEMETRY_RECORD_LEN);

        let event = decode_event(&body).unwrap();
        assert_eq!(event, Event::Telemetry(record));
        assert_eq!(event.opcode(), 69);
    }

    #[test]
    fn outbound_opcode_inbound_is_unrecognized() {
        assert_eq!(
            decode_event(&[7, 2, 0, 0, 0xB4, 0x42]),
            Some(Event::Unrecognized {
                opcode: 7,
                payload_len: 5
            })
        );
        assert_eq!(
            decode_event(&[200]),
            Some(Event::Unrecognized {
                opcode: 200,
                payload_len: 0
            })
        );
    }

    #[test]
    fn json_shape_is_tagged() {
        let json = serde_json::to_value(Event::PayloadTooShort {
            opcode: 69,
            raw: Bytes::from_static(b"\x01\xff"),
        })
        .unwrap();
        assert_eq!(json["event"], "payload_too_short");
        assert_eq!(json["raw"], "01ff");

        let json = serde_json::to_value(Event::Telemetry(TelemetryRecord::default())).unwrap();
        assert_eq!(json["event"], "telemetry");
        assert_eq!(json["timestamp"], 0);
    }
}
