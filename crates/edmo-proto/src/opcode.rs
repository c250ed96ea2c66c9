use serde::Serialize;

/// Single-byte operation codes understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Opcode {
    /// Host identification, 16-byte identifier payload.
    Identify = 0,
    /// Begin a session, 4-byte timestamp payload.
    StartSession = 1,
    /// Oscillator parameters, index + four floats.
    OscillatorUpdate = 3,
    /// End the session, no payload.
    EndSession = 6,
    /// Set an arm angle, index + one float.
    SetAngle = 7,
    /// Periodic status record (controller to host only).
    Telemetry = 69,
}

impl Opcode {
    /// Look up a known opcode.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Identify),
            1 => Some(Self::StartSession),
            3 => Some(Self::OscillatorUpdate),
            6 => Some(Self::EndSession),
            7 => Some(Self::SetAngle),
            69 => Some(Self::Telemetry),
            _ => None,
        }
    }

    /// Wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether the host sends this opcode.
    pub fn is_outbound(self) -> bool {
        !matches!(self, Self::Telemetry)
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Identify => "IDENTIFY",
            Self::StartSession => "START_SESSION",
            Self::OscillatorUpdate => "OSCILLATOR_UPDATE",
            Self::EndSession => "END_SESSION",
            Self::SetAngle => "SET_ANGLE",
            Self::Telemetry => "TELEMETRY",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode.as_u8()
    }
}

/// Name for any wire value, known or not.
pub fn opcode_name(value: u8) -> &'static str {
    Opcode::from_u8(value).map_or("UNKNOWN", Opcode::name)
}
