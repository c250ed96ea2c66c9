use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{ProtoError, Result};

/// 16-byte host identifier sent with `Identify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier([u8; 16]);

impl Identifier {
    /// Generate a fresh random (v4 UUID) identifier.
    pub fn random() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    /// Use raw identifier bytes as-is.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parse a UUID string (hyphenated, simple, braced or URN form).
    pub fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input)
            .map(|uuid| Self(*uuid.as_bytes()))
            .map_err(|source| ProtoError::InvalidIdentifier {
                input: input.to_string(),
                source,
            })
    }

    /// Raw bytes in wire order.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0).hyphenated())
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
