use std::path::PathBuf;

use crate::error::{Result, TransportError};
use crate::link::Link;

/// Where a link lives.
///
/// `unix:/path/to.sock` selects a Unix domain socket; anything else is a
/// serial device path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAddress {
    /// Serial device file, e.g. `/dev/ttyUSB0`.
    Serial(PathBuf),
    /// Unix domain socket path.
    Unix(PathBuf),
}

impl LinkAddress {
    /// Parse a link address string.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(path) = input.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(TransportError::InvalidAddress(input.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if input.is_empty() {
            return Err(TransportError::InvalidAddress(input.to_string()));
        }
        Ok(Self::Serial(PathBuf::from(input)))
    }

    /// Open the link. `baud` only applies to serial devices.
    #[cfg(unix)]
    pub fn open(&self, baud: Option<u32>) -> Result<Link> {
        match self {
            Self::Serial(path) => match baud {
                Some(baud) => crate::serial::SerialDevice::open_with_baud(path, baud),
                None => crate::serial::SerialDevice::open(path),
            },
            Self::Unix(path) => crate::uds::UnixDomainSocket::connect(path),
        }
    }

    /// Open the link. Only plain device files are available on this platform.
    #[cfg(not(unix))]
    pub fn open(&self, baud: Option<u32>) -> Result<Link> {
        match self {
            Self::Serial(path) => {
                if let Some(baud) = baud {
                    return Err(TransportError::UnsupportedBaud(baud));
                }
                let file = std::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .map_err(|source| TransportError::Open {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Link::from_file(file))
            }
            Self::Unix(path) => Err(TransportError::Connect {
                path: path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix domain sockets are not available on this platform",
                ),
            }),
        }
    }
}

impl std::str::FromStr for LinkAddress {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for LinkAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial(path) => write!(f, "{}", path.display()),
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}
