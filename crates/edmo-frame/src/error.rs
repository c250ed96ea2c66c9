/// Errors that can occur while reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading from the link.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a frame to the link failed.
    #[error("failed to write frame for opcode {opcode}: {source}")]
    Write {
        opcode: u8,
        source: std::io::Error,
    },

    /// The link reached end of stream.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// The opcode whose frame failed to write, if this is a write failure.
    pub fn opcode(&self) -> Option<u8> {
        match self {
            Self::Write { opcode, .. } => Some(*opcode),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
