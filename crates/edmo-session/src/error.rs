/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Link could not be opened or cloned.
    #[error("transport error: {0}")]
    Transport(#[from] edmo_transport::TransportError),

    /// Frame could not be written or read.
    #[error("frame error: {0}")]
    Frame(#[from] edmo_frame::FrameError),

    /// Command parameters were rejected before encoding.
    #[error("protocol error: {0}")]
    Proto(#[from] edmo_proto::ProtoError),

    /// A worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
