/// Errors raised while building or decoding payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The identifier string is not a valid UUID.
    #[error("invalid identifier {input:?}: {source}")]
    InvalidIdentifier {
        input: String,
        source: uuid::Error,
    },

    /// The payload is too short to hold the fields being decoded.
    #[error("payload too short ({len} bytes, need at least {min})")]
    PayloadTooShort { len: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
