use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message exceeds max size of {limit} bytes (was {actual})")]
    TooLarge { limit: usize, actual: usize },

    #[error("chunk payload is not valid base64")]
    InvalidChunkEncoding,
}

pub type CodecResult<T> = Result<T, CodecError>;
