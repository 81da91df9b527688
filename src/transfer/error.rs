use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("transfer not found")]
    NotFound,

    #[error("transfer already exists")]
    AlreadyExists,

    #[error("invalid file descriptor: total chunks must be greater than zero")]
    InvalidDescriptor,

    #[error("chunk index {index} out of range for total chunks {total}")]
    ChunkIndexOutOfRange { index: u32, total: u32 },
}

pub type TransferResult<T> = Result<T, TransferError>;
