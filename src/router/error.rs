use thiserror::Error;

/// Peer-facing failures the router converts into a `transfer-error`
/// message rather than a dropped connection. Distinct from an
/// implementation bug, which is logged at `error!` and still destroys the
/// transfer but is not attributed to peer behavior.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterFault {
    #[error("Target user not found")]
    TargetNotFound,

    #[error("Target user disconnected")]
    TargetDisconnected,

    #[error("invalid file descriptor")]
    InvalidDescriptor,

    #[error("transfer idle")]
    TransferIdle,
}

impl RouterFault {
    pub fn wire_message(self) -> &'static str {
        match self {
            RouterFault::TargetNotFound => "Target user not found",
            RouterFault::TargetDisconnected => "Target user disconnected",
            RouterFault::InvalidDescriptor => "invalid file descriptor",
            RouterFault::TransferIdle => "transfer idle",
        }
    }
}
