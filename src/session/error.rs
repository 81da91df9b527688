use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session already registered: {0}")]
    DuplicateSession(String),

    #[error("session not found: {0}")]
    NotFound(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
