use thiserror::Error;

/// Errors surfaced to callers of the [`Client`](crate::Client) facade.
///
/// Each variant corresponds to one of the error kinds in the protocol
/// engine's external interface: transport-level connection problems, socket
/// writes, session/state problems, request correlation failures, and the
/// two receiver-driven operations (`LAUNCH`, `LOAD`) that can fail with a
/// receiver-supplied reason.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("request error: {0}")]
    Request(#[from] RequestError),

    #[error("launch error: {0}")]
    Launch(String),

    #[error("load error: {0}")]
    Load(String),
}

impl From<crate::channel::ChannelError> for Error {
    fn from(err: crate::channel::ChannelError) -> Self {
        Error::Session(err.to_string())
    }
}

/// Failure modes for a single outstanding request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request timed out")]
    Timeout,

    #[error("request was cancelled because the session disconnected")]
    Cancelled,

    #[error("failed to parse response: {0}")]
    Parse(String),
}
