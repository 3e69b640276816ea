use std::time::Duration;

use thiserror::Error;

/// Failures of a single connect attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Timeout while connecting (after {0:?})")]
    Timeout(Duration),

    #[error("Connection refused by {0}")]
    Refused(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl ConnectError {
    /// Classify an I/O error raised by `TcpStream::connect` against `addr`.
    pub(crate) fn from_io(err: std::io::Error, addr: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused => ConnectError::Refused(addr.to_string()),
            std::io::ErrorKind::InvalidInput => ConnectError::InvalidAddress(addr.to_string()),
            _ => ConnectError::Network(err.to_string()),
        }
    }
}

// Everything that can end a connection. None of it is fatal to the process.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Read failed: {0}")]
    ReadFailure(#[from] std::io::Error),

    #[error("Connection closed by peer")]
    GracefulClose,

    #[error("Reader task panicked or cancelled")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl LinkError {
    /// True when the peer went away on its own rather than through an I/O fault.
    pub fn is_graceful(&self) -> bool {
        matches!(self, LinkError::GracefulClose)
    }
}
