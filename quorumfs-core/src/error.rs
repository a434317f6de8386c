use thiserror::Error;

pub type Result<T> = std::result::Result<T, QfsError>;

#[derive(Error, Debug, Clone)]
pub enum QfsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("Not coordinator: received a forwarded call on a non-coordinator node")]
    NotCoordinator,

    #[error("Quorum unavailable: {0}")]
    QuorumUnavailable(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Client usage error: {0}")]
    ClientUsageError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for QfsError {
    fn from(err: std::io::Error) -> Self {
        QfsError::IoError(err.to_string())
    }
}
