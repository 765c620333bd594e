use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardpostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time zone offset: {0}")]
    InvalidZone(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GuardpostError>;
