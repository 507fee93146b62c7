use thiserror::Error;

/// Unified error type for the honeypot.
#[derive(Error, Debug)]
pub enum HoneypotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Decoy page error: {0}")]
    DecoyPage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<figment::Error> for HoneypotError {
    fn from(e: figment::Error) -> Self {
        HoneypotError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HoneypotError>;
