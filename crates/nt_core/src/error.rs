use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The service could not be reached, timed out, or rejected the credential.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered but reported an error.
    #[error("Service error: {0}")]
    Service(String),

    /// The response did not match the requested structured shape.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Failures that the gateway absorbs within its attempt budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Service(_) | Self::Validation(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            Error::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Error::Service(format!("Malformed service response: {}", err))
        } else {
            Error::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
