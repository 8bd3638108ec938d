use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Run context is not initialized; start the run before dispatching events")]
    UninitializedContext,

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Failure to get a document accepted by the sink.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),

    #[error("Failed to serialize document: {0}")]
    Serialize(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        DeliveryError::Serialize(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
