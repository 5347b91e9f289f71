use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while dispatching a gesture
///
/// None of these are fatal: every one is reported to the observer and the
/// capture component returns to idle.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "message")]
pub enum DispatchError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Dispatch cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DispatchError>;

impl From<std::io::Error> for DispatchError {
    fn from(e: std::io::Error) -> Self {
        DispatchError::Storage(e.to_string())
    }
}

impl From<tempfile::PersistError> for DispatchError {
    fn from(e: tempfile::PersistError) -> Self {
        DispatchError::Storage(e.error.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        DispatchError::Serialization(e.to_string())
    }
}

impl From<png::EncodingError> for DispatchError {
    fn from(e: png::EncodingError) -> Self {
        DispatchError::Render(e.to_string())
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DispatchError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            DispatchError::Transport(format!("host unreachable: {}", e))
        } else {
            DispatchError::Transport(e.to_string())
        }
    }
}
