//! Error types for diagchain-ollama

use diagchain_core::InvokeError;
use thiserror::Error;

/// Errors that can occur while talking to an Ollama server
#[derive(Error, Debug)]
pub enum OllamaError {
    /// Invalid client configuration
    #[error("Invalid Ollama configuration: {0}")]
    Config(String),

    /// HTTP transport failure (connect, send, read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Server answered with a non-success status
    #[error("Ollama returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Requested model is not pulled on the server
    #[error("Model not found on server: {0}")]
    ModelNotFound(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for OllamaError {
    fn from(err: reqwest::Error) -> Self {
        OllamaError::Http(err.to_string())
    }
}

impl From<OllamaError> for InvokeError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Timeout(secs) => InvokeError::Timeout { secs },
            OllamaError::ModelNotFound(model) => InvokeError::ModelUnavailable { model },
            OllamaError::Json(e) => InvokeError::InvalidResponse(e.to_string()),
            other => InvokeError::Transport(other.to_string()),
        }
    }
}
