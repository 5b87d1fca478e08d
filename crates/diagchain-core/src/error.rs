//! Error taxonomy for the model-invocation seam.
//!
//! The pipeline itself has no fatal error path: every [`InvokeError`] raised
//! while running a stage is absorbed into that stage's
//! [`StageResponse::Failed`](crate::invoker::StageResponse::Failed) marker.

/// Errors produced by a [`ModelInvoker`](crate::invoker::ModelInvoker).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("model {model} is not available")]
    ModelUnavailable { model: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl From<serde_json::Error> for InvokeError {
    fn from(err: serde_json::Error) -> Self {
        InvokeError::InvalidResponse(err.to_string())
    }
}

/// Result type for model invocations.
pub type InvokeResult<T> = std::result::Result<T, InvokeError>;
