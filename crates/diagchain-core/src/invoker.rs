//! The model-invocation seam.
//!
//! The pipeline never talks to an inference backend directly. It calls a
//! [`ModelInvoker`], which production code wires to a real service and tests
//! replace with [`StubInvoker`](crate::fakes::StubInvoker).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InvokeResult;

/// External capability that runs a prompt against a named inference model.
///
/// The returned value is opaque to the engine. Most backends answer with an
/// object carrying a `response` text field; see [`extract_response_text`].
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> InvokeResult<Value>;
}

/// Outcome of one stage's model call.
///
/// A failed call is captured here instead of aborting the pipeline, so
/// consumers can tell the two apart without probing the response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResponse {
    Success { body: Value },
    Failed { model: String, error: String },
}

impl StageResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, StageResponse::Success { .. })
    }

    /// The error marker for a failed call: `{"error": .., "model": ..}`.
    pub fn error_marker(&self) -> Option<Value> {
        match self {
            StageResponse::Success { .. } => None,
            StageResponse::Failed { model, error } => Some(serde_json::json!({
                "error": error,
                "model": model,
            })),
        }
    }

    /// Text form of the response, as folded into context and prompts.
    pub fn text(&self) -> String {
        match self {
            StageResponse::Success { body } => extract_response_text(body),
            StageResponse::Failed { .. } => self
                .error_marker()
                .map(|marker| marker.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Text of a raw model response.
///
/// Uses the `response` field when the value is an object that has one,
/// otherwise the JSON serialization of the whole value.
pub fn extract_response_text(body: &Value) -> String {
    match body.get("response") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_response_field() {
        let body = json!({ "model": "falcon:7b", "response": "fix line 3" });
        assert_eq!(extract_response_text(&body), "fix line 3");
    }

    #[test]
    fn test_extract_non_string_response_field() {
        let body = json!({ "response": { "steps": [1, 2] } });
        assert_eq!(extract_response_text(&body), r#"{"steps":[1,2]}"#);
    }

    #[test]
    fn test_extract_without_response_field_serializes_whole_value() {
        let body = json!({ "answer": 42 });
        assert_eq!(extract_response_text(&body), r#"{"answer":42}"#);

        let body = json!("plain");
        assert_eq!(extract_response_text(&body), "\"plain\"");
    }

    #[test]
    fn test_failed_response_text_is_error_marker() {
        let response = StageResponse::Failed {
            model: "mistral:7b".to_string(),
            error: "connection refused".to_string(),
        };
        assert!(!response.is_success());

        let marker: Value = serde_json::from_str(&response.text()).unwrap();
        assert_eq!(marker["model"], "mistral:7b");
        assert_eq!(marker["error"], "connection refused");
    }

    #[test]
    fn test_stage_response_is_tagged() {
        let response = StageResponse::Success {
            body: json!({ "response": "ok" }),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["body"]["response"], "ok");
        assert!(response.error_marker().is_none());
    }
}
