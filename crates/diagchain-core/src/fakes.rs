//! In-memory model service (testing only).
//!
//! `StubInvoker` satisfies the [`ModelInvoker`] contract without any network:
//! responses are fixed per model, chosen models can be made to fail, and every
//! call is recorded so tests can inspect the prompts the pipeline built.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{InvokeError, InvokeResult};
use crate::invoker::ModelInvoker;

/// Deterministic stand-in for a model-invocation service.
#[derive(Debug, Default)]
pub struct StubInvoker {
    responses: HashMap<String, Value>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls to `model` with `{"model": model, "response": text}`.
    pub fn with_response(mut self, model: &str, text: &str) -> Self {
        self.responses.insert(
            model.to_string(),
            json!({ "model": model, "response": text }),
        );
        self
    }

    /// Answer calls to `model` with an arbitrary raw value.
    pub fn with_raw_response(mut self, model: &str, body: Value) -> Self {
        self.responses.insert(model.to_string(), body);
        self
    }

    /// Make every call to `model` fail with a transport error.
    pub fn failing(mut self, model: &str) -> Self {
        self.failing.insert(model.to_string());
        self
    }

    /// Recorded `(model, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelInvoker for StubInvoker {
    async fn generate(&self, model: &str, prompt: &str) -> InvokeResult<Value> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((model.to_string(), prompt.to_string()));

        if self.failing.contains(model) {
            return Err(InvokeError::Transport(format!(
                "stub refused connection for {model}"
            )));
        }

        Ok(self
            .responses
            .get(model)
            .cloned()
            .unwrap_or_else(|| json!({ "model": model, "response": format!("{model} ok") })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_default_response() {
        let stub = StubInvoker::new();
        let body = stub.generate("falcon:7b", "hi").await.unwrap();
        assert_eq!(body["response"], "falcon:7b ok");
        assert_eq!(stub.calls(), vec![("falcon:7b".to_string(), "hi".to_string())]);
    }

    #[tokio::test]
    async fn test_stub_failing_model() {
        let stub = StubInvoker::new().failing("mistral:7b");
        let err = stub.generate("mistral:7b", "hi").await.unwrap_err();
        assert!(matches!(err, InvokeError::Transport(_)));
        assert_eq!(stub.calls().len(), 1);
    }
}
