//! Ollama HTTP client
//!
//! Implements [`ModelInvoker`] on top of Ollama's `/api/generate` endpoint so
//! the diagnosis pipeline can run its stages against locally pulled models.

use std::time::Duration;

use async_trait::async_trait;
use diagchain_core::{InvokeResult, ModelInvoker};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::OllamaConfig;
use crate::error::OllamaError;
use crate::Result;

/// Body of a non-streaming generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Ollama client for model generation
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("diagchain-ollama/", env!("CARGO_PKG_VERSION")));
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| OllamaError::Config(e.to_string()))?;

        Ok(OllamaClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Run one non-streaming generation and return the raw response body
    pub async fn generate_raw(&self, model: &str, prompt: &str) -> Result<Value> {
        let url = self.config.endpoint("/api/generate");
        debug!(model = %model, url = %url, "Sending generate request");

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            keep_alive: self.config.keep_alive.as_deref(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if status == reqwest::StatusCode::NOT_FOUND && body.contains("not found") {
            return Err(OllamaError::ModelNotFound(model.to_string()));
        }
        if !status.is_success() {
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Names of the models pulled on the server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.config.endpoint("/api/tags");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check whether the server answers at all
    pub async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(models) => {
                info!(server = %self.config.base_url, models = models.len(), "Ollama reachable");
                true
            }
            Err(e) => {
                debug!(server = %self.config.base_url, error = %e, "Ollama unreachable");
                false
            }
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> OllamaError {
        if err.is_timeout() {
            OllamaError::Timeout(self.config.request_timeout_secs)
        } else {
            OllamaError::from(err)
        }
    }
}

#[async_trait]
impl ModelInvoker for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> InvokeResult<Value> {
        Ok(self.generate_raw(model, prompt).await?)
    }
}
