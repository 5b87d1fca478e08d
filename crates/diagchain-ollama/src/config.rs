//! Ollama client configuration.

use serde::{Deserialize, Serialize};

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default per-request timeout. Local 7B models can take minutes on CPU.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Ollama configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server base URL, without a trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds (0 disables it)
    pub request_timeout_secs: u64,
    /// How long the server keeps a model loaded after a call (e.g. "5m")
    pub keep_alive: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            base_url: normalize_url(
                &std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ),
            request_timeout_secs: std::env::var("DIAGCHAIN_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            keep_alive: std::env::var("DIAGCHAIN_KEEP_ALIVE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

impl OllamaConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server
    pub fn new(base_url: &str) -> Self {
        OllamaConfig {
            base_url: normalize_url(base_url),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            keep_alive: None,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the keep-alive hint sent with each request
    pub fn with_keep_alive(mut self, keep_alive: &str) -> Self {
        self.keep_alive = Some(keep_alive.to_string());
        self
    }

    /// Full URL for an API path such as `/api/generate`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Accept `host:port` as well as full URLs, and drop trailing slashes.
fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
