//! diagchain-ollama: model invocation over a local Ollama server
//!
//! Provides [`OllamaClient`], the production [`ModelInvoker`] for the
//! diagchain pipeline, and [`OllamaConfig`] for pointing it at a server.
//!
//! [`ModelInvoker`]: diagchain_core::ModelInvoker

pub mod client;
pub mod config;
pub mod error;

pub use client::OllamaClient;
pub use config::{OllamaConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::OllamaError;

/// Result type for Ollama operations
pub type Result<T> = std::result::Result<T, OllamaError>;
