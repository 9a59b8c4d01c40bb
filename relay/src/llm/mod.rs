//! LLM abstraction layer

mod ollama;

pub use ollama::OllamaClient;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Sampling options sent with every completion request.
///
/// These are fixed per deployment and come from the `[llm]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Generation stops early at any of these sequences
    pub stop: Vec<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: crate::config::default_model(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 800,
            stop: crate::config::default_stop_sequences(),
        }
    }
}

/// Failures of a remote completion call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// The backend could not be reached at all
    #[error("model backend unreachable: {0}")]
    Connection(String),

    /// The backend did not answer before the deadline
    #[error("model backend timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered, but with an error status or an unusable payload
    #[error("model backend error: {0}")]
    Upstream(String),
}

/// Trait for completion backends
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete the full conversation and return the raw model text.
    ///
    /// An empty (whitespace-only) completion is reported as
    /// [`CompletionError::Upstream`], never as an empty `Ok`.
    async fn complete(
        &self,
        conversation: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;

    /// Get the model name
    fn model(&self) -> &str;
}
