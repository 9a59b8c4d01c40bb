//! Ollama completion backend
//!
//! Talks to `/api/chat` over plain HTTP with `stream: false`, so a single
//! deadline covers the whole exchange.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionError, CompletionOptions, Message};

/// Chat request body for the Ollama API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: SamplingOptions<'a>,
}

#[derive(Debug, Serialize)]
struct SamplingOptions<'a> {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    stop: &'a [String],
}

/// Response from the Ollama chat endpoint
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Error body Ollama sends with non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Ollama client wrapper
pub struct OllamaClient {
    endpoint: url::Url,
    http: reqwest::Client,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let mut base = url::Url::parse(base_url)
            .with_context(|| format!("Invalid model backend URL: {}", base_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("api/chat")?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint,
            http,
            model: model.to_string(),
            timeout,
        })
    }

    /// Full URL of the chat endpoint
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn send(
        &self,
        conversation: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &options.model,
            messages: conversation,
            stream: false,
            options: SamplingOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                num_predict: options.max_tokens,
                stop: &options.stop,
            },
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_err(e))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_err(e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&raw_body)
                .map(|b| b.error)
                .unwrap_or(raw_body);
            return Err(CompletionError::Upstream(format!("{} - {}", status, detail)));
        }

        let body: ChatResponse = serde_json::from_str(&raw_body)
            .map_err(|e| CompletionError::Upstream(format!("malformed response: {}", e)))?;

        if body.message.content.trim().is_empty() {
            return Err(CompletionError::Upstream("empty completion".to_string()));
        }

        Ok(body.message.content)
    }

    fn map_reqwest_err(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(self.timeout)
        } else if e.is_connect() {
            CompletionError::Connection(e.to_string())
        } else {
            CompletionError::Upstream(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(
        &self,
        conversation: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        tracing::debug!(
            "Sending {} messages to {} (model {})",
            conversation.len(),
            self.endpoint,
            options.model
        );

        // Hard deadline on top of the client timeout; the body read is covered too.
        match tokio::time::timeout(self.timeout, self.send(conversation, options)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.timeout)),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
