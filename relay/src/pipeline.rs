//! Answer resolution pipeline
//!
//! Resolves the latest user turn in strict priority order:
//! 1. Validate the conversation
//! 2. Exact-match knowledge base
//! 3. Normalized response cache (curated table, then LRU)
//! 4. Remote completion, followed by post-processing
//!
//! Knowledge base and cache answers are returned verbatim. Only model output
//! is post-processed, timed, and recorded in the cache.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::cache::{CacheLayer, ResponseCache};
use crate::config::DEFAULT_SYSTEM_PROMPT;
use crate::error::{RelayError, RelayResult};
use crate::knowledge::KnowledgeBase;
use crate::llm::{CompletionClient, CompletionOptions, Message, Role};
use crate::postprocess::{PostProcessor, TextTransform};

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    KnowledgeBase,
    Curated,
    Cache,
    Model,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::KnowledgeBase => "knowledge_base",
            ReplySource::Curated => "curated",
            ReplySource::Cache => "cache",
            ReplySource::Model => "model",
        }
    }
}

/// The reply handed back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ReplyEnvelope {
    pub content: String,
    /// Seconds spent on the remote call and post-processing; model replies only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(skip)]
    pub source: ReplySource,
}

impl ReplyEnvelope {
    fn verbatim(content: impl Into<String>, source: ReplySource) -> Self {
        Self {
            content: content.into(),
            processing_time: None,
            source,
        }
    }
}

/// Prepend `prompt` as a system message unless the conversation already has one.
pub fn ensure_system_prompt(conversation: &[Message], prompt: &str) -> Vec<Message> {
    if conversation.iter().any(|m| m.role == Role::System) {
        return conversation.to_vec();
    }

    let mut enriched = Vec::with_capacity(conversation.len() + 1);
    enriched.push(Message::system(prompt));
    enriched.extend_from_slice(conversation);
    enriched
}

/// Orchestrates knowledge base, cache, model, and post-processor
pub struct ResolutionPipeline {
    knowledge: Arc<KnowledgeBase>,
    cache: Arc<ResponseCache>,
    client: Arc<dyn CompletionClient>,
    post: Box<dyn TextTransform>,
    options: CompletionOptions,
    system_prompt: String,
}

impl ResolutionPipeline {
    /// Create a pipeline with an empty knowledge base, a default cache, and the
    /// default post-processor
    pub fn new(client: Arc<dyn CompletionClient>, options: CompletionOptions) -> Self {
        Self {
            knowledge: Arc::new(KnowledgeBase::empty()),
            cache: Arc::new(ResponseCache::default()),
            client,
            post: Box::new(PostProcessor::default()),
            options,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_knowledge(mut self, knowledge: Arc<KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_post_processor(mut self, post: impl TextTransform + 'static) -> Self {
        self.post = Box::new(post);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }

    /// Resolve a reply for the conversation
    pub async fn resolve(&self, conversation: &[Message]) -> RelayResult<ReplyEnvelope> {
        let last = conversation
            .last()
            .ok_or_else(|| RelayError::BadRequest("Missing or invalid 'messages' list.".into()))?;

        // Lookups only apply when the caller is waiting on a user turn.
        let question = (last.role == Role::User).then_some(last.content.as_str());

        if let Some(question) = question {
            if let Some(answer) = self.knowledge.lookup(question) {
                tracing::info!("Answered from knowledge base");
                return Ok(ReplyEnvelope::verbatim(answer, ReplySource::KnowledgeBase));
            }

            if let Some(hit) = self.cache.lookup(question) {
                let source = match hit.layer {
                    CacheLayer::Curated => ReplySource::Curated,
                    CacheLayer::Memo => ReplySource::Cache,
                };
                tracing::info!("Answered from {}", source.as_str());
                return Ok(ReplyEnvelope::verbatim(hit.answer, source));
            }
            tracing::debug!("Knowledge base and cache miss");
        }

        let enriched = ensure_system_prompt(conversation, &self.system_prompt);

        let started = Instant::now();
        let raw = self
            .client
            .complete(&enriched, &self.options)
            .await
            .map_err(|e| {
                tracing::warn!("Completion failed: {}", e);
                RelayError::from(e)
            })?;
        let content = self.post.transform(&raw);
        let elapsed = started.elapsed().as_secs_f64();

        if let Some(question) = question {
            self.cache.record(question, &content);
        }

        tracing::info!(
            "Answered from model {} in {:.2}s ({} messages)",
            self.client.model(),
            elapsed,
            enriched.len()
        );

        Ok(ReplyEnvelope {
            content,
            processing_time: Some(elapsed),
            source: ReplySource::Model,
        })
    }
}
