//! Chat relay backend
//!
//! Answers the latest user turn of a conversation from a curated knowledge
//! base, then a normalized response cache, and only falls back to a remote
//! language model when both miss.

pub mod cache;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod pipeline;
pub mod postprocess;

#[cfg(feature = "web")]
pub mod web;

pub use error::RelayError;
pub use pipeline::{ReplyEnvelope, ReplySource, ResolutionPipeline};
