//! Shared application state

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::pipeline::ResolutionPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Resolution pipeline (knowledge base, cache, and model client)
    pub pipeline: Arc<ResolutionPipeline>,
    /// When the server started, for the health endpoint
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new app state
    pub fn new(pipeline: ResolutionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            started_at: Utc::now(),
        }
    }
}
