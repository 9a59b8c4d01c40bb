//! REST API handlers

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::state::AppState;
use crate::cache::CacheStats;
use crate::error::{RelayError, RelayResult};
use crate::llm::Message;
use crate::pipeline::ReplyEnvelope;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Chat request body. `messages` is kept loose so that a missing, null, or
/// non-list value can be reported as a 400 instead of a decode failure.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<serde_json::Value>,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: ReplyEnvelope,
}

fn invalid_messages() -> RelayError {
    RelayError::BadRequest("Missing or invalid 'messages' list.".to_string())
}

/// Decode and validate the `messages` list of a chat request body
pub fn parse_messages(body: &[u8]) -> RelayResult<Vec<Message>> {
    let request: ChatRequest = serde_json::from_slice(body).map_err(|_| invalid_messages())?;

    let items = match request.messages {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(invalid_messages()),
    };

    items
        .into_iter()
        .map(serde_json::from_value::<Message>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RelayError::BadRequest(format!("Invalid message in 'messages': {}", e)))
}

/// Resolve a reply for the posted conversation
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatResponse>, RelayError> {
    let messages = parse_messages(&body).map_err(|e| {
        tracing::warn!("Rejected chat request: {}", e);
        e
    })?;

    let span = tracing::info_span!(
        "chat",
        request_id = %uuid::Uuid::new_v4(),
        messages = messages.len()
    );

    // Run on its own task so a panic inside the pipeline becomes a 500.
    let pipeline = state.pipeline.clone();
    let reply = tokio::spawn(async move { pipeline.resolve(&messages).await }.instrument(span))
        .await
        .map_err(|e| {
            tracing::error!("Chat pipeline task failed: {}", e);
            RelayError::Internal(e.to_string())
        })??;

    Ok(Json(ChatResponse { reply }))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub knowledge_entries: usize,
    pub cache: CacheStats,
    pub uptime_secs: i64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    Json(HealthResponse {
        status: "ok".to_string(),
        model: pipeline.model().to_string(),
        knowledge_entries: pipeline.knowledge().len(),
        cache: pipeline.cache().stats(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_parse_valid_messages() {
        let body = br#"{"messages": [{"role": "system", "content": "s"}, {"role": "user", "content": "hi"}]}"#;
        let messages = parse_messages(body).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_parse_rejects_missing_null_and_non_list() {
        let bodies: [&[u8]; 7] = [
            br#"{}"#,
            br#"{"messages": null}"#,
            br#"{"messages": "hello"}"#,
            br#"{"messages": {"role": "user"}}"#,
            br#"{"messages": []}"#,
            br#"not json"#,
            b"",
        ];
        for body in bodies {
            let err = parse_messages(body).unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let body = br#"{"messages": [{"role": "tool", "content": "x"}]}"#;
        assert!(matches!(
            parse_messages(body),
            Err(RelayError::BadRequest(_))
        ));
    }
}
