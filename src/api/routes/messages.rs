//! Message Routes
//!
//! Sending and listing chat messages. Live delivery happens over the
//! WebSocket endpoint; these routes cover the durable side.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ListMessagesParams, SendMessageRequest};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::chat::Message;

/// POST /api/v1/messages
///
/// Persists the message and broadcasts it to live subscribers. The response
/// carries the server-assigned id and timestamp.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = state
        .chat
        .send_message(&request.content, &request.nickname)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/v1/messages?limit=N
///
/// Bounded tail fetch in ascending creation order, default 50.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMessagesParams>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state.chat.recent_messages(params.limit).await?;
    Ok(Json(messages))
}
