//! Guest Routes
//!
//! Guest registration and removal. A guest is an ephemeral nickname claim
//! bound to a session token; removal is idempotent.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateGuestRequest, GuestResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/guests
///
/// Claims a nickname and creates a session. A taken nickname is granted
/// with the smallest free numeric suffix instead of failing.
pub async fn create_guest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGuestRequest>,
) -> ApiResult<(StatusCode, Json<GuestResponse>)> {
    let session = state.registry.register(&request.nickname).await?;

    Ok((
        StatusCode::CREATED,
        Json(GuestResponse {
            nickname: session.nickname,
            session_id: session.session_id,
        }),
    ))
}

/// DELETE /api/v1/guests/:session_id
///
/// Releases the session and frees its nickname. Unknown session ids
/// return 204 as well - release is a no-op for them.
pub async fn remove_guest(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.release(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
