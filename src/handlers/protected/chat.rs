use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Serialize;

use crate::chat::{ChatMessage, ChatRequest};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ChatHistory {
    results: usize,
    history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    reply: ChatMessage,
    history: Vec<ChatMessage>,
}

/// GET /api/v1/chat - The caller's conversation so far
pub async fn history(State(state): State<AppState>, Extension(current): Extension<CurrentUser>) -> ApiResponse<ChatHistory> {
    let history = state.chat.history(&current.user).await;
    ApiResponse::success(ChatHistory {
        results: history.len(),
        history,
    })
}

/// POST /api/v1/chat - Ask the farming assistant
///
/// Body: `{ "message", "language"?, "region"? }`.
pub async fn send(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatReply> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let reply = state.chat.send(&current.user, request).await?;
    let history = state.chat.history(&current.user).await;
    Ok(ApiResponse::success(ChatReply { reply, history }))
}

/// DELETE /api/v1/chat - Forget the caller's conversation
pub async fn clear(State(state): State<AppState>, Extension(current): Extension<CurrentUser>) -> ApiResult<()> {
    state.chat.clear(&current.user).await;
    Ok(ApiResponse::no_content())
}
