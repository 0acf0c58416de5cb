use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::AppState;
use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{ApiResponse, PlayRequest},
    player::{LoadMoreOutcome, PlayerSession},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreSessionResponse {
    pub outcome: LoadMoreOutcome,
    pub session: PlayerSession,
}

/// Opens (or resumes from cache) the player session for a mood selection
pub async fn enter(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PlayerSession>>> {
    let session = state.player.enter(&user_id, mood_id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

pub async fn play(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<Uuid>,
    Json(request): Json<PlayRequest>,
) -> AppResult<Json<ApiResponse<PlayerSession>>> {
    let session = state.player.play(&user_id, mood_id, request.index).await?;
    Ok(Json(ApiResponse::ok(session)))
}

pub async fn pause(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<Uuid>,
) -> Json<ApiResponse<Value>> {
    let cancelled = state.player.pause(&user_id, mood_id);
    Json(ApiResponse::ok(json!({ "timerCancelled": cancelled })))
}

/// Continues the current track without recording another listen
pub async fn resume(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PlayerSession>>> {
    let session = state.player.resume(&user_id, mood_id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

pub async fn leave(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<Uuid>,
) -> Json<ApiResponse<Value>> {
    state.player.leave(&user_id, mood_id);
    Json(ApiResponse::ok(json!({ "left": true })))
}

pub async fn load_more(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LoadMoreSessionResponse>>> {
    let (outcome, session) = state.player.load_more(&user_id, mood_id).await?;
    Ok(Json(ApiResponse::ok(LoadMoreSessionResponse { outcome, session })))
}
