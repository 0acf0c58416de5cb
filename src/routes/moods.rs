use axum::{extract::State, http::StatusCode, Json};

use super::{parse_mood, AppState};
use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{ApiResponse, CreateMoodRequest, MoodRecord},
};

/// Records a mood selection. Each call creates a new mood instance and so a
/// new player session key.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<CreateMoodRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MoodRecord>>)> {
    let mood = parse_mood(request.mood.as_deref())?;
    let record = state
        .repository
        .create_mood(&user_id, mood, request.memo)
        .await?;

    tracing::info!(user_id = %user_id, mood = %mood, mood_id = %record.id, "Mood recorded");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

pub async fn latest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<MoodRecord>>> {
    let record = state
        .repository
        .latest_mood(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No mood recorded yet".to_string()))?;

    Ok(Json(ApiResponse::ok(record)))
}
