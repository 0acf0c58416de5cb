use std::collections::HashSet;

use axum::{extract::State, http::StatusCode, Json};
use tokio_util::sync::CancellationToken;

use super::{parse_mood, AppState};
use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        ApiResponse, ListenRecord, LoadMoreRequest, LoadMoreResponse, NewListenRecord,
        RecommendRequest, RecommendResponse, SaveListenRequest,
    },
};

/// POST /music/recommend
pub async fn recommend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<ApiResponse<RecommendResponse>>> {
    let mood = parse_mood(request.mood.as_deref())?;
    let count = request.count.unwrap_or(state.settings.recommend_count);

    let recommendation = state
        .recommendations
        .recommend(&user_id, mood, count, &CancellationToken::new())
        .await?;

    Ok(Json(ApiResponse::ok(RecommendResponse {
        mood,
        keywords: recommendation.keywords.phrases,
        total_count: recommendation.tracks.len(),
        music_list: recommendation.tracks,
    })))
}

/// POST /music/load-more
pub async fn load_more(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<LoadMoreRequest>,
) -> AppResult<Json<ApiResponse<LoadMoreResponse>>> {
    let mood = parse_mood(request.mood.as_deref())?;
    let exclude: HashSet<String> = request
        .exclude_video_ids
        .ok_or_else(|| AppError::InvalidInput("excludeVideoIds is required".to_string()))?
        .into_iter()
        .collect();
    let count = request.count.unwrap_or(state.settings.load_more_count);

    let batch = state
        .recommendations
        .load_more(&user_id, mood, &exclude, count, &CancellationToken::new())
        .await?;

    Ok(Json(ApiResponse::ok(LoadMoreResponse {
        mood,
        total_count: batch.tracks.len(),
        music_list: batch.tracks,
    })))
}

/// POST /music/listens
pub async fn save_listen(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<SaveListenRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ListenRecord>>)> {
    let mood_id = request
        .emotion_id
        .ok_or_else(|| AppError::InvalidInput("emotionId is required".to_string()))?;
    let video_id = required(request.video_id, "videoId")?;
    let title = required(request.title, "title")?;

    let record = state
        .repository
        .record_listen(NewListenRecord {
            user_id,
            mood_id,
            video_id,
            title,
            channel_title: request.channel_title.unwrap_or_default(),
            thumbnail_url: request.thumbnail_url.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", field)))
}
