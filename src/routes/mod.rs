use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
    models::Mood,
};

pub mod moods;
pub mod music;
pub mod profile;
pub mod sessions;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/moods", post(moods::create))
        .route("/moods/latest", get(moods::latest))
        .route("/music/recommend", post(music::recommend))
        .route("/music/load-more", post(music::load_more))
        .route("/music/listens", post(music::save_listen))
        .route("/profile", get(profile::get))
        .route("/profile/update", post(profile::update))
        .route("/sessions/:mood_id", post(sessions::enter))
        .route("/sessions/:mood_id/play", post(sessions::play))
        .route("/sessions/:mood_id/pause", post(sessions::pause))
        .route("/sessions/:mood_id/resume", post(sessions::resume))
        .route("/sessions/:mood_id/leave", post(sessions::leave))
        .route("/sessions/:mood_id/load-more", post(sessions::load_more))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Reads the required `mood` field of a request body
fn parse_mood(mood: Option<&str>) -> AppResult<Mood> {
    let mood = mood
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::InvalidInput("mood is required".to_string()))?;

    mood.parse::<Mood>().map_err(AppError::InvalidInput)
}
