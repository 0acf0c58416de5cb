use axum::{extract::State, Json};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{ApiResponse, ProfileUpdateResponse, TasteVector},
    services::ProfileRebuild,
};

/// Rebuilds the caller's taste vector from their ten most recent listens
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<ProfileUpdateResponse>>> {
    let response = match state.profiles.rebuild(&user_id).await? {
        ProfileRebuild::Updated(vector) => ProfileUpdateResponse {
            updated: true,
            user_profile_size: vector.len(),
        },
        ProfileRebuild::Skipped(_) => ProfileUpdateResponse {
            updated: false,
            user_profile_size: state
                .repository
                .taste_vector(&user_id)
                .await?
                .map(|v| v.len())
                .unwrap_or(0),
        },
    };

    Ok(Json(ApiResponse::ok(response)))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<TasteVector>>> {
    let vector = state
        .repository
        .taste_vector(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No taste profile yet".to_string()))?;

    Ok(Json(ApiResponse::ok(vector)))
}
