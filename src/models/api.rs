use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CandidateTrack, Mood};

/// `{success: true, data}` envelope for every successful response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMoodRequest {
    pub mood: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub mood: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub mood: Mood,
    pub keywords: Vec<String>,
    pub total_count: usize,
    pub music_list: Vec<CandidateTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreRequest {
    pub mood: Option<String>,
    pub exclude_video_ids: Option<Vec<String>>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreResponse {
    pub mood: Mood,
    pub total_count: usize,
    pub music_list: Vec<CandidateTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveListenRequest {
    pub emotion_id: Option<Uuid>,
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateResponse {
    pub updated: bool,
    pub user_profile_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub index: usize,
}
