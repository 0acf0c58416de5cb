// ============================================================================
// Scoring / profiling service wire types
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CandidateTrack, ListenRecord};

/// Body of POST /recommend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendPayload {
    pub user_id: String,
    /// Mood name, or empty to score against the whole history
    pub emotion: String,
    pub candidate_music: Vec<CandidateMusic>,
    pub played_history: Vec<PlayedHistoryEntry>,
}

/// Body of POST /generate-keywords
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordPayload {
    pub emotion: String,
    pub played_history: Vec<PlayedHistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMusic {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub duration: u32,
    pub tags: Vec<String>,
}

impl From<&CandidateTrack> for CandidateMusic {
    fn from(track: &CandidateTrack) -> Self {
        Self {
            video_id: track.video_id.clone(),
            title: track.title.clone(),
            description: String::new(),
            channel_title: track.channel_title.clone(),
            thumbnail_url: track.thumbnail_url.clone(),
            duration: track.duration,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedHistoryEntry {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub played_at: DateTime<Utc>,
    pub emotion: String,
}

impl From<&ListenRecord> for PlayedHistoryEntry {
    fn from(record: &ListenRecord) -> Self {
        Self {
            video_id: record.video_id.clone(),
            title: record.title.clone(),
            channel_title: record.channel_title.clone(),
            played_at: record.played_at,
            emotion: record.mood.to_string(),
        }
    }
}

/// `{success, message?, data?}` envelope used by every scoring endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendData {
    #[serde(default)]
    pub recommended_music: Vec<ScoredMusic>,
    #[serde(default)]
    pub user_profile: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub user_profile_size: Option<usize>,
}

/// One entry of the ranked list. Only the id is trusted; metadata comes from
/// our own candidate batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMusic {
    pub video_id: String,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordData {
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use uuid::Uuid;

    #[test]
    fn test_recommend_payload_serializes_camel_case() {
        let track = CandidateTrack::new("abc", "Song", "Channel", "http://img", 200);
        let record = ListenRecord {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            mood_id: Uuid::new_v4(),
            mood: Mood::Love,
            video_id: "xyz".to_string(),
            title: "Old Song".to_string(),
            channel_title: "Old Channel".to_string(),
            thumbnail_url: "http://old".to_string(),
            played_at: Utc::now(),
        };

        let payload = RecommendPayload {
            user_id: "u1".to_string(),
            emotion: "love".to_string(),
            candidate_music: vec![CandidateMusic::from(&track)],
            played_history: vec![PlayedHistoryEntry::from(&record)],
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["candidateMusic"][0]["videoId"], "abc");
        assert_eq!(json["candidateMusic"][0]["description"], "");
        assert_eq!(json["candidateMusic"][0]["tags"], serde_json::json!([]));
        assert_eq!(json["playedHistory"][0]["channelTitle"], "Old Channel");
        assert_eq!(json["playedHistory"][0]["emotion"], "love");
    }

    #[test]
    fn test_recommend_envelope_deserialization() {
        let json = r#"{
            "success": true,
            "message": "ok",
            "data": {
                "recommendedMusic": [
                    {"videoId": "b", "score": 0.9, "title": "B"},
                    {"videoId": "a", "score": 0.1, "title": "A"}
                ],
                "userProfile": {"piano": 0.7},
                "userProfileSize": 1
            }
        }"#;

        let envelope: ScoringEnvelope<RecommendData> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data.recommended_music[0].video_id, "b");
        assert_eq!(data.user_profile.unwrap()["piano"], 0.7);
    }

    #[test]
    fn test_failure_envelope_without_data() {
        let json = r#"{"success": false, "message": "boom"}"#;
        let envelope: ScoringEnvelope<KeywordData> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
    }
}
