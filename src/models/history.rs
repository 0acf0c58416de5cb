use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Mood;

/// A mood selection. Every selection is a new instance and seeds its own
/// player session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    pub id: Uuid,
    pub user_id: String,
    pub mood: Mood,
    pub emoji: String,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MoodRecord {
    pub fn new(user_id: impl Into<String>, mood: Mood, memo: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            mood,
            emoji: mood.glyph().to_string(),
            memo,
            created_at: Utc::now(),
        }
    }
}

/// Durable record of a track loaded into the player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListenRecord {
    pub id: Uuid,
    pub user_id: String,
    pub mood_id: Uuid,
    pub mood: Mood,
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub played_at: DateTime<Utc>,
}

/// Listen record before it is stored
#[derive(Debug, Clone)]
pub struct NewListenRecord {
    pub user_id: String,
    pub mood_id: Uuid,
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
}

impl NewListenRecord {
    pub fn into_record(self, mood: Mood, played_at: DateTime<Utc>) -> ListenRecord {
        ListenRecord {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            mood_id: self.mood_id,
            mood,
            video_id: self.video_id,
            title: self.title,
            channel_title: self.channel_title,
            thumbnail_url: self.thumbnail_url,
            played_at,
        }
    }
}
