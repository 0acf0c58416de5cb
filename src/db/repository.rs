use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ListenRecord, Mood, MoodRecord, NewListenRecord, TasteVector},
};

/// Persisted state the pipeline reads for personalization and writes as a
/// side effect of ranking and profiling.
///
/// Every write is a single-row insert or upsert; no multi-statement
/// transactions are needed.
#[async_trait::async_trait]
pub trait MusicRepository: Send + Sync {
    /// Records a fresh mood selection
    async fn create_mood(
        &self,
        user_id: &str,
        mood: Mood,
        memo: Option<String>,
    ) -> AppResult<MoodRecord>;

    /// Most recent mood selection of the user
    async fn latest_mood(&self, user_id: &str) -> AppResult<Option<MoodRecord>>;

    /// Looks up a mood instance, scoped to its owner
    async fn get_mood(&self, user_id: &str, mood_id: Uuid) -> AppResult<Option<MoodRecord>>;

    /// Stores a track that was loaded into the player
    async fn record_listen(&self, record: NewListenRecord) -> AppResult<ListenRecord>;

    /// Most recent listen records, newest first
    async fn recent_listens(&self, user_id: &str, limit: usize) -> AppResult<Vec<ListenRecord>>;

    async fn taste_vector(&self, user_id: &str) -> AppResult<Option<TasteVector>>;

    /// Replaces the stored taste vector wholesale
    async fn replace_taste_vector(&self, user_id: &str, vector: &TasteVector) -> AppResult<()>;
}
