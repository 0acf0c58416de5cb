use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::MusicRepository,
    error::{AppError, AppResult},
    models::{ListenRecord, Mood, MoodRecord, NewListenRecord, TasteVector},
};

/// Process-local repository for tests and single-node development runs
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    moods: HashMap<Uuid, MoodRecord>,
    /// Append-only, oldest first
    listens: Vec<ListenRecord>,
    taste_vectors: HashMap<String, TasteVector>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MusicRepository for InMemoryRepository {
    async fn create_mood(
        &self,
        user_id: &str,
        mood: Mood,
        memo: Option<String>,
    ) -> AppResult<MoodRecord> {
        let record = MoodRecord::new(user_id, mood, memo);
        let mut inner = self.inner.write().await;
        inner.moods.insert(record.id, record.clone());
        Ok(record)
    }

    async fn latest_mood(&self, user_id: &str) -> AppResult<Option<MoodRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .moods
            .values()
            .filter(|m| m.user_id == user_id)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn get_mood(&self, user_id: &str, mood_id: Uuid) -> AppResult<Option<MoodRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .moods
            .get(&mood_id)
            .filter(|m| m.user_id == user_id)
            .cloned())
    }

    async fn record_listen(&self, record: NewListenRecord) -> AppResult<ListenRecord> {
        let mut inner = self.inner.write().await;
        let mood = inner
            .moods
            .get(&record.mood_id)
            .filter(|m| m.user_id == record.user_id)
            .map(|m| m.mood)
            .ok_or_else(|| AppError::NotFound(format!("Mood {} not found", record.mood_id)))?;

        let listen = record.into_record(mood, Utc::now());
        inner.listens.push(listen.clone());
        Ok(listen)
    }

    async fn recent_listens(&self, user_id: &str, limit: usize) -> AppResult<Vec<ListenRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .listens
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn taste_vector(&self, user_id: &str) -> AppResult<Option<TasteVector>> {
        let inner = self.inner.read().await;
        Ok(inner.taste_vectors.get(user_id).cloned())
    }

    async fn replace_taste_vector(&self, user_id: &str, vector: &TasteVector) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .taste_vectors
            .insert(user_id.to_string(), vector.clone());
        Ok(())
    }
}
