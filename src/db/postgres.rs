use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    db::MusicRepository,
    error::{AppError, AppResult},
    models::{ListenRecord, Mood, MoodRecord, NewListenRecord, TasteVector},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse and applies
/// pending migrations from `migrations/`.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

fn parse_mood(value: &str) -> AppResult<Mood> {
    value
        .parse()
        .map_err(|e: String| AppError::Internal(format!("Corrupt mood column: {}", e)))
}

#[derive(FromRow)]
struct MoodRow {
    id: Uuid,
    user_id: String,
    mood: String,
    emoji: String,
    memo: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MoodRow> for MoodRecord {
    type Error = AppError;

    fn try_from(row: MoodRow) -> AppResult<Self> {
        Ok(MoodRecord {
            id: row.id,
            user_id: row.user_id,
            mood: parse_mood(&row.mood)?,
            emoji: row.emoji,
            memo: row.memo,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ListenRow {
    id: Uuid,
    user_id: String,
    mood_id: Uuid,
    mood: String,
    video_id: String,
    title: String,
    channel_title: String,
    thumbnail_url: String,
    played_at: DateTime<Utc>,
}

impl TryFrom<ListenRow> for ListenRecord {
    type Error = AppError;

    fn try_from(row: ListenRow) -> AppResult<Self> {
        Ok(ListenRecord {
            id: row.id,
            user_id: row.user_id,
            mood_id: row.mood_id,
            mood: parse_mood(&row.mood)?,
            video_id: row.video_id,
            title: row.title,
            channel_title: row.channel_title,
            thumbnail_url: row.thumbnail_url,
            played_at: row.played_at,
        })
    }
}

#[derive(FromRow)]
struct TasteRow {
    terms: Json<HashMap<String, f64>>,
    music_count: i32,
    updated_at: DateTime<Utc>,
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MusicRepository for PgRepository {
    async fn create_mood(
        &self,
        user_id: &str,
        mood: Mood,
        memo: Option<String>,
    ) -> AppResult<MoodRecord> {
        let record = MoodRecord::new(user_id, mood, memo);

        sqlx::query(
            r#"
            INSERT INTO moods (id, user_id, mood, emoji, memo, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(record.mood.as_str())
        .bind(&record.emoji)
        .bind(&record.memo)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn latest_mood(&self, user_id: &str) -> AppResult<Option<MoodRecord>> {
        let row: Option<MoodRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, mood, emoji, memo, created_at
            FROM moods
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MoodRecord::try_from).transpose()
    }

    async fn get_mood(&self, user_id: &str, mood_id: Uuid) -> AppResult<Option<MoodRecord>> {
        let row: Option<MoodRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, mood, emoji, memo, created_at
            FROM moods
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(mood_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MoodRecord::try_from).transpose()
    }

    async fn record_listen(&self, record: NewListenRecord) -> AppResult<ListenRecord> {
        let row: Option<ListenRow> = sqlx::query_as(
            r#"
            WITH inserted AS (
                INSERT INTO listen_records
                    (id, user_id, mood_id, video_id, title, channel_title, thumbnail_url, played_at)
                SELECT $1, m.user_id, m.id, $4, $5, $6, $7, $8
                FROM moods m
                WHERE m.id = $3 AND m.user_id = $2
                RETURNING *
            )
            SELECT i.id, i.user_id, i.mood_id, m.mood, i.video_id, i.title,
                   i.channel_title, i.thumbnail_url, i.played_at
            FROM inserted i
            JOIN moods m ON m.id = i.mood_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.user_id)
        .bind(record.mood_id)
        .bind(&record.video_id)
        .bind(&record.title)
        .bind(&record.channel_title)
        .bind(&record.thumbnail_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ListenRecord::try_from)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("Mood {} not found", record.mood_id)))
    }

    async fn recent_listens(&self, user_id: &str, limit: usize) -> AppResult<Vec<ListenRecord>> {
        let rows: Vec<ListenRow> = sqlx::query_as(
            r#"
            SELECT l.id, l.user_id, l.mood_id, m.mood, l.video_id, l.title,
                   l.channel_title, l.thumbnail_url, l.played_at
            FROM listen_records l
            JOIN moods m ON m.id = l.mood_id
            WHERE l.user_id = $1
            ORDER BY l.played_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ListenRecord::try_from).collect()
    }

    async fn taste_vector(&self, user_id: &str) -> AppResult<Option<TasteVector>> {
        let row: Option<TasteRow> = sqlx::query_as(
            r#"
            SELECT terms, music_count, updated_at
            FROM taste_vectors
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| TasteVector {
            terms: row.terms.0,
            music_count: row.music_count.max(0) as usize,
            updated_at: row.updated_at,
        }))
    }

    async fn replace_taste_vector(&self, user_id: &str, vector: &TasteVector) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO taste_vectors (user_id, terms, music_count, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET terms = EXCLUDED.terms,
                music_count = EXCLUDED.music_count,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(Json(&vector.terms))
        .bind(vector.music_count as i32)
        .bind(vector.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
