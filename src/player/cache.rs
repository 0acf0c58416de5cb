use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    db::{Cache, CacheKey},
    error::AppResult,
    player::session::{PlayerSession, SessionKey},
};

/// Durable store of player sessions keyed by (user, mood instance).
///
/// Presence of an entry is the only freshness check. Concurrent writers for
/// the same key are last-writer-wins.
#[async_trait::async_trait]
pub trait SessionCache: Send + Sync {
    async fn load(&self, key: &SessionKey) -> AppResult<Option<PlayerSession>>;

    async fn store(&self, session: &PlayerSession) -> AppResult<()>;
}

/// Sessions in Redis without expiry
#[derive(Clone)]
pub struct RedisSessionCache {
    cache: Cache,
}

impl RedisSessionCache {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

#[async_trait::async_trait]
impl SessionCache for RedisSessionCache {
    async fn load(&self, key: &SessionKey) -> AppResult<Option<PlayerSession>> {
        self.cache
            .get_from_cache(&CacheKey::PlayerSession(key.to_string()))
            .await
    }

    async fn store(&self, session: &PlayerSession) -> AppResult<()> {
        self.cache
            .set(
                &CacheKey::PlayerSession(session.key.to_string()),
                session,
                None,
            )
            .await
    }
}

/// Process-local session store for tests and development
#[derive(Default)]
pub struct InMemorySessionCache {
    sessions: RwLock<HashMap<SessionKey, PlayerSession>>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionCache for InMemorySessionCache {
    async fn load(&self, key: &SessionKey) -> AppResult<Option<PlayerSession>> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn store(&self, session: &PlayerSession) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.key.clone(), session.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateTrack, Mood};
    use uuid::Uuid;

    fn session(user: &str) -> PlayerSession {
        PlayerSession::new(
            SessionKey::new(user, Uuid::new_v4()),
            Mood::Sleep,
            vec![CandidateTrack::new("a", "t", "c", "u", 90)],
        )
    }

    #[tokio::test]
    async fn test_in_memory_round_trip_and_overwrite() {
        let cache = InMemorySessionCache::new();
        let mut stored = session("u1");
        cache.store(&stored).await.unwrap();

        stored.cursor = 1;
        cache.store(&stored).await.unwrap();

        let loaded = cache.load(&stored.key).await.unwrap().unwrap();
        assert_eq!(loaded.cursor, 1);
    }

    #[tokio::test]
    async fn test_in_memory_miss() {
        let cache = InMemorySessionCache::new();
        let key = SessionKey::new("u1", Uuid::new_v4());
        assert!(cache.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_redis_round_trip() {
        let client = redis::Client::open("redis://localhost:6379").unwrap();
        let (cache, _handle) = Cache::new(client).await;
        let cache = RedisSessionCache::new(cache);

        let stored = session("redis-user");
        cache.store(&stored).await.unwrap();

        assert_eq!(cache.load(&stored.key).await.unwrap(), Some(stored));
    }
}
