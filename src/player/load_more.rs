use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    player::{
        cache::SessionCache,
        registry::SessionLocks,
        session::{PlayerSession, SessionKey},
    },
    services::RecommendationService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoadMoreOutcome {
    /// New tracks were appended to the session
    Extended { added: usize },
    /// Another extension for this session is still running
    AlreadyInFlight,
    /// The catalog has nothing new for this session
    Exhausted,
    /// The session was left before the batch arrived
    Discarded,
}

/// Extends a session's candidate list near its end.
///
/// At most one extension runs per session. The new batch is searched with
/// every id already in the session excluded, ranked on its own, and appended
/// behind the existing prefix.
pub struct LoadMoreController {
    recommendations: Arc<RecommendationService>,
    sessions: Arc<dyn SessionCache>,
    locks: Arc<SessionLocks>,
    in_flight: Mutex<HashSet<SessionKey>>,
    low_water_mark: usize,
    count: usize,
}

/// Releases the single-flight slot however `extend` exits
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<SessionKey>>,
    key: SessionKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.key);
    }
}

impl LoadMoreController {
    pub fn new(
        recommendations: Arc<RecommendationService>,
        sessions: Arc<dyn SessionCache>,
        locks: Arc<SessionLocks>,
        low_water_mark: usize,
        count: usize,
    ) -> Self {
        Self {
            recommendations,
            sessions,
            locks,
            in_flight: Mutex::new(HashSet::new()),
            low_water_mark,
            count,
        }
    }

    /// True once the cursor is within the low-water mark of the end
    pub fn should_extend(&self, session: &PlayerSession) -> bool {
        !session.exhausted && session.remaining() < self.low_water_mark
    }

    fn try_acquire(&self, key: &SessionKey) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !in_flight.insert(key.clone()) {
            return None;
        }

        Some(InFlightGuard {
            in_flight: &self.in_flight,
            key: key.clone(),
        })
    }

    pub async fn extend(
        &self,
        key: &SessionKey,
        cancel: &CancellationToken,
    ) -> AppResult<LoadMoreOutcome> {
        let Some(_guard) = self.try_acquire(key) else {
            tracing::debug!(session = %key, "Load-more already in flight");
            return Ok(LoadMoreOutcome::AlreadyInFlight);
        };

        let session = self.load_session(key).await?;
        if session.exhausted {
            return Ok(LoadMoreOutcome::Exhausted);
        }

        let exclude = session.exclusion_set();
        let batch = match self
            .recommendations
            .load_more(&key.user_id, session.mood, &exclude, self.count, cancel)
            .await
        {
            Ok(batch) => batch,
            Err(AppError::Cancelled) => return Ok(LoadMoreOutcome::Discarded),
            Err(e) => return Err(e),
        };

        // The cursor may have moved while the batch was being fetched
        let _write = self.locks.lock(key).await;
        let mut session = self.load_session(key).await?;
        let added = session.append_tracks(batch.tracks);

        let outcome = if added == 0 {
            session.exhausted = true;
            LoadMoreOutcome::Exhausted
        } else {
            LoadMoreOutcome::Extended { added }
        };

        self.sessions.store(&session).await?;

        tracing::info!(
            session = %key,
            added,
            total = session.tracks.len(),
            exhausted = session.exhausted,
            "Session extended"
        );

        Ok(outcome)
    }

    async fn load_session(&self, key: &SessionKey) -> AppResult<PlayerSession> {
        self.sessions
            .load(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No player session for {}", key)))
    }
}
