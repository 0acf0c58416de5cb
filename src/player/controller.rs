use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::PipelineSettings,
    db::MusicRepository,
    error::{AppError, AppResult},
    models::NewListenRecord,
    player::{
        cache::SessionCache,
        feedback::ProfileFeedbackTrigger,
        load_more::{LoadMoreController, LoadMoreOutcome},
        registry::{NavigationTokens, SessionLocks},
        session::{PlayerSession, SessionKey},
    },
    services::{ProfileService, RecommendationService},
};

/// Drives a listening session: entry, track transitions, pause, leave.
///
/// The session value itself lives in the [`SessionCache`]; this controller
/// only holds the per-session timers, write locks and navigation tokens.
pub struct PlayerController {
    repository: Arc<dyn MusicRepository>,
    recommendations: Arc<RecommendationService>,
    sessions: Arc<dyn SessionCache>,
    locks: Arc<SessionLocks>,
    load_more: Arc<LoadMoreController>,
    feedback: ProfileFeedbackTrigger,
    navigation: NavigationTokens,
    recommend_count: usize,
}

impl PlayerController {
    pub fn new(
        repository: Arc<dyn MusicRepository>,
        recommendations: Arc<RecommendationService>,
        profiles: Arc<ProfileService>,
        sessions: Arc<dyn SessionCache>,
        settings: &PipelineSettings,
    ) -> Self {
        let locks = Arc::new(SessionLocks::new());
        let load_more = Arc::new(LoadMoreController::new(
            recommendations.clone(),
            sessions.clone(),
            locks.clone(),
            settings.low_water_mark,
            settings.load_more_count,
        ));

        Self {
            repository,
            recommendations,
            sessions,
            locks,
            load_more,
            feedback: ProfileFeedbackTrigger::new(profiles, settings.dwell_threshold),
            navigation: NavigationTokens::new(),
            recommend_count: settings.recommend_count,
        }
    }

    /// Opens the session for a mood selection. A cached session is returned
    /// as is, without touching any collaborator.
    pub async fn enter(&self, user_id: &str, mood_id: Uuid) -> AppResult<PlayerSession> {
        let mood = self
            .repository
            .get_mood(user_id, mood_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mood {} not found", mood_id)))?;

        let key = SessionKey::new(user_id, mood_id);

        if let Some(session) = self.sessions.load(&key).await? {
            tracing::debug!(session = %key, tracks = session.tracks.len(), "Session cache hit");
            return Ok(session);
        }

        let navigation = self.navigation.begin(&key);
        let recommendation = self
            .recommendations
            .recommend(user_id, mood.mood, self.recommend_count, navigation.token())
            .await?;

        let session = PlayerSession::new(key, mood.mood, recommendation.tracks);
        self.sessions.store(&session).await?;

        tracing::info!(
            session = %session.key,
            mood = %session.mood,
            tracks = session.tracks.len(),
            "Session created"
        );

        Ok(session)
    }

    /// Moves the cursor to `index`: persists it, records the listen, re-arms
    /// the dwell timer and starts a load-more when the list runs low
    pub async fn play(&self, user_id: &str, mood_id: Uuid, index: usize) -> AppResult<PlayerSession> {
        let key = SessionKey::new(user_id, mood_id);

        let (session, track) = {
            let _write = self.locks.lock(&key).await;
            let mut session = self.load_session(&key).await?;

            let track = session.tracks.get(index).cloned().ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Track index {} out of range (session has {} tracks)",
                    index,
                    session.tracks.len()
                ))
            })?;

            session.cursor = index;
            self.sessions.store(&session).await?;
            (session, track)
        };

        let listen = NewListenRecord {
            user_id: user_id.to_string(),
            mood_id,
            video_id: track.video_id.clone(),
            title: track.title,
            channel_title: track.channel_title,
            thumbnail_url: track.thumbnail_url,
        };
        if let Err(e) = self.repository.record_listen(listen).await {
            tracing::warn!(error = %e, session = %key, video_id = %track.video_id, "Failed to record listen");
        }

        self.feedback.arm(&key);

        if self.load_more.should_extend(&session) {
            self.spawn_load_more(key);
        }

        Ok(session)
    }

    /// Stops the dwell timer; returns whether one was armed
    pub fn pause(&self, user_id: &str, mood_id: Uuid) -> bool {
        self.feedback.cancel(&SessionKey::new(user_id, mood_id))
    }

    /// Continues the current track after a pause. The dwell timer starts
    /// over; no listen is recorded since the track was already loaded.
    pub async fn resume(&self, user_id: &str, mood_id: Uuid) -> AppResult<PlayerSession> {
        let key = SessionKey::new(user_id, mood_id);
        let session = self.load_session(&key).await?;

        if session.tracks.is_empty() {
            return Err(AppError::InvalidInput(
                "Session has no track to resume".to_string(),
            ));
        }

        self.feedback.arm(&key);
        Ok(session)
    }

    /// Cancels the dwell timer and discards any collaborator call still
    /// running for the session
    pub fn leave(&self, user_id: &str, mood_id: Uuid) {
        let key = SessionKey::new(user_id, mood_id);
        self.feedback.cancel(&key);

        if self.navigation.cancel(&key) {
            tracing::debug!(session = %key, "Pending collaborator work cancelled");
        }

        tracing::debug!(session = %key, "Session left");
    }

    /// Explicit extension request; waits for the outcome
    pub async fn load_more(
        &self,
        user_id: &str,
        mood_id: Uuid,
    ) -> AppResult<(LoadMoreOutcome, PlayerSession)> {
        let key = SessionKey::new(user_id, mood_id);
        let navigation = self.navigation.begin(&key);

        let outcome = self.load_more.extend(&key, navigation.token()).await?;
        let session = self.load_session(&key).await?;

        Ok((outcome, session))
    }

    fn spawn_load_more(&self, key: SessionKey) {
        let controller = self.load_more.clone();
        let navigation = self.navigation.begin(&key);

        tokio::spawn(async move {
            match controller.extend(&key, navigation.token()).await {
                Ok(outcome) => {
                    tracing::debug!(session = %key, outcome = ?outcome, "Background load-more finished");
                }
                Err(e) => {
                    tracing::warn!(error = %e, session = %key, "Background load-more failed");
                }
            }
        });
    }

    async fn load_session(&self, key: &SessionKey) -> AppResult<PlayerSession> {
        self.sessions
            .load(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No player session for {}", key)))
    }
}
