use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    player::session::SessionKey,
    services::{ProfileRebuild, ProfileService},
};

struct DwellTimer {
    generation: u64,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

type TimerMap = Arc<Mutex<HashMap<SessionKey, DwellTimer>>>;

/// Turns continuous playback into taste-vector rebuilds.
///
/// Each session has at most one armed timer. Starting a track re-arms it;
/// pausing, skipping or leaving cancels it. A timer that reaches the dwell
/// threshold asks the profile service for a rebuild in the background.
pub struct ProfileFeedbackTrigger {
    profiles: Arc<ProfileService>,
    threshold: Duration,
    timers: TimerMap,
    generation: AtomicU64,
}

impl ProfileFeedbackTrigger {
    pub fn new(profiles: Arc<ProfileService>, threshold: Duration) -> Self {
        Self {
            profiles,
            threshold,
            timers: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Starts the dwell timer for a newly started track, replacing any timer
    /// still armed for the session
    pub fn arm(&self, key: &SessionKey) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(Self::run_timer(
            self.profiles.clone(),
            self.timers.clone(),
            key.clone(),
            generation,
            self.threshold,
            cancel.clone(),
        ));

        let previous = lock(&self.timers).insert(
            key.clone(),
            DwellTimer {
                generation,
                cancel,
                _task: task,
            },
        );

        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        tracing::debug!(session = %key, "Dwell timer armed");
    }

    /// Cancels the armed timer, if any. Returns whether one was armed.
    pub fn cancel(&self, key: &SessionKey) -> bool {
        match lock(&self.timers).remove(key) {
            Some(timer) => {
                timer.cancel.cancel();
                tracing::debug!(session = %key, "Dwell timer cancelled");
                true
            }
            None => false,
        }
    }

    async fn run_timer(
        profiles: Arc<ProfileService>,
        timers: TimerMap,
        key: SessionKey,
        generation: u64,
        threshold: Duration,
        cancel: CancellationToken,
    ) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(threshold) => {}
        }

        {
            let mut timers = lock(&timers);
            match timers.get(&key) {
                Some(timer) if timer.generation == generation => {
                    timers.remove(&key);
                }
                _ => return,
            }
        }

        tracing::info!(session = %key, "Dwell threshold reached, rebuilding profile");

        match profiles.rebuild(&key.user_id).await {
            Ok(ProfileRebuild::Updated(vector)) => {
                tracing::debug!(session = %key, terms = vector.len(), "Profile updated");
            }
            Ok(ProfileRebuild::Skipped(reason)) => {
                tracing::debug!(session = %key, reason = %reason, "Profile rebuild skipped");
            }
            Err(e) => {
                tracing::warn!(error = %e, session = %key, "Profile rebuild failed");
            }
        }
    }
}

fn lock(
    timers: &Mutex<HashMap<SessionKey, DwellTimer>>,
) -> std::sync::MutexGuard<'_, HashMap<SessionKey, DwellTimer>> {
    timers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{InMemoryRepository, MusicRepository},
        models::{scoring::RecommendData, Mood, NewListenRecord},
        services::providers::MockScoringProvider,
    };
    use std::sync::atomic::AtomicUsize;

    struct Fixture {
        trigger: ProfileFeedbackTrigger,
        rebuilds: Arc<AtomicUsize>,
        key: SessionKey,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let mood = repo.create_mood("u1", Mood::Sleep, None).await.unwrap();
        repo.record_listen(NewListenRecord {
            user_id: "u1".to_string(),
            mood_id: mood.id,
            video_id: "v1".to_string(),
            title: "Song".to_string(),
            channel_title: "Channel".to_string(),
            thumbnail_url: "http://img".to_string(),
        })
        .await
        .unwrap();

        let rebuilds = Arc::new(AtomicUsize::new(0));
        let counter = rebuilds.clone();
        let mut scoring = MockScoringProvider::new();
        scoring.expect_recommend().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(RecommendData {
                recommended_music: Vec::new(),
                user_profile: Some(HashMap::from([("ambient".to_string(), 1.0)])),
                user_profile_size: Some(1),
            })
        });
        scoring.expect_name().return_const("mock");

        let profiles = Arc::new(ProfileService::new(
            repo,
            Arc::new(scoring),
            Duration::from_secs(5),
        ));

        Fixture {
            trigger: ProfileFeedbackTrigger::new(profiles, Duration::from_secs(30)),
            rebuilds,
            key: SessionKey::new("u1", mood.id),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_threshold_records_nothing() {
        let f = fixture().await;
        f.trigger.arm(&f.key);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(f.trigger.cancel(&f.key));

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(f.rebuilds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_triggers_exactly_one_rebuild() {
        let f = fixture().await;
        f.trigger.arm(&f.key);

        tokio::time::sleep(Duration::from_secs(31)).await;
        settle().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(f.rebuilds.load(Ordering::SeqCst), 1);
        // The fired timer is no longer armed
        assert!(!f.trigger.cancel(&f.key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let f = fixture().await;
        f.trigger.arm(&f.key);

        tokio::time::sleep(Duration::from_secs(20)).await;
        f.trigger.arm(&f.key);

        // 40s after the first arm, 20s after the second
        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(f.rebuilds.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(11)).await;
        settle().await;
        assert_eq!(f.rebuilds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_without_timer() {
        let f = fixture().await;
        assert!(!f.trigger.cancel(&f.key));
    }
}
