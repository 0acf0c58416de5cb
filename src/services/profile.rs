use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    db::MusicRepository,
    error::AppResult,
    models::{
        scoring::{PlayedHistoryEntry, RecommendPayload},
        TasteVector,
    },
    services::{call_collaborator, providers::ScoringProvider},
};

/// Listen records a taste-vector rebuild is computed from
pub const PROFILE_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileRebuild {
    /// The stored vector was replaced with this one
    Updated(TasteVector),
    /// Nothing was stored; the previous vector (if any) is untouched
    Skipped(String),
}

/// Rebuilds a user's taste vector from their most recent listens
pub struct ProfileService {
    repository: Arc<dyn MusicRepository>,
    scoring: Arc<dyn ScoringProvider>,
    timeout: Duration,
}

impl ProfileService {
    pub fn new(
        repository: Arc<dyn MusicRepository>,
        scoring: Arc<dyn ScoringProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            scoring,
            timeout,
        }
    }

    /// Only repository errors are returned. Collaborator failures end in
    /// `Skipped` and are retried by the next qualifying dwell event.
    pub async fn rebuild(&self, user_id: &str) -> AppResult<ProfileRebuild> {
        let history = self
            .repository
            .recent_listens(user_id, PROFILE_HISTORY_LIMIT)
            .await?;

        if history.is_empty() {
            return Ok(ProfileRebuild::Skipped("no listening history".to_string()));
        }

        let payload = RecommendPayload {
            user_id: user_id.to_string(),
            emotion: String::new(),
            candidate_music: Vec::new(),
            played_history: history.iter().map(PlayedHistoryEntry::from).collect(),
        };

        let never_cancelled = CancellationToken::new();
        let data = match call_collaborator(
            self.timeout,
            &never_cancelled,
            self.scoring.recommend(payload),
        )
        .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %user_id,
                    provider = self.scoring.name(),
                    "Profile rebuild failed"
                );
                return Ok(ProfileRebuild::Skipped(e.to_string()));
            }
        };

        let terms = match data.user_profile {
            Some(terms) if !terms.is_empty() => terms,
            _ => {
                tracing::debug!(user_id = %user_id, "Scoring service returned no profile");
                return Ok(ProfileRebuild::Skipped("empty profile".to_string()));
            }
        };

        let vector = TasteVector::new(terms, history.len());
        self.repository
            .replace_taste_vector(user_id, &vector)
            .await?;

        tracing::info!(
            user_id = %user_id,
            terms = vector.len(),
            music_count = vector.music_count,
            "Taste vector rebuilt"
        );

        Ok(ProfileRebuild::Updated(vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryRepository,
        error::AppError,
        models::{scoring::RecommendData, Mood, NewListenRecord},
        services::providers::MockScoringProvider,
    };
    use std::collections::HashMap;

    async fn repo_with_listens(n: usize) -> Arc<InMemoryRepository> {
        let repo = Arc::new(InMemoryRepository::new());
        let mood = repo.create_mood("u1", Mood::Happy, None).await.unwrap();
        for i in 0..n {
            repo.record_listen(NewListenRecord {
                user_id: "u1".to_string(),
                mood_id: mood.id,
                video_id: format!("v{}", i),
                title: format!("Song {}", i),
                channel_title: "Channel".to_string(),
                thumbnail_url: "http://img".to_string(),
            })
            .await
            .unwrap();
        }
        repo
    }

    fn profile(terms: &[(&str, f64)]) -> RecommendData {
        RecommendData {
            recommended_music: Vec::new(),
            user_profile: Some(
                terms
                    .iter()
                    .map(|(term, weight)| (term.to_string(), *weight))
                    .collect::<HashMap<_, _>>(),
            ),
            user_profile_size: Some(terms.len()),
        }
    }

    #[tokio::test]
    async fn test_rebuild_uses_last_ten_listens_and_replaces_vector() {
        let repo = repo_with_listens(14).await;
        repo.replace_taste_vector(
            "u1",
            &TasteVector::new(HashMap::from([("old".to_string(), 1.0)]), 3),
        )
        .await
        .unwrap();

        let mut scoring = MockScoringProvider::new();
        scoring
            .expect_recommend()
            .withf(|payload| {
                payload.emotion.is_empty()
                    && payload.candidate_music.is_empty()
                    && payload.played_history.len() == PROFILE_HISTORY_LIMIT
                    && payload.played_history[0].video_id == "v13"
            })
            .times(1)
            .returning(|_| Ok(profile(&[("acoustic", 0.9)])));
        scoring.expect_name().return_const("mock");

        let service = ProfileService::new(repo.clone(), Arc::new(scoring), Duration::from_secs(5));
        let outcome = service.rebuild("u1").await.unwrap();

        assert!(matches!(outcome, ProfileRebuild::Updated(ref v) if v.music_count == 10));
        let stored = repo.taste_vector("u1").await.unwrap().unwrap();
        assert!(!stored.terms.contains_key("old"));
        assert_eq!(stored.terms["acoustic"], 0.9);
    }

    #[tokio::test]
    async fn test_rebuild_failure_keeps_previous_vector() {
        let repo = repo_with_listens(3).await;
        let previous = TasteVector::new(HashMap::from([("jazz".to_string(), 0.3)]), 3);
        repo.replace_taste_vector("u1", &previous).await.unwrap();

        let mut scoring = MockScoringProvider::new();
        scoring
            .expect_recommend()
            .returning(|_| Err(AppError::Timeout("slow".to_string())));
        scoring.expect_name().return_const("mock");

        let service = ProfileService::new(repo.clone(), Arc::new(scoring), Duration::from_secs(5));
        let outcome = service.rebuild("u1").await.unwrap();

        assert!(matches!(outcome, ProfileRebuild::Skipped(_)));
        assert_eq!(repo.taste_vector("u1").await.unwrap().unwrap(), previous);
    }

    #[tokio::test]
    async fn test_empty_profile_is_not_stored() {
        let repo = repo_with_listens(2).await;

        let mut scoring = MockScoringProvider::new();
        scoring.expect_recommend().returning(|_| Ok(profile(&[])));
        scoring.expect_name().return_const("mock");

        let service = ProfileService::new(repo.clone(), Arc::new(scoring), Duration::from_secs(5));

        assert!(matches!(
            service.rebuild("u1").await.unwrap(),
            ProfileRebuild::Skipped(_)
        ));
        assert!(repo.taste_vector("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_history_skips_collaborator() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut scoring = MockScoringProvider::new();
        scoring.expect_recommend().times(0);

        let service = ProfileService::new(repo, Arc::new(scoring), Duration::from_secs(5));
        assert!(matches!(
            service.rebuild("u1").await.unwrap(),
            ProfileRebuild::Skipped(_)
        ));
    }
}
