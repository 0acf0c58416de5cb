use std::{collections::HashSet, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::{
    config::PipelineSettings,
    db::MusicRepository,
    error::{AppError, AppResult},
    models::{CandidateTrack, Mood, TasteVector},
    services::{
        aggregator::CandidateSearchAggregator,
        keywords::{KeywordGenerator, KeywordSet},
        providers::{CatalogProvider, ScoringProvider},
        ranker::RecommendationRanker,
    },
};

/// Listen records fed into personalization and ranking
pub const HISTORY_LIMIT: usize = 20;

/// Largest batch a single request may ask for
pub const MAX_REQUEST_COUNT: usize = 100;

/// One ranked batch and the phrases that found it
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub mood: Mood,
    pub keywords: KeywordSet,
    pub tracks: Vec<CandidateTrack>,
}

/// Runs keyword generation, candidate search and ranking for a mood
///
/// Shared by the stateless HTTP endpoints and the player's load-more path.
/// Collaborator failures degrade the result (fallback phrases, fewer
/// candidates, search order) and never surface as errors.
pub struct RecommendationService {
    repository: Arc<dyn MusicRepository>,
    keywords: KeywordGenerator,
    aggregator: CandidateSearchAggregator,
    ranker: RecommendationRanker,
    max_duration: u32,
}

impl RecommendationService {
    pub fn new(
        repository: Arc<dyn MusicRepository>,
        catalog: Arc<dyn CatalogProvider>,
        scoring: Arc<dyn ScoringProvider>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            repository,
            keywords: KeywordGenerator::new(
                scoring.clone(),
                settings.collaborator_timeout,
                settings.keyword_seed,
            ),
            aggregator: CandidateSearchAggregator::new(
                catalog,
                settings.search_pacing,
                settings.collaborator_timeout,
            ),
            ranker: RecommendationRanker::new(scoring, settings.collaborator_timeout),
            max_duration: settings.max_duration,
        }
    }

    /// Fresh batch for a mood with nothing excluded
    pub async fn recommend(
        &self,
        user_id: &str,
        mood: Mood,
        count: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Recommendation> {
        validate_count(count)?;
        self.run(user_id, mood, count, &HashSet::new(), cancel)
            .await
    }

    /// Next batch for a session; nothing in `exclude` is returned
    pub async fn load_more(
        &self,
        user_id: &str,
        mood: Mood,
        exclude: &HashSet<String>,
        count: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Recommendation> {
        validate_count(count)?;
        self.run(user_id, mood, count, exclude, cancel).await
    }

    async fn run(
        &self,
        user_id: &str,
        mood: Mood,
        count: usize,
        exclude: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> AppResult<Recommendation> {
        let history = self.repository.recent_listens(user_id, HISTORY_LIMIT).await?;

        let keywords = self.keywords.generate(mood, &history, cancel).await;
        let per_phrase = count.div_ceil(keywords.phrases.len().max(1));

        let batch = self
            .aggregator
            .search(
                &keywords.phrases,
                per_phrase,
                self.max_duration,
                exclude,
                cancel,
            )
            .await;

        let outcome = self
            .ranker
            .rank(user_id, mood, batch, &history, cancel)
            .await;

        if cancel.is_cancelled() {
            tracing::debug!(user_id = %user_id, mood = %mood, "Discarding stale recommendation");
            return Err(AppError::Cancelled);
        }

        if let Some(profile) = outcome.profile {
            self.persist_profile(user_id, profile);
        }

        let mut tracks = outcome.tracks;
        tracks.truncate(count);

        tracing::info!(
            user_id = %user_id,
            mood = %mood,
            keyword_source = ?keywords.source,
            requested = count,
            returned = tracks.len(),
            ranked = outcome.ranked,
            "Recommendation batch ready"
        );

        Ok(Recommendation {
            mood,
            keywords,
            tracks,
        })
    }

    /// Stores the taste vector a ranking call rebuilt without holding up the
    /// response
    fn persist_profile(&self, user_id: &str, profile: TasteVector) {
        let repository = self.repository.clone();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            if let Err(e) = repository.replace_taste_vector(&user_id, &profile).await {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to store taste vector");
            }
        });
    }
}

fn validate_count(count: usize) -> AppResult<()> {
    if count == 0 || count > MAX_REQUEST_COUNT {
        return Err(AppError::InvalidInput(format!(
            "count must be between 1 and {}",
            MAX_REQUEST_COUNT
        )));
    }
    Ok(())
}
