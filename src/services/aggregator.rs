use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{youtube::VideoDetails, CandidateTrack},
    services::{
        call_collaborator,
        providers::{CatalogProvider, SearchQuery},
    },
};

/// Hard cap the catalog enforces on a single search page
const MAX_RESULTS_PER_SEARCH: usize = 50;

/// Fans search phrases out to the catalog and merges the results into one
/// duplicate-free, duration-filtered candidate batch.
///
/// Phrases run one after another with `pacing` between calls to stay under
/// the catalog quota. A failing phrase is logged and skipped, so every
/// phrase failing simply produces an empty batch.
pub struct CandidateSearchAggregator {
    catalog: Arc<dyn CatalogProvider>,
    pacing: Duration,
    timeout: Duration,
}

impl CandidateSearchAggregator {
    pub fn new(catalog: Arc<dyn CatalogProvider>, pacing: Duration, timeout: Duration) -> Self {
        Self {
            catalog,
            pacing,
            timeout,
        }
    }

    pub async fn search(
        &self,
        phrases: &[String],
        per_phrase: usize,
        max_duration: u32,
        exclude: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> Vec<CandidateTrack> {
        if per_phrase == 0 {
            return Vec::new();
        }

        let mut accumulated: Vec<CandidateTrack> = Vec::new();

        for (index, phrase) in phrases.iter().enumerate() {
            if index > 0 && !self.pace(cancel).await {
                break;
            }

            match self.search_phrase(phrase, per_phrase, max_duration, cancel).await {
                Ok(tracks) => accumulated.extend(tracks),
                Err(AppError::Cancelled) => {
                    tracing::debug!(phrase = %phrase, "Candidate search cancelled");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        phrase = %phrase,
                        provider = self.catalog.name(),
                        "Phrase search failed, skipping"
                    );
                }
            }
        }

        let merged = merge_candidates(accumulated, exclude);

        tracing::info!(
            phrases = phrases.len(),
            per_phrase,
            candidates = merged.len(),
            excluded = exclude.len(),
            "Candidate search completed"
        );

        merged
    }

    /// Waits out the pacing delay. Returns false when cancelled meanwhile.
    async fn pace(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if self.pacing.is_zero() {
            return true;
        }

        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.pacing) => true,
        }
    }

    async fn search_phrase(
        &self,
        phrase: &str,
        per_phrase: usize,
        max_duration: u32,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CandidateTrack>> {
        let query = SearchQuery {
            phrase: phrase.to_string(),
            max_results: (per_phrase * 2).min(MAX_RESULTS_PER_SEARCH) as u32,
        };

        let ids = call_collaborator(self.timeout, cancel, self.catalog.search_videos(&query)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let details =
            call_collaborator(self.timeout, cancel, self.catalog.fetch_video_details(&ids)).await?;

        Ok(select_playable(&ids, details, per_phrase, max_duration))
    }
}

/// Keeps search order, drops ids without metadata or outside the duration
/// window, and truncates to `limit`
fn select_playable(
    ids: &[String],
    details: Vec<VideoDetails>,
    limit: usize,
    max_duration: u32,
) -> Vec<CandidateTrack> {
    let mut by_id: HashMap<String, VideoDetails> = details
        .into_iter()
        .map(|d| (d.video_id.clone(), d))
        .collect();

    ids.iter()
        .filter_map(|id| by_id.remove(id))
        .map(|d| {
            CandidateTrack::new(
                d.video_id,
                d.title,
                d.channel_title,
                d.thumbnail_url,
                d.duration,
            )
        })
        .filter(|track| track.fits_duration(max_duration))
        .take(limit)
        .collect()
}

/// First occurrence of an id wins; excluded ids never survive
fn merge_candidates(tracks: Vec<CandidateTrack>, exclude: &HashSet<String>) -> Vec<CandidateTrack> {
    let mut seen: HashSet<String> = HashSet::with_capacity(tracks.len());

    tracks
        .into_iter()
        .filter(|track| !exclude.contains(&track.video_id))
        .filter(|track| seen.insert(track.video_id.clone()))
        .collect()
}
