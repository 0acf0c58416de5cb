use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use tokio_util::sync::CancellationToken;

use crate::{
    models::{
        scoring::{CandidateMusic, PlayedHistoryEntry, RecommendPayload, ScoredMusic},
        CandidateTrack, ListenRecord, Mood, TasteVector,
    },
    services::{call_collaborator, providers::ScoringProvider},
};

/// Result of ranking one candidate batch
#[derive(Debug, Clone)]
pub struct RankOutcome {
    /// Always exactly the input id-set
    pub tracks: Vec<CandidateTrack>,
    /// Taste vector the collaborator rebuilt while ranking, if it sent one
    pub profile: Option<TasteVector>,
    /// False when the original order was kept because ranking failed
    pub ranked: bool,
}

/// Delegates ordering of a candidate batch to the scoring collaborator
pub struct RecommendationRanker {
    scoring: Arc<dyn ScoringProvider>,
    timeout: Duration,
}

impl RecommendationRanker {
    pub fn new(scoring: Arc<dyn ScoringProvider>, timeout: Duration) -> Self {
        Self { scoring, timeout }
    }

    /// Never fails: any collaborator problem returns `batch` in its original
    /// order with `ranked: false`
    pub async fn rank(
        &self,
        user_id: &str,
        mood: Mood,
        batch: Vec<CandidateTrack>,
        history: &[ListenRecord],
        cancel: &CancellationToken,
    ) -> RankOutcome {
        if batch.is_empty() {
            return RankOutcome {
                tracks: batch,
                profile: None,
                ranked: false,
            };
        }

        let payload = RecommendPayload {
            user_id: user_id.to_string(),
            emotion: mood.to_string(),
            candidate_music: batch.iter().map(CandidateMusic::from).collect(),
            played_history: history.iter().map(PlayedHistoryEntry::from).collect(),
        };

        match call_collaborator(self.timeout, cancel, self.scoring.recommend(payload)).await {
            Ok(data) => {
                let profile = data
                    .user_profile
                    .filter(|terms| !terms.is_empty())
                    .map(|terms| TasteVector::new(terms, history.len()));
                let tracks = reconcile(batch, &data.recommended_music);

                tracing::info!(
                    user_id = %user_id,
                    mood = %mood,
                    tracks = tracks.len(),
                    provider = self.scoring.name(),
                    "Candidate batch ranked"
                );

                RankOutcome {
                    tracks,
                    profile,
                    ranked: true,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %user_id,
                    mood = %mood,
                    provider = self.scoring.name(),
                    "Ranking failed, keeping search order"
                );

                RankOutcome {
                    tracks: batch,
                    profile: None,
                    ranked: false,
                }
            }
        }
    }
}

/// Applies the collaborator's order to `batch`.
///
/// Unknown and repeated ids in the response are dropped. Candidates the
/// response left out are appended in their original relative order.
fn reconcile(batch: Vec<CandidateTrack>, ranked: &[ScoredMusic]) -> Vec<CandidateTrack> {
    let original_order: Vec<String> = batch.iter().map(|t| t.video_id.clone()).collect();
    let mut by_id: HashMap<String, CandidateTrack> = batch
        .into_iter()
        .map(|t| (t.video_id.clone(), t))
        .collect();

    let mut ordered = Vec::with_capacity(original_order.len());
    let mut unknown: HashSet<&str> = HashSet::new();

    for entry in ranked {
        match by_id.remove(&entry.video_id) {
            Some(track) => ordered.push(track),
            None => {
                unknown.insert(entry.video_id.as_str());
            }
        }
    }

    if !unknown.is_empty() {
        tracing::debug!(
            count = unknown.len(),
            "Dropped ids the ranking response introduced"
        );
    }

    for id in original_order {
        if let Some(track) = by_id.remove(&id) {
            ordered.push(track);
        }
    }

    ordered
}
