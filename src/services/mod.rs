use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

pub mod aggregator;
pub mod duration;
pub mod keywords;
pub mod profile;
pub mod providers;
pub mod ranker;
pub mod recommendations;

pub use aggregator::CandidateSearchAggregator;
pub use keywords::{KeywordGenerator, KeywordSet, KeywordSource};
pub use profile::{ProfileRebuild, ProfileService};
pub use ranker::{RankOutcome, RecommendationRanker};
pub use recommendations::{Recommendation, RecommendationService};

/// Runs one outbound collaborator call under a deadline and a cancellation
/// token.
///
/// Cancellation wins over completion when both are ready, so a result that
/// arrives after the caller navigated away is discarded.
pub async fn call_collaborator<T, F>(
    timeout: Duration,
    cancel: &CancellationToken,
    call: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        outcome = tokio::time::timeout(timeout, call) => match outcome {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "Collaborator did not answer within {:?}",
                timeout
            ))),
        },
    }
}
