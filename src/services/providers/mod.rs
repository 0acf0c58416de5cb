/// External collaborator abstraction
///
/// The pipeline talks to two services it does not own: a video catalog
/// (search + batch metadata) and a scoring/profiling service (ranking, taste
/// vectors, personalized search phrases). Both sit behind traits so the
/// pipeline can run against fakes.
use crate::{
    error::AppResult,
    models::{
        scoring::{KeywordPayload, RecommendData, RecommendPayload},
        youtube::VideoDetails,
    },
};

pub mod scoring;
pub mod youtube;

/// Parameters of one catalog search. Category, region and duration-bucket
/// hints are fixed per provider instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub phrase: String,
    pub max_results: u32,
}

/// Video search and metadata collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Searches embeddable, syndicated music videos and returns their ids in
    /// relevance order
    async fn search_videos(&self, query: &SearchQuery) -> AppResult<Vec<String>>;

    /// Batch metadata lookup with durations already parsed to seconds
    async fn fetch_video_details(&self, video_ids: &[String]) -> AppResult<Vec<VideoDetails>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Scoring / profiling collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Ranks a candidate batch against the user's history. The response also
    /// carries the taste vector rebuilt from that history.
    async fn recommend(&self, payload: RecommendPayload) -> AppResult<RecommendData>;

    /// Personalized search phrases; an empty list means "no opinion"
    async fn generate_keywords(&self, payload: KeywordPayload) -> AppResult<Vec<String>>;

    fn name(&self) -> &'static str;
}
