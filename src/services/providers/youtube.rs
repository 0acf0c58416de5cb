/// YouTube Data API v3 catalog provider
///
/// API Flow:
/// 1. Search: /search → video ids in relevance order (100 quota units per call)
/// 2. Metadata: /videos?part=contentDetails,snippet → duration token + snippet
///    (1 unit per call, up to 50 ids)
///
/// Search results are cached per (phrase, size, bucket, region) because search
/// is by far the most expensive call against the daily quota.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        youtube::{ApiErrorResponse, SearchListResponse, VideoDetails, VideoListResponse},
        DurationBucket,
    },
    services::{
        duration::parse_duration,
        providers::{CatalogProvider, SearchQuery},
    },
};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const MAX_SEARCH_RESULTS: u32 = 50;
const MAX_IDS_PER_LOOKUP: usize = 50;
/// YouTube's "Music" video category
const MUSIC_CATEGORY_ID: &str = "10";

#[derive(Clone)]
pub struct YouTubeProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    region_code: String,
    duration_bucket: DurationBucket,
    cache: Cache,
}

impl YouTubeProvider {
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        region_code: String,
        duration_bucket: DurationBucket,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            region_code,
            duration_bucket,
            cache,
        })
    }

    fn search_cache_key(&self, phrase: &str, max_results: u32) -> CacheKey {
        CacheKey::CatalogSearch(format!(
            "{}|{}|{}|{}",
            phrase.trim(),
            max_results,
            self.duration_bucket.as_str(),
            self.region_code
        ))
    }

    async fn fetch_search_ids(&self, phrase: &str, max_results: u32) -> AppResult<Vec<String>> {
        let url = format!("{}/search", self.api_url);
        let max_results = max_results.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("part", "snippet"),
                ("q", phrase),
                ("type", "video"),
                ("videoCategoryId", MUSIC_CATEGORY_ID),
                ("videoDuration", self.duration_bucket.as_str()),
                ("videoEmbeddable", "true"),
                ("videoSyndicated", "true"),
                ("maxResults", max_results.as_str()),
                ("order", "relevance"),
                ("safeSearch", "none"),
                ("regionCode", self.region_code.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let results: SearchListResponse = response.json().await?;
        let ids: Vec<String> = results
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        tracing::info!(
            phrase = %phrase,
            results = ids.len(),
            provider = "youtube",
            "Catalog search completed"
        );

        Ok(ids)
    }

    async fn fetch_details_chunk(&self, video_ids: &[String]) -> AppResult<Vec<VideoDetails>> {
        let url = format!("{}/videos", self.api_url);
        let ids = video_ids.join(",");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("part", "contentDetails,snippet"),
                ("id", ids.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let videos: VideoListResponse = response.json().await?;

        Ok(videos
            .items
            .into_iter()
            .map(|item| VideoDetails {
                duration: parse_duration(&item.content_details.duration),
                thumbnail_url: item.snippet.thumbnails.best_url(),
                video_id: item.id,
                title: item.snippet.title,
                channel_title: item.snippet.channel_title,
            })
            .collect())
    }
}

/// Maps a non-success catalog response to an error, separating quota
/// exhaustion from other failures
fn classify_error(status: StatusCode, body: &str) -> AppError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AppError::QuotaExhausted(format!("YouTube API throttled: {}", body));
    }

    if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(body) {
        if parsed.error.is_quota_error() {
            return AppError::QuotaExhausted(parsed.error.message);
        }
    }

    AppError::ExternalApi(format!("YouTube API returned status {}: {}", status, body))
}

#[async_trait::async_trait]
impl CatalogProvider for YouTubeProvider {
    async fn search_videos(&self, query: &SearchQuery) -> AppResult<Vec<String>> {
        let phrase = query.phrase.trim();
        if phrase.is_empty() {
            return Err(AppError::InvalidInput(
                "Search phrase cannot be empty".to_string(),
            ));
        }

        let max_results = query.max_results.clamp(1, MAX_SEARCH_RESULTS);

        cached!(
            self.cache,
            self.search_cache_key(phrase, max_results),
            SEARCH_CACHE_TTL,
            self.fetch_search_ids(phrase, max_results)
        )
    }

    async fn fetch_video_details(&self, video_ids: &[String]) -> AppResult<Vec<VideoDetails>> {
        let mut details = Vec::with_capacity(video_ids.len());

        for chunk in video_ids.chunks(MAX_IDS_PER_LOOKUP) {
            details.extend(self.fetch_details_chunk(chunk).await?);
        }

        tracing::debug!(
            requested = video_ids.len(),
            returned = details.len(),
            provider = "youtube",
            "Video details fetched"
        );

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_provider() -> YouTubeProvider {
        let client = redis::Client::open("redis://localhost:6379").unwrap();
        let (cache, _handle) = Cache::new(client).await;

        YouTubeProvider::new(
            cache,
            "test_key".to_string(),
            "http://test.local".to_string(),
            "KR".to_string(),
            DurationBucket::Medium,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_cache_key_includes_hints() {
        let provider = create_test_provider().await;
        let key = provider.search_cache_key("  Happy Songs ", 20);
        assert_eq!(format!("{}", key), "search:happy songs|20|medium|kr");
    }

    #[tokio::test]
    async fn test_empty_phrase_rejected_without_network() {
        let provider = create_test_provider().await;
        let query = SearchQuery {
            phrase: "   ".to_string(),
            max_results: 10,
        };

        let result = provider.search_videos(&query).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_no_ids_means_no_lookup() {
        let provider = create_test_provider().await;
        let details = provider.fetch_video_details(&[]).await.unwrap();
        assert!(details.is_empty());
    }

    #[test]
    fn test_classify_quota_exceeded() {
        let body = r#"{"error": {"code": 403, "message": "quota", "errors": [{"reason": "quotaExceeded"}]}}"#;
        let error = classify_error(StatusCode::FORBIDDEN, body);
        assert!(matches!(error, AppError::QuotaExhausted(msg) if msg == "quota"));
    }

    #[test]
    fn test_classify_too_many_requests() {
        let error = classify_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(error, AppError::QuotaExhausted(_)));
    }

    #[test]
    fn test_classify_other_errors() {
        let body = r#"{"error": {"code": 400, "message": "bad", "errors": [{"reason": "invalidParameter"}]}}"#;
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, body),
            AppError::ExternalApi(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>"),
            AppError::ExternalApi(_)
        ));
    }
}
