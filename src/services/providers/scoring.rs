/// HTTP client for the scoring/profiling service
///
/// Endpoints:
/// - POST /recommend          → ranked candidates + rebuilt taste vector
/// - POST /generate-keywords  → personalized search phrases
///
/// Both answer with a `{success, message, data}` envelope. `success: false`
/// (or a non-2xx status) is reported as `ExternalApi` so callers apply their
/// fallback.
use crate::{
    error::{AppError, AppResult},
    models::scoring::{
        KeywordData, KeywordPayload, RecommendData, RecommendPayload, ScoringEnvelope,
    },
    services::providers::ScoringProvider,
};
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct HttpScoringProvider {
    http_client: HttpClient,
    api_url: String,
}

impl HttpScoringProvider {
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self.http_client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Scoring service returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let envelope: ScoringEnvelope<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize scoring service response"
            );
            AppError::ExternalApi(format!("Failed to parse scoring response: {}", e))
        })?;

        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope<T>(envelope: ScoringEnvelope<T>) -> AppResult<T> {
    if !envelope.success {
        return Err(AppError::ExternalApi(format!(
            "Scoring service reported failure: {}",
            envelope.message.unwrap_or_default()
        )));
    }

    envelope
        .data
        .ok_or_else(|| AppError::ExternalApi("Scoring response missing data".to_string()))
}

#[async_trait::async_trait]
impl ScoringProvider for HttpScoringProvider {
    async fn recommend(&self, payload: RecommendPayload) -> AppResult<RecommendData> {
        let data: RecommendData = self.post("/recommend", &payload).await?;

        tracing::info!(
            user_id = %payload.user_id,
            candidates = payload.candidate_music.len(),
            ranked = data.recommended_music.len(),
            profile_size = data.user_profile_size.unwrap_or(0),
            provider = "scoring",
            "Ranking completed"
        );

        Ok(data)
    }

    async fn generate_keywords(&self, payload: KeywordPayload) -> AppResult<Vec<String>> {
        let data: KeywordData = self.post("/generate-keywords", &payload).await?;

        tracing::info!(
            emotion = %payload.emotion,
            keywords = data.keywords.len(),
            provider = "scoring",
            "Keyword generation completed"
        );

        Ok(data.keywords)
    }

    fn name(&self) -> &'static str {
        "scoring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_successful_envelope() {
        let envelope = ScoringEnvelope {
            success: true,
            message: None,
            data: Some(KeywordData {
                keywords: vec!["lofi".to_string()],
            }),
        };
        assert_eq!(unwrap_envelope(envelope).unwrap().keywords, vec!["lofi"]);
    }

    #[test]
    fn test_unwrap_failed_envelope() {
        let envelope: ScoringEnvelope<KeywordData> = ScoringEnvelope {
            success: false,
            message: Some("boom".to_string()),
            data: None,
        };
        let error = unwrap_envelope(envelope).unwrap_err();
        assert!(matches!(error, AppError::ExternalApi(msg) if msg.contains("boom")));
    }

    #[test]
    fn test_unwrap_envelope_missing_data() {
        let envelope: ScoringEnvelope<RecommendData> = ScoringEnvelope {
            success: true,
            message: None,
            data: None,
        };
        assert!(unwrap_envelope(envelope).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider =
            HttpScoringProvider::new("http://localhost:5000/".to_string(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.api_url, "http://localhost:5000");
    }
}
