use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    models::{scoring::KeywordPayload, scoring::PlayedHistoryEntry, ListenRecord, Mood},
    services::{call_collaborator, providers::ScoringProvider},
};

/// Listen records required before personalized phrases are requested
pub const MIN_HISTORY_FOR_PERSONALIZATION: usize = 5;

/// Phrases sampled from each language of the fallback table
pub const FALLBACK_PHRASES_PER_LANGUAGE: usize = 2;

const FALLBACK_LANGUAGES: usize = 3;

/// Fixed per-mood search phrases: English, Korean, Japanese
fn phrase_table(mood: Mood) -> [[&'static str; 5]; FALLBACK_LANGUAGES] {
    match mood {
        Mood::Happy => [
            [
                "upbeat music",
                "happy songs",
                "feel good music",
                "cheerful music",
                "positive vibes music",
            ],
            ["신나는 노래", "기분 좋은 음악", "즐거운 노래", "행복한 노래", "밝은 음악"],
            ["楽しい音楽", "明るい曲", "ハッピーソング", "元気な音楽", "ポジティブミュージック"],
        ],
        Mood::Love => [
            [
                "love songs",
                "romantic music",
                "ballad love",
                "sweet music",
                "emotional love songs",
            ],
            ["사랑 노래", "로맨틱한 음악", "달달한 노래", "연애 노래", "감성 발라드"],
            ["ラブソング", "ロマンティック音楽", "恋愛ソング", "甘い音楽", "感動的な愛の歌"],
        ],
        Mood::Sleep => [
            [
                "relaxing music",
                "calm music",
                "sleep music",
                "peaceful music",
                "meditation music",
            ],
            ["잔잔한 음악", "편안한 노래", "수면 음악", "조용한 노래", "명상 음악"],
            ["リラックス音楽", "癒しの音楽", "睡眠音楽", "穏やかな音楽", "瞑想音楽"],
        ],
        Mood::Crying => [
            [
                "sad music",
                "melancholy songs",
                "emotional ballad",
                "heartbreak songs",
                "tearjerker music",
            ],
            ["슬픈 노래", "우울한 음악", "이별 노래", "감성 발라드", "눈물 나는 노래"],
            ["悲しい音楽", "切ない曲", "失恋ソング", "メランコリー音楽", "涙の歌"],
        ],
        Mood::Angry => [
            [
                "rock music",
                "powerful songs",
                "intense music",
                "heavy metal",
                "aggressive music",
            ],
            ["락 음악", "강렬한 노래", "힙합 음악", "파워풀한 노래", "분노 해소 음악"],
            ["ロック音楽", "激しい音楽", "ヘビーメタル", "パワフルな曲", "アグレッシブ音楽"],
        ],
        Mood::Excited => [
            [
                "energetic music",
                "party music",
                "hype songs",
                "pump up music",
                "dance music",
            ],
            ["신나는 댄스", "파티 음악", "흥겨운 노래", "텐션 업 음악", "클럽 음악"],
            ["エネルギッシュ音楽", "パーティー音楽", "ダンスミュージック", "ハイプ音楽", "盛り上がる曲"],
        ],
    }
}

/// Samples `per_language` phrases from each language without replacement
pub fn fallback_phrases(mood: Mood, per_language: usize, rng: &mut StdRng) -> Vec<String> {
    phrase_table(mood)
        .iter()
        .flat_map(|language| {
            language
                .choose_multiple(rng, per_language)
                .map(|phrase| phrase.to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordSource {
    Personalized,
    Fallback,
}

/// Ordered search phrases for one fetch. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSet {
    pub phrases: Vec<String>,
    pub source: KeywordSource,
}

/// Turns a mood and recent listening history into search phrases
pub struct KeywordGenerator {
    scoring: Arc<dyn ScoringProvider>,
    rng: Mutex<StdRng>,
    timeout: Duration,
}

impl KeywordGenerator {
    /// A `seed` makes the fallback sampling reproducible
    pub fn new(scoring: Arc<dyn ScoringProvider>, timeout: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            scoring,
            rng: Mutex::new(rng),
            timeout,
        }
    }

    /// `history` is newest first. Collaborator failures fall back to the
    /// phrase table and are never returned.
    pub async fn generate(
        &self,
        mood: Mood,
        history: &[ListenRecord],
        cancel: &CancellationToken,
    ) -> KeywordSet {
        if history.len() >= MIN_HISTORY_FOR_PERSONALIZATION {
            let payload = KeywordPayload {
                emotion: mood.to_string(),
                played_history: history.iter().map(PlayedHistoryEntry::from).collect(),
            };

            match call_collaborator(
                self.timeout,
                cancel,
                self.scoring.generate_keywords(payload),
            )
            .await
            {
                Ok(keywords) => {
                    let phrases: Vec<String> = keywords
                        .into_iter()
                        .map(|k| k.trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect();

                    if !phrases.is_empty() {
                        tracing::debug!(
                            mood = %mood,
                            phrases = phrases.len(),
                            provider = self.scoring.name(),
                            "Using personalized search phrases"
                        );
                        return KeywordSet {
                            phrases,
                            source: KeywordSource::Personalized,
                        };
                    }

                    tracing::debug!(mood = %mood, "Personalized phrase list was empty");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        mood = %mood,
                        provider = self.scoring.name(),
                        "Keyword personalization failed, using phrase table"
                    );
                }
            }
        }

        KeywordSet {
            phrases: self.sample_fallback(mood),
            source: KeywordSource::Fallback,
        }
    }

    fn sample_fallback(&self, mood: Mood) -> Vec<String> {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fallback_phrases(mood, FALLBACK_PHRASES_PER_LANGUAGE, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, services::providers::MockScoringProvider};
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn history(n: usize) -> Vec<ListenRecord> {
        (0..n)
            .map(|i| ListenRecord {
                id: Uuid::new_v4(),
                user_id: "u1".to_string(),
                mood_id: Uuid::new_v4(),
                mood: Mood::Happy,
                video_id: format!("vid{}", i),
                title: format!("Song {}", i),
                channel_title: "Channel".to_string(),
                thumbnail_url: "http://img".to_string(),
                played_at: Utc::now(),
            })
            .collect()
    }

    fn generator(mock: MockScoringProvider, seed: Option<u64>) -> KeywordGenerator {
        KeywordGenerator::new(Arc::new(mock), Duration::from_secs(5), seed)
    }

    #[tokio::test]
    async fn test_happy_with_empty_history_yields_six_fallback_phrases() {
        let mut mock = MockScoringProvider::new();
        mock.expect_generate_keywords().times(0);
        mock.expect_name().return_const("mock");

        let keywords = generator(mock, Some(1))
            .generate(Mood::Happy, &[], &CancellationToken::new())
            .await;

        assert_eq!(keywords.source, KeywordSource::Fallback);
        assert_eq!(keywords.phrases.len(), 6);
        let unique: HashSet<_> = keywords.phrases.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[tokio::test]
    async fn test_short_history_never_calls_personalization() {
        let mut mock = MockScoringProvider::new();
        mock.expect_generate_keywords().times(0);
        mock.expect_name().return_const("mock");

        let keywords = generator(mock, None)
            .generate(Mood::Sleep, &history(4), &CancellationToken::new())
            .await;

        assert_eq!(keywords.source, KeywordSource::Fallback);
    }

    #[tokio::test]
    async fn test_personalized_phrases_used_verbatim() {
        let mut mock = MockScoringProvider::new();
        mock.expect_generate_keywords()
            .withf(|payload| payload.emotion == "love" && payload.played_history.len() == 5)
            .times(1)
            .returning(|_| Ok(vec!["city pop".to_string(), "acoustic love".to_string()]));
        mock.expect_name().return_const("mock");

        let keywords = generator(mock, None)
            .generate(Mood::Love, &history(5), &CancellationToken::new())
            .await;

        assert_eq!(keywords.source, KeywordSource::Personalized);
        assert_eq!(keywords.phrases, vec!["city pop", "acoustic love"]);
    }

    #[tokio::test]
    async fn test_collaborator_failure_falls_back() {
        let mut mock = MockScoringProvider::new();
        mock.expect_generate_keywords()
            .times(1)
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));
        mock.expect_name().return_const("mock");

        let keywords = generator(mock, None)
            .generate(Mood::Angry, &history(8), &CancellationToken::new())
            .await;

        assert_eq!(keywords.source, KeywordSource::Fallback);
        assert_eq!(keywords.phrases.len(), 6);
    }

    #[tokio::test]
    async fn test_empty_personalized_list_falls_back() {
        let mut mock = MockScoringProvider::new();
        mock.expect_generate_keywords()
            .times(1)
            .returning(|_| Ok(vec!["  ".to_string()]));
        mock.expect_name().return_const("mock");

        let keywords = generator(mock, None)
            .generate(Mood::Excited, &history(6), &CancellationToken::new())
            .await;

        assert_eq!(keywords.source, KeywordSource::Fallback);
    }

    #[tokio::test]
    async fn test_seeded_generators_agree() {
        let mut first = MockScoringProvider::new();
        first.expect_name().return_const("mock");
        let mut second = MockScoringProvider::new();
        second.expect_name().return_const("mock");

        let cancel = CancellationToken::new();
        let a = generator(first, Some(42))
            .generate(Mood::Crying, &[], &cancel)
            .await;
        let b = generator(second, Some(42))
            .generate(Mood::Crying, &[], &cancel)
            .await;

        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_samples_two_per_language() {
        let mut rng = StdRng::seed_from_u64(7);
        let phrases = fallback_phrases(Mood::Love, 2, &mut rng);
        let table = phrase_table(Mood::Love);

        assert_eq!(phrases.len(), 6);
        for (language, sampled) in table.iter().zip(phrases.chunks(2)) {
            for phrase in sampled {
                assert!(language.contains(&phrase.as_str()));
            }
        }
    }

    #[test]
    fn test_every_mood_has_a_full_table() {
        for mood in Mood::ALL {
            for language in phrase_table(mood) {
                assert_eq!(language.len(), 5);
                assert!(language.iter().all(|p| !p.is_empty()));
            }
        }
    }
}
