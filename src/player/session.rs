use std::{collections::HashSet, fmt::Display};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CandidateTrack, Mood};

/// Identity of one player session: a user and one mood selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub user_id: String,
    pub mood_id: Uuid,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, mood_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            mood_id,
        }
    }
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.user_id, self.mood_id)
    }
}

/// Candidate list and playback cursor for one session.
///
/// Owned by the player controller and handed back and forth explicitly; the
/// cached copy is the source of truth between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSession {
    pub key: SessionKey,
    pub mood: Mood,
    pub tracks: Vec<CandidateTrack>,
    pub cursor: usize,
    /// Set once a load-more came back empty; no further extension is tried
    #[serde(default)]
    pub exhausted: bool,
}

impl PlayerSession {
    pub fn new(key: SessionKey, mood: Mood, tracks: Vec<CandidateTrack>) -> Self {
        Self {
            key,
            mood,
            tracks,
            cursor: 0,
            exhausted: false,
        }
    }

    /// Ids already surfaced in this session
    pub fn exclusion_set(&self) -> HashSet<String> {
        self.tracks.iter().map(|t| t.video_id.clone()).collect()
    }

    /// Tracks queued after the cursor
    pub fn remaining(&self) -> usize {
        self.tracks.len().saturating_sub(self.cursor + 1)
    }

    /// Appends after the existing prefix, skipping ids already present.
    /// Returns how many tracks were added.
    pub fn append_tracks(&mut self, tracks: Vec<CandidateTrack>) -> usize {
        let mut seen = self.exclusion_set();
        let before = self.tracks.len();

        self.tracks.extend(
            tracks
                .into_iter()
                .filter(|t| seen.insert(t.video_id.clone())),
        );

        self.tracks.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(ids: &[&str]) -> Vec<CandidateTrack> {
        ids.iter()
            .map(|id| CandidateTrack::new(*id, "t", "c", "u", 100))
            .collect()
    }

    fn session(ids: &[&str]) -> PlayerSession {
        PlayerSession::new(SessionKey::new("u1", Uuid::nil()), Mood::Happy, tracks(ids))
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new("u1", Uuid::nil());
        assert_eq!(
            key.to_string(),
            "u1:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_append_keeps_prefix_and_skips_duplicates() {
        let mut session = session(&["a", "b"]);
        let added = session.append_tracks(tracks(&["b", "c", "c", "d"]));

        assert_eq!(added, 2);
        let ids: Vec<_> = session.tracks.iter().map(|t| t.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_exclusion_set_covers_every_track() {
        let session = session(&["a", "b", "c"]);
        let exclusion = session.exclusion_set();

        assert!(session.tracks.iter().all(|t| exclusion.contains(&t.video_id)));
    }

    #[test]
    fn test_remaining_after_cursor() {
        let mut session = session(&["a", "b", "c"]);
        assert_eq!(session.remaining(), 2);
        session.cursor = 2;
        assert_eq!(session.remaining(), 0);
    }
}
