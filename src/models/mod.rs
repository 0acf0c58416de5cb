use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod api;
pub mod history;
pub mod profile;
pub mod scoring;
pub mod track;
pub mod youtube;

pub use api::*;
pub use history::{ListenRecord, MoodRecord, NewListenRecord};
pub use profile::TasteVector;
pub use track::CandidateTrack;

/// The fixed set of moods a user can pick to seed a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Love,
    Sleep,
    Crying,
    Angry,
    Excited,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Love,
        Mood::Sleep,
        Mood::Crying,
        Mood::Angry,
        Mood::Excited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Love => "love",
            Mood::Sleep => "sleep",
            Mood::Crying => "crying",
            Mood::Angry => "angry",
            Mood::Excited => "excited",
        }
    }

    /// Glyph stored alongside every mood record
    pub fn glyph(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Love => "🥰",
            Mood::Sleep => "😴",
            Mood::Crying => "😢",
            Mood::Angry => "😠",
            Mood::Excited => "🤩",
        }
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid mood: {}. Valid moods are: happy, love, sleep, crying, angry, excited",
                    s
                )
            })
    }
}

/// Catalog search duration hint (YouTube `videoDuration`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBucket {
    Any,
    Short,
    Medium,
    Long,
}

impl DurationBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationBucket::Any => "any",
            DurationBucket::Short => "short",
            DurationBucket::Medium => "medium",
            DurationBucket::Long => "long",
        }
    }
}
