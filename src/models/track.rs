use serde::{Deserialize, Serialize};

use crate::services::duration::format_duration;

/// A catalog track eligible for recommendation.
///
/// Only lives for the duration of a recommendation session unless the user
/// explicitly saves it somewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTrack {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    /// Length in whole seconds
    pub duration: u32,
    pub duration_formatted: String,
}

impl CandidateTrack {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        channel_title: impl Into<String>,
        thumbnail_url: impl Into<String>,
        duration: u32,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            channel_title: channel_title.into(),
            thumbnail_url: thumbnail_url.into(),
            duration,
            duration_formatted: format_duration(duration),
        }
    }

    /// Whether the track is playable and short enough to surface
    pub fn fits_duration(&self, max_duration: u32) -> bool {
        self.duration > 0 && self.duration <= max_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_formats_duration() {
        let track = CandidateTrack::new("abc", "Song", "Channel", "http://img", 273);
        assert_eq!(track.duration_formatted, "4:33");
    }

    #[test]
    fn test_fits_duration_bounds() {
        let zero = CandidateTrack::new("a", "t", "c", "u", 0);
        let exact = CandidateTrack::new("b", "t", "c", "u", 300);
        let over = CandidateTrack::new("c", "t", "c", "u", 301);

        assert!(!zero.fits_duration(300));
        assert!(exact.fits_duration(300));
        assert!(!over.fits_duration(300));
    }

    #[test]
    fn test_serializes_camel_case() {
        let track = CandidateTrack::new("abc", "Song", "Channel", "http://img", 61);
        let json = serde_json::to_value(&track).unwrap();

        assert_eq!(json["videoId"], "abc");
        assert_eq!(json["channelTitle"], "Channel");
        assert_eq!(json["thumbnailUrl"], "http://img");
        assert_eq!(json["durationFormatted"], "1:01");
    }
}
