use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse term → weight representation of a user's inferred taste.
///
/// Always replaced wholesale by a rebuild, never merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TasteVector {
    pub terms: HashMap<String, f64>,
    /// Number of listen records the vector was built from
    pub music_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl TasteVector {
    pub fn new(terms: HashMap<String, f64>, music_count: usize) -> Self {
        Self {
            terms,
            music_count,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Terms ordered by descending weight
    pub fn top_terms(&self, n: usize) -> Vec<(&str, f64)> {
        let mut terms: Vec<(&str, f64)> = self
            .terms
            .iter()
            .map(|(term, weight)| (term.as_str(), *weight))
            .collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(n);
        terms
    }
}
