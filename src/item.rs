//! # Content Item
//! Canonical item shape shared by every pipeline stage.
//!
//! An item is created by the normalizer, gets its fingerprint at the same
//! moment, is enriched by the categorizer and finally receives a priority
//! score. The fingerprint never changes after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Sentinel category for items that match no keyword table entry.
pub const GENERAL_CATEGORY: &str = "general";

/// Length of the hex fingerprint (8 bytes of SHA-256).
pub const FINGERPRINT_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A degraded path an item went through. Items without any fallback count
/// towards the normalization component of the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    MissingSource,
    UnparsedTimestamp,
    GeneralCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub hits: u32,
}

/// Per-item explanation of how `priority_score` was assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_category: f64,
    pub sentiment_multiplier: f64,
    pub locality_bonus: f64,
    pub recency_bonus: f64,
    pub context_boost: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        let raw = self.base_category * self.sentiment_multiplier
            + self.locality_bonus
            + self.recency_bonus
            + self.context_boost;
        raw.max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    pub body: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Detected categories in detection (table) order, no repeats.
    pub categories: Vec<String>,
    pub primary_category: String,
    #[serde(default)]
    pub category_scores: Vec<CategoryScore>,
    pub sentiment: Sentiment,
    pub is_local: bool,
    pub priority_score: f64,
    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,
    /// Optional upstream priority hint; only used to order deduplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<Fallback>,
    fingerprint: String,
}

impl ContentItem {
    /// Build a fresh, uncategorized item. The fingerprint is computed here
    /// and stays fixed for the lifetime of the item.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        source: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        let title = title.into();
        let body = body.into();
        let fingerprint = fingerprint(&title, &body);
        Self {
            title,
            body,
            source: source.into(),
            published_at,
            categories: Vec::new(),
            primary_category: GENERAL_CATEGORY.to_string(),
            category_scores: Vec::new(),
            sentiment: Sentiment::Neutral,
            is_local: false,
            priority_score: 0.0,
            score_breakdown: ScoreBreakdown::default(),
            source_priority: None,
            fallbacks: Vec::new(),
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Lowercased `title + " " + body`, the text every keyword table runs on.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.body).to_lowercase()
    }

    pub fn record_fallback(&mut self, fb: Fallback) {
        if !self.fallbacks.contains(&fb) {
            self.fallbacks.push(fb);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_for_fingerprint(text: &str) -> String {
    let folded: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 16-hex-char digest of the normalized `title + " " + body`.
pub fn fingerprint(title: &str, body: &str) -> String {
    let normalized = normalize_for_fingerprint(&format!("{title} {body}"));
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(FINGERPRINT_LEN);
    for b in digest.iter().take(FINGERPRINT_LEN / 2) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
