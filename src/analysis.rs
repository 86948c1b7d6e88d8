//! Distribution summaries over a set of items: content focus of a selection
//! and the sentiment/topic breakdown used by the analyze-only path.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::SelectionConfig;
use crate::context::ContextSnapshot;
use crate::item::{ContentItem, Sentiment, GENERAL_CATEGORY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFocus {
    pub focus: String,
    /// Share of the selection in the focus category, 0..=1.
    pub confidence: f64,
    pub secondary: Option<String>,
    pub local_ratio: f64,
    /// Price context was available and the volatile category made it in.
    pub volatile_emphasis: bool,
}

/// Primary categories ranked by count; ties keep first appearance.
fn ranked_categories(items: &[ContentItem]) -> Vec<(&str, usize)> {
    let mut ranked: Vec<(&str, usize)> = Vec::new();
    for it in items {
        match ranked.iter_mut().find(|(c, _)| *c == it.primary_category) {
            Some((_, n)) => *n += 1,
            None => ranked.push((it.primary_category.as_str(), 1)),
        }
    }
    // sort_by is stable, so first-seen order survives among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

pub fn content_focus(
    selected: &[ContentItem],
    snapshot: &ContextSnapshot,
    volatile_category: &str,
) -> ContentFocus {
    if selected.is_empty() {
        return ContentFocus {
            focus: GENERAL_CATEGORY.to_string(),
            confidence: 0.0,
            secondary: None,
            local_ratio: 0.0,
            volatile_emphasis: false,
        };
    }
    let n = selected.len() as f64;
    let ranked = ranked_categories(selected);
    let (focus, count) = ranked[0];
    let local = selected.iter().filter(|i| i.is_local).count() as f64;

    ContentFocus {
        focus: focus.to_string(),
        confidence: count as f64 / n,
        secondary: ranked.get(1).map(|(c, _)| c.to_string()),
        local_ratio: local / n,
        volatile_emphasis: snapshot.crypto.is_some()
            && ranked.iter().any(|(c, _)| *c == volatile_category),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub count: usize,
    /// Percentage rounded to one decimal.
    pub percentage: f64,
}

fn share(count: usize, total: usize) -> Share {
    let percentage = if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64 * 1000.0).round() / 10.0
    };
    Share { count, percentage }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: Share,
    pub neutral: Share,
    pub negative: Share,
    pub positive_ratio: f64,
    /// 1.0 when half the items are positive, 0.5 at either extreme.
    pub balance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicShare {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
    pub priority: f64,
    pub weighted_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub total: usize,
    pub sentiment: SentimentDistribution,
    /// Sorted by weighted score, highest first.
    pub topics: Vec<TopicShare>,
}

pub fn sentiment_distribution(items: &[ContentItem]) -> SentimentDistribution {
    let mut counts: HashMap<Sentiment, usize> = HashMap::new();
    for it in items {
        *counts.entry(it.sentiment).or_insert(0) += 1;
    }
    let total = items.len();
    let get = |s: Sentiment| counts.get(&s).copied().unwrap_or(0);
    let positive = share(get(Sentiment::Positive), total);
    let positive_ratio = positive.percentage / 100.0;
    SentimentDistribution {
        positive,
        neutral: share(get(Sentiment::Neutral), total),
        negative: share(get(Sentiment::Negative), total),
        positive_ratio,
        balance_score: 1.0 - (0.5 - positive_ratio).abs(),
    }
}

pub fn topic_distribution(items: &[ContentItem], cfg: &SelectionConfig) -> Vec<TopicShare> {
    let total = items.len();
    let mut topics: Vec<TopicShare> = ranked_categories(items)
        .into_iter()
        .map(|(cat, count)| {
            let priority = cfg.category_weight(cat);
            TopicShare {
                category: cat.to_string(),
                count,
                percentage: share(count, total).percentage,
                priority,
                weighted_score: count as f64 * priority,
            }
        })
        .collect();
    topics.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    topics
}

/// Sentiment and topic breakdown without running a selection.
pub fn analyze(items: &[ContentItem], cfg: &SelectionConfig) -> DistributionReport {
    DistributionReport {
        total: items.len(),
        sentiment: sentiment_distribution(items),
        topics: topic_distribution(items, cfg),
    }
}
