//! Aggregate quality score of a finished selection. Informational only.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::context::ContextSnapshot;
use crate::item::ContentItem;

const STRENGTH_CAP: f64 = 40.0;
const STRENGTH_SCALE: f64 = 4.0;
const DIVERSITY_CAP: f64 = 20.0;
const CONTEXT_POINTS: f64 = 10.0;
const CONTEXT_CAP: f64 = 20.0;
const NORMALIZATION_CAP: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub news_strength: f64,
    pub category_diversity: f64,
    pub context_integration: f64,
    pub normalization: f64,
    /// Sum of the four components, within [0, 100].
    pub total: f64,
}

pub struct QualityAssessor;

impl QualityAssessor {
    pub fn assess(selected: &[ContentItem], snapshot: &ContextSnapshot) -> QualityBreakdown {
        if selected.is_empty() {
            return QualityBreakdown::default();
        }
        let n = selected.len() as f64;

        let avg = selected.iter().map(|i| i.priority_score).sum::<f64>() / n;
        let news_strength = (avg * STRENGTH_SCALE).clamp(0.0, STRENGTH_CAP);

        let distinct: HashSet<&str> = selected
            .iter()
            .map(|i| i.primary_category.as_str())
            .collect();
        let category_diversity = (distinct.len() as f64 / n * DIVERSITY_CAP).min(DIVERSITY_CAP);

        let available = [snapshot.weather.is_some(), snapshot.crypto.is_some()]
            .into_iter()
            .filter(|x| *x)
            .count() as f64;
        let context_integration = (available * CONTEXT_POINTS).min(CONTEXT_CAP);

        let clean = selected.iter().filter(|i| i.is_clean()).count() as f64;
        let normalization = (clean / n * NORMALIZATION_CAP).min(NORMALIZATION_CAP);

        let total = (news_strength + category_diversity + context_integration + normalization)
            .clamp(0.0, 100.0);

        QualityBreakdown {
            news_strength,
            category_diversity,
            context_integration,
            normalization,
            total,
        }
    }
}
