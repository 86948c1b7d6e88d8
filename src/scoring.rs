//! # Priority Scoring
//!
//! `score = base × sentiment_multiplier + locality + recency + context`
//!
//! - base: sum of category weights over every detected category (unknown → 1)
//! - sentiment_multiplier: configured weight × the time profile's factor
//! - locality: fixed bonus × the profile's locality factor, local items only
//! - recency: tiered bonus on item age; a missing timestamp scores 0
//! - context: only for items whose primary category is the volatile one,
//!   tiered on the absolute 24h price change
//!
//! Every component is recorded in the item's `ScoreBreakdown`.

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::config::{ProfileWeights, SelectionConfig, TimeProfile};
use crate::context::ContextSnapshot;
use crate::item::{ContentItem, ScoreBreakdown};

/// Explicit profile wins; otherwise derive it from the local broadcast hour.
pub fn resolve_time_profile(cfg: &SelectionConfig, now: DateTime<Utc>) -> TimeProfile {
    if let Some(p) = cfg.time_profile {
        return p;
    }
    let local = now + Duration::hours(i64::from(cfg.utc_offset_hours));
    TimeProfile::for_hour(local.hour())
}

/// Tiered recency bonus. Future timestamps count as age 0.
pub fn recency_bonus(
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cfg: &SelectionConfig,
) -> f64 {
    let Some(ts) = published_at else {
        return 0.0;
    };
    let age_hours = ((now - ts).num_seconds().max(0) as f64) / 3600.0;
    let sc = &cfg.scoring;
    if age_hours < sc.fresh_hours {
        sc.fresh_bonus
    } else if age_hours < sc.recent_hours {
        sc.recent_bonus
    } else {
        0.0
    }
}

pub struct PriorityScorer<'a> {
    cfg: &'a SelectionConfig,
    profile: ProfileWeights,
    change_magnitude: Option<f64>,
    now: DateTime<Utc>,
}

impl<'a> PriorityScorer<'a> {
    pub fn new(
        cfg: &'a SelectionConfig,
        profile: TimeProfile,
        snapshot: &ContextSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            cfg,
            profile: *cfg.profiles.get(profile),
            change_magnitude: snapshot.change_magnitude(),
            now,
        }
    }

    fn context_boost(&self, item: &ContentItem) -> f64 {
        let sc = &self.cfg.scoring;
        if item.primary_category != sc.volatile_category {
            return 0.0;
        }
        match self.change_magnitude {
            Some(m) if m > sc.strong_move_pct => sc.strong_move_boost,
            Some(m) if m > sc.mild_move_pct => sc.mild_move_boost,
            _ => 0.0,
        }
    }

    pub fn breakdown(&self, item: &ContentItem) -> ScoreBreakdown {
        let base_category = item
            .categories
            .iter()
            .map(|c| self.cfg.category_weight(c))
            .sum();
        let sentiment_multiplier = self.cfg.sentiment_weight_for(item.sentiment)
            * self.profile.sentiment_factor(item.sentiment);
        let locality_bonus = if item.is_local {
            self.cfg.scoring.locality_bonus * self.profile.locality_factor
        } else {
            0.0
        };

        ScoreBreakdown {
            base_category,
            sentiment_multiplier,
            locality_bonus,
            recency_bonus: recency_bonus(item.published_at, self.now, self.cfg),
            context_boost: self.context_boost(item),
        }
    }

    pub fn score(&self, mut item: ContentItem) -> ContentItem {
        let b = self.breakdown(&item);
        item.priority_score = b.total();
        item.score_breakdown = b;
        item
    }

    pub fn score_all(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        items.into_iter().map(|it| self.score(it)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CryptoContext;
    use crate::item::Sentiment;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 13, 0, 0).unwrap()
    }

    fn crypto(change: f64) -> ContextSnapshot {
        ContextSnapshot {
            weather: None,
            crypto: Some(CryptoContext {
                price: 100_000.0,
                change_24h: change,
                formatted: String::new(),
            }),
        }
    }

    fn item(cats: &[&str]) -> ContentItem {
        let mut it = ContentItem::new("Some headline", "", "NZZ", None);
        it.categories = cats.iter().map(|c| c.to_string()).collect();
        it.primary_category = cats.first().map(|c| c.to_string()).unwrap_or_default();
        it
    }

    #[test]
    fn base_sums_all_detected_categories() {
        let cfg = SelectionConfig::default();
        let s = PriorityScorer::new(&cfg, TimeProfile::Afternoon, &ContextSnapshot::default(), now());
        let it = s.score(item(&["politics", "economy"]));
        assert_eq!(it.score_breakdown.base_category, 16.0);
        assert_eq!(it.priority_score, 16.0);
    }

    #[test]
    fn unknown_category_weighs_one() {
        let cfg = SelectionConfig::default();
        let s = PriorityScorer::new(&cfg, TimeProfile::Afternoon, &ContextSnapshot::default(), now());
        assert_eq!(s.score(item(&["general"])).priority_score, 1.0);
    }

    #[test]
    fn volatility_boost_tiers() {
        let cfg = SelectionConfig::default();
        let strong = PriorityScorer::new(&cfg, TimeProfile::Afternoon, &crypto(-8.0), now());
        let mild = PriorityScorer::new(&cfg, TimeProfile::Afternoon, &crypto(3.0), now());
        let calm = PriorityScorer::new(&cfg, TimeProfile::Afternoon, &crypto(1.0), now());
        let btc = item(&["bitcoin_crypto"]);
        assert_eq!(strong.breakdown(&btc).context_boost, 3.0);
        assert_eq!(mild.breakdown(&btc).context_boost, 1.0);
        assert_eq!(calm.breakdown(&btc).context_boost, 0.0);
        // Secondary membership does not count.
        assert_eq!(strong.breakdown(&item(&["economy", "bitcoin_crypto"])).context_boost, 0.0);
    }

    #[test]
    fn no_crypto_context_means_no_boost() {
        let cfg = SelectionConfig::default();
        let s = PriorityScorer::new(&cfg, TimeProfile::Afternoon, &ContextSnapshot::default(), now());
        assert_eq!(s.breakdown(&item(&["bitcoin_crypto"])).context_boost, 0.0);
    }

    #[test]
    fn recency_tiers_and_missing_timestamp() {
        let cfg = SelectionConfig::default();
        assert_eq!(recency_bonus(Some(now() - Duration::minutes(30)), now(), &cfg), 2.0);
        assert_eq!(recency_bonus(Some(now() - Duration::hours(3)), now(), &cfg), 1.0);
        assert_eq!(recency_bonus(Some(now() - Duration::hours(7)), now(), &cfg), 0.0);
        assert_eq!(recency_bonus(Some(now() + Duration::hours(2)), now(), &cfg), 2.0);
        assert_eq!(recency_bonus(None, now(), &cfg), 0.0);
    }

    #[test]
    fn morning_profile_lifts_positive_and_local() {
        let cfg = SelectionConfig::default();
        let s = PriorityScorer::new(&cfg, TimeProfile::Morning, &ContextSnapshot::default(), now());
        let mut it = item(&["local"]);
        it.sentiment = Sentiment::Positive;
        it.is_local = true;
        let b = s.breakdown(&it);
        assert!((b.sentiment_multiplier - 1.3 * 1.2).abs() < 1e-9);
        assert!((b.locality_bonus - 2.2).abs() < 1e-9);
    }

    #[test]
    fn profile_derived_from_local_hour() {
        let cfg = SelectionConfig::default();
        // 05:30 UTC is 06:30 at +1.
        let early = Utc.with_ymd_and_hms(2025, 3, 14, 5, 30, 0).unwrap();
        assert_eq!(resolve_time_profile(&cfg, early), TimeProfile::Morning);

        let fixed = SelectionConfig {
            time_profile: Some(TimeProfile::Night),
            ..SelectionConfig::default()
        };
        assert_eq!(resolve_time_profile(&fixed, early), TimeProfile::Night);
    }
}
