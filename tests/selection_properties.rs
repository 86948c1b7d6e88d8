// tests/selection_properties.rs
use broadcast_selector::config::TimeProfile;
use broadcast_selector::context::{ContextSnapshot, CryptoContext};
use broadcast_selector::diversity::{category_distribution, DiversitySelector};
use broadcast_selector::item::{ContentItem, Sentiment};
use broadcast_selector::scoring::PriorityScorer;
use broadcast_selector::SelectionConfig;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

const CATEGORIES: [&str; 6] = [
    "bitcoin_crypto",
    "local",
    "breaking",
    "technology",
    "sports",
    "general",
];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 13, 0, 0).unwrap()
}

fn random_items(rng: &mut StdRng, n: usize) -> Vec<ContentItem> {
    (0..n)
        .map(|i| {
            let cat = *CATEGORIES.choose(rng).unwrap();
            let mut it = ContentItem::new(format!("story {i} about {cat}"), "", "Wire", None);
            it.categories = vec![cat.to_string()];
            it.primary_category = cat.to_string();
            it.priority_score = rng.random_range(0.0..20.0);
            it
        })
        .collect()
}

#[test]
fn cap_and_size_bounds_hold_for_random_batches() {
    let seeds: Vec<String> = ["bitcoin_crypto", "local", "breaking", "technology"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    // seeded for determinism
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..300 {
        let n = rng.random_range(0..25);
        let target = rng.random_range(0..8);
        let cap = if rng.random_bool(0.5) {
            Some(rng.random_range(1..4))
        } else {
            None
        };
        let items = random_items(&mut rng, n);

        let selected = DiversitySelector::new(target, cap, &seeds).select(items);

        assert!(selected.len() <= target);
        match cap {
            Some(c) => {
                for (cat, count) in category_distribution(&selected) {
                    assert!(count <= c, "{cat}: {count} > cap {c}");
                }
            }
            None => assert_eq!(selected.len(), target.min(n)),
        }
        assert!(selected
            .windows(2)
            .all(|w| w[0].priority_score >= w[1].priority_score));
    }
}

#[test]
fn more_recent_never_scores_lower() {
    let cfg = SelectionConfig::default();
    let snap = ContextSnapshot {
        weather: None,
        crypto: Some(CryptoContext {
            price: 100_000.0,
            change_24h: 3.0,
            formatted: String::new(),
        }),
    };
    let scorer = PriorityScorer::new(&cfg, TimeProfile::Morning, &snap, now());

    let at_age = |minutes: i64| {
        let mut it = ContentItem::new(
            "Bitcoin rally in Zurich",
            "",
            "Wire",
            Some(now() - Duration::minutes(minutes)),
        );
        it.categories = vec!["bitcoin_crypto".into(), "local".into()];
        it.primary_category = "bitcoin_crypto".into();
        it.sentiment = Sentiment::Positive;
        it.is_local = true;
        scorer.score(it).priority_score
    };

    let ages = [-30, 0, 10, 59, 60, 61, 180, 359, 360, 361, 1_440, 10_000];
    for pair in ages.windows(2) {
        assert!(
            at_age(pair[0]) >= at_age(pair[1]),
            "age {} scored below age {}",
            pair[0],
            pair[1]
        );
    }

    let mut undated = ContentItem::new("Bitcoin rally in Zurich", "", "Wire", None);
    undated.categories = vec!["bitcoin_crypto".into(), "local".into()];
    undated.primary_category = "bitcoin_crypto".into();
    undated.sentiment = Sentiment::Positive;
    undated.is_local = true;
    assert_eq!(scorer.score(undated).priority_score, at_age(10_000));
}
