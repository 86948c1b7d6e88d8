// tests/pipeline_scenarios.rs
use broadcast_selector::config::TimeProfile;
use broadcast_selector::ingest::types::{CollectedInputs, CryptoQuote};
use broadcast_selector::pipeline::PipelineStage;
use broadcast_selector::{InMemoryUsedStore, Pipeline, SelectionConfig};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 13, 0, 0).unwrap()
}

fn bundle() -> CollectedInputs {
    serde_json::from_str(include_str!("fixtures/bundle.json")).expect("fixture")
}

fn afternoon(cfg: SelectionConfig) -> SelectionConfig {
    SelectionConfig {
        time_profile: Some(TimeProfile::Afternoon),
        ..cfg
    }
}

fn news(titles: &[&str]) -> Vec<Value> {
    titles
        .iter()
        .map(|t| json!({"title": t, "source": "Wire"}))
        .collect()
}

#[test]
fn fixture_bundle_end_to_end() {
    let p = Pipeline::new(SelectionConfig::default()).unwrap();
    let out = p.run(&bundle(), now(), None);

    let titles: Vec<_> = out.selected.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Bitcoin rallies past 105k as ETF inflows surge",
            "Zurich tram strike disrupts morning commute",
            "New AI startup raises Series A",
            "Parliament debates election reform",
        ]
    );
    let scores: Vec<_> = out.selected.iter().map(|i| i.priority_score).collect();
    assert_eq!(scores, [18.0, 12.0, 8.0, 8.0]);

    assert_eq!(out.report.records_in, 7);
    assert_eq!(out.report.rejected.get("spam"), Some(&1));
    assert_eq!(out.report.rejected.get("title_too_short"), Some(&1));
    assert_eq!(out.report.duplicates, 1);
    assert_eq!(out.report.time_profile, TimeProfile::Afternoon);
    assert_eq!(out.report.stages, PipelineStage::SEQUENCE.to_vec());

    assert_eq!(out.context.weather, "15°C, sunny");
    assert_eq!(out.context.crypto, "$105,000 (+8.0%) 📈");
    assert_eq!(out.quality_score, 100.0);
    assert_eq!(out.focus_category, "bitcoin_crypto");
    assert!(out.focus.volatile_emphasis);
    assert_eq!(out.category_distribution.values().sum::<usize>(), 4);
}

#[test]
fn scenario_a_volatile_category_gets_boost() {
    let cfg = afternoon(SelectionConfig {
        category_priority: HashMap::from([("bitcoin_crypto".to_string(), 10)]),
        target_count: 4,
        ..SelectionConfig::default()
    });
    let p = Pipeline::new(cfg).unwrap();
    let inputs = CollectedInputs {
        news: news(&[
            "Bitcoin price jumps again",
            "Crypto exchange Binance expands",
            "Ethereum blockchain upgrade ships",
            "Tennis final in Basel tonight",
            "Parliament debates new tax rules",
            "Football club signs striker",
            "Software update for banking app",
            "Film festival opens doors",
            "Inflation figures released",
            "Local bakery wins award",
        ]),
        weather: None,
        crypto: Some(CryptoQuote {
            price: 100_000.0,
            percent_change_24h: 8.0,
        }),
    };

    let out = p.run(&inputs, now(), None);
    let btc: Vec<_> = out
        .selected
        .iter()
        .filter(|i| i.primary_category == "bitcoin_crypto")
        .collect();
    assert!(!btc.is_empty());
    for it in btc {
        assert_eq!(it.score_breakdown.context_boost, 3.0);
        assert!(it.priority_score >= 13.0);
    }
    assert_eq!(out.selected.len(), 4);
}

#[test]
fn scenario_b_same_title_from_two_sources() {
    let p = Pipeline::new(SelectionConfig::default()).unwrap();
    let inputs = CollectedInputs {
        news: vec![
            json!({"title": "Swiss National Bank holds rates", "source": "NZZ"}),
            json!({"title": "Swiss National Bank holds rates", "source": "Reuters"}),
            json!({"title": "Basel museum reopens", "source": "SRF"}),
        ],
        ..CollectedInputs::default()
    };
    let out = p.run(&inputs, now(), None);
    assert!(out.selected.len() <= inputs.news.len() - 1);
    assert_eq!(out.report.duplicates, 1);
    let snb: Vec<_> = out
        .selected
        .iter()
        .filter(|i| i.title.starts_with("Swiss National Bank"))
        .collect();
    assert_eq!(snb.len(), 1);
    assert_eq!(snb[0].source, "NZZ");
}

#[test]
fn scenario_c_no_context_still_completes() {
    let p = Pipeline::new(SelectionConfig::default()).unwrap();
    let inputs = CollectedInputs {
        news: news(&["Bitcoin slides overnight", "Zurich council votes on housing"]),
        weather: None,
        crypto: None,
    };
    let out = p.run(&inputs, now(), None);
    assert_eq!(out.quality.context_integration, 0.0);
    assert_eq!(out.report.stages.last(), Some(&PipelineStage::Done));
    assert_eq!(out.context.weather, "Weather data unavailable");
    assert_eq!(out.context.crypto, "Bitcoin data unavailable");
    assert!(out.selected.iter().all(|i| i.score_breakdown.context_boost == 0.0));
}

#[test]
fn scenario_d_zero_target() {
    let cfg = SelectionConfig {
        target_count: 0,
        ..SelectionConfig::default()
    };
    let p = Pipeline::new(cfg).unwrap();
    let out = p.run(&bundle(), now(), None);
    assert!(out.selected.is_empty());
    assert_eq!(out.quality_score, 0.0);
    assert!(out.category_distribution.is_empty());
    assert_eq!(out.report.stages.last(), Some(&PipelineStage::Done));
}

#[test]
fn selection_is_recorded_and_excluded_next_run() {
    let p = Pipeline::new(SelectionConfig::default()).unwrap();
    let store = InMemoryUsedStore::new();

    let first = p.run(&bundle(), now(), Some(&store));
    assert_eq!(first.selected.len(), 4);
    assert_eq!(store.len(), 4);

    let second = p.run(&bundle(), now(), Some(&store));
    assert!(second.selected.is_empty());
    // The SRF copy of the tram story shares the used fingerprint.
    assert_eq!(second.report.already_used, 5);
    assert_eq!(second.report.duplicates, 0);
}

#[test]
fn malformed_records_never_abort_the_batch() {
    let p = Pipeline::new(SelectionConfig::default()).unwrap();
    let inputs = CollectedInputs {
        news: vec![
            json!(42),
            json!({"summary": "no title here"}),
            json!({"title": ["not", "a", "string"]}),
            json!({"title": "Bern approves new tram line", "source": "Bund"}),
        ],
        ..CollectedInputs::default()
    };
    let out = p.run(&inputs, now(), None);
    assert_eq!(out.selected.len(), 1);
    assert_eq!(out.report.rejected_total(), 3);
}

#[test]
fn evening_profile_dampens_negative_items() {
    let inputs = CollectedInputs {
        news: news(&["Markets crash in Basel"]),
        ..CollectedInputs::default()
    };
    let score_at = |profile| {
        let cfg = SelectionConfig {
            time_profile: Some(profile),
            ..SelectionConfig::default()
        };
        Pipeline::new(cfg).unwrap().run(&inputs, now(), None).selected[0].priority_score
    };
    assert!(score_at(TimeProfile::Evening) < score_at(TimeProfile::Afternoon));
}
