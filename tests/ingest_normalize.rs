// tests/ingest_normalize.rs
use broadcast_selector::config::NormalizeConfig;
use broadcast_selector::ingest::{normalize_text, Normalizer, RecordError, ELLIPSIS};
use serde_json::json;

fn spam() -> Vec<String> {
    broadcast_selector::SelectionConfig::default().spam_indicators
}

#[test]
fn empty_is_ok() {
    assert_eq!(normalize_text(""), "");
}

#[test]
fn strips_html_and_unescapes() {
    let s = "<p>Hello&nbsp;<b>world</b> &ldquo;ok&rdquo;</p>";
    assert_eq!(normalize_text(s), r#"Hello world "ok""#);
}

#[test]
fn folds_whitespace_and_nbsp() {
    assert_eq!(normalize_text("A\u{00A0}\n\tB   C"), "A B C");
}

#[test]
fn long_body_is_cut_with_ellipsis() {
    let cfg = NormalizeConfig::default();
    let ind = spam();
    let n = Normalizer::new(&cfg, &ind);
    let it = n
        .normalize_record(&json!({"title": "Long read", "body": "x".repeat(2_000)}))
        .unwrap();
    assert_eq!(it.body.chars().count(), 1_000 + ELLIPSIS.len());
    assert!(it.body.ends_with(ELLIPSIS));
}

#[test]
fn title_is_trimmed_and_aliases_are_read() {
    let cfg = NormalizeConfig::default();
    let ind = spam();
    let n = Normalizer::new(&cfg, &ind);
    let it = n
        .normalize_record(&json!({
            "title": "   Basel fair opens  ",
            "description": "Thousands expected at the fair.",
            "source": "SRF",
            "published_date": "2025-03-14T09:00:00",
            "priority": 0.7
        }))
        .unwrap();
    assert_eq!(it.title, "Basel fair opens");
    assert_eq!(it.body, "Thousands expected at the fair.");
    assert!(it.published_at.is_some());
    assert_eq!(it.source_priority, Some(0.7));
    assert!(it.is_clean());
}

#[test]
fn batch_skips_and_counts_bad_records() {
    let cfg = NormalizeConfig::default();
    let ind = spam();
    let n = Normalizer::new(&cfg, &ind);
    let out = n.normalize(&[
        json!({"title": "Zurich opens new bike lane"}),
        json!("just a string"),
        json!({"title": "no"}),
        json!({"title": "Secret miracle cure", "summary": "Doctors hate it"}),
    ]);
    assert_eq!(out.items.len(), 1);
    let reasons: Vec<_> = out.rejected.iter().map(|(i, e)| (*i, e.kind())).collect();
    assert_eq!(
        reasons,
        [(1, "not_an_object"), (2, "title_too_short"), (3, "spam")]
    );
    assert!(matches!(out.rejected[1].1, RecordError::TitleTooShort { len: 2, min: 3 }));
}

#[test]
fn min_title_threshold_is_configurable() {
    let cfg = NormalizeConfig {
        min_title_chars: 1,
        ..NormalizeConfig::default()
    };
    let ind = spam();
    assert!(Normalizer::new(&cfg, &ind)
        .normalize_record(&json!({"title": "Go"}))
        .is_ok());
}
