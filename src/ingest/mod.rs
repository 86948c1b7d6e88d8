// src/ingest/mod.rs
//! Normalizer: raw collaborator records → canonical `ContentItem`s.
//!
//! Records are loosely-shaped JSON objects. A record that cannot be
//! normalized is skipped and counted; it never aborts the batch.

pub mod collect;
pub mod types;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use metrics::counter;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::NormalizeConfig;
use crate::item::{ContentItem, Fallback};
use crate::metrics::ensure_metrics_described;

/// Marker appended to a truncated body.
pub const ELLIPSIS: &str = "...";
pub const UNKNOWN_SOURCE: &str = "unknown";

const TITLE_KEYS: [&str; 2] = ["title", "headline"];
const BODY_KEYS: [&str; 3] = ["summary", "body", "description"];
const SOURCE_KEYS: [&str; 2] = ["source", "source_name"];
const PUBLISHED_KEYS: [&str; 3] = ["published", "published_date", "published_at"];

/// Why a single raw record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record has no title")]
    MissingTitle,
    #[error("field `{field}` has an unexpected type")]
    InvalidField { field: &'static str },
    #[error("title has {len} chars, minimum is {min}")]
    TitleTooShort { len: usize, min: usize },
    #[error("summary has {len} chars, minimum is {min}")]
    SummaryTooShort { len: usize, min: usize },
    #[error("record matches {indicators} spam indicators")]
    Spam { indicators: usize },
}

impl RecordError {
    /// Stable label for counters and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::NotAnObject => "not_an_object",
            RecordError::MissingTitle => "missing_title",
            RecordError::InvalidField { .. } => "invalid_field",
            RecordError::TitleTooShort { .. } => "title_too_short",
            RecordError::SummaryTooShort { .. } => "summary_too_short",
            RecordError::Spam { .. } => "spam",
        }
    }
}

/// Items that made it through plus the index and reason of every rejected record.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub items: Vec<ContentItem>,
    pub rejected: Vec<(usize, RecordError)>,
}

/// Normalize text: decode entities, strip tags, fold quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags. A tag becomes a space so words stay apart, except
    //    next to punctuation it hugs: `<b>world</b>!` -> `world!`
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags
        .replace_all(&out, |caps: &regex::Captures| {
            let Some(m) = caps.get(0) else { return "" };
            let before = out[..m.start()].chars().next_back();
            let after = out[m.end()..].chars().next();
            if matches!(after, Some('.' | ',' | '!' | '?' | ';' | ':' | ')'))
                || matches!(before, Some('('))
            {
                ""
            } else {
                " "
            }
        })
        .to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. NBSP)
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `body` to `max` chars and append the ellipsis marker if anything was cut.
pub fn truncate_body(body: String, max: usize) -> String {
    if body.chars().count() <= max {
        return body;
    }
    let mut cut: String = body.chars().take(max).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Parse RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    keys: &[&str],
    field: &'static str,
) -> Result<Option<&'a str>, RecordError> {
    match first_present(obj, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(RecordError::InvalidField { field }),
    }
}

fn spam_hits(text: &str, indicators: &[String]) -> usize {
    indicators
        .iter()
        .filter(|ind| {
            let ind = ind.trim().to_lowercase();
            !ind.is_empty() && text.contains(&ind)
        })
        .count()
}

#[derive(Debug, Clone)]
pub struct Normalizer<'a> {
    cfg: &'a NormalizeConfig,
    spam_indicators: &'a [String],
}

impl<'a> Normalizer<'a> {
    pub fn new(cfg: &'a NormalizeConfig, spam_indicators: &'a [String]) -> Self {
        Self {
            cfg,
            spam_indicators,
        }
    }

    /// Normalize one record.
    pub fn normalize_record(&self, record: &Value) -> Result<ContentItem, RecordError> {
        let obj = record.as_object().ok_or(RecordError::NotAnObject)?;

        let raw_title =
            optional_str(obj, &TITLE_KEYS, "title")?.ok_or(RecordError::MissingTitle)?;
        let title = normalize_text(raw_title);
        let title_len = title.chars().count();
        if title_len < self.cfg.min_title_chars {
            return Err(RecordError::TitleTooShort {
                len: title_len,
                min: self.cfg.min_title_chars,
            });
        }

        let body = normalize_text(optional_str(obj, &BODY_KEYS, "body")?.unwrap_or_default());
        let body_len = body.chars().count();
        if body_len > 0 && body_len < self.cfg.min_body_chars {
            return Err(RecordError::SummaryTooShort {
                len: body_len,
                min: self.cfg.min_body_chars,
            });
        }

        if self.cfg.spam_min_hits > 0 {
            let lower = format!("{title} {body}").to_lowercase();
            let hits = spam_hits(&lower, self.spam_indicators);
            if hits >= self.cfg.spam_min_hits {
                return Err(RecordError::Spam { indicators: hits });
            }
        }

        let body = truncate_body(body, self.cfg.max_body_chars);

        let mut fallbacks = Vec::new();
        let source = match first_present(obj, &SOURCE_KEYS).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                fallbacks.push(Fallback::MissingSource);
                UNKNOWN_SOURCE.to_string()
            }
        };

        let published_at = match first_present(obj, &PUBLISHED_KEYS) {
            None => None,
            Some(Value::String(s)) => {
                let parsed = parse_published(s);
                if parsed.is_none() && !s.trim().is_empty() {
                    fallbacks.push(Fallback::UnparsedTimestamp);
                }
                parsed
            }
            Some(Value::Number(n)) => {
                let parsed = n
                    .as_i64()
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
                if parsed.is_none() {
                    fallbacks.push(Fallback::UnparsedTimestamp);
                }
                parsed
            }
            Some(_) => {
                fallbacks.push(Fallback::UnparsedTimestamp);
                None
            }
        };

        let mut item = ContentItem::new(title, body, source, published_at);
        item.source_priority = obj
            .get("priority")
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite());
        for fb in fallbacks {
            item.record_fallback(fb);
        }
        Ok(item)
    }

    /// Normalize a batch. Rejected records are skipped and counted.
    pub fn normalize(&self, records: &[Value]) -> NormalizeOutcome {
        ensure_metrics_described();

        let mut out = NormalizeOutcome {
            items: Vec::with_capacity(records.len()),
            rejected: Vec::new(),
        };
        for (idx, rec) in records.iter().enumerate() {
            match self.normalize_record(rec) {
                Ok(item) => out.items.push(item),
                Err(e) => {
                    debug!(target: "ingest", index = idx, reason = e.kind(), "record rejected");
                    counter!("selector_malformed_total", "reason" => e.kind()).increment(1);
                    out.rejected.push((idx, e));
                }
            }
        }
        counter!("selector_records_total").increment(records.len() as u64);
        out
    }
}
