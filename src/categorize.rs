//! Keyword categorization, sentiment estimation and locality detection.
//!
//! The keyword table is compiled once into one word-bounded regex per
//! category. Category order is the declared order and doubles as the
//! tie-break for `primary_category`.

use regex::Regex;
use tracing::debug;

use crate::config::{ConfigError, SelectionConfig};
use crate::item::{CategoryScore, ContentItem, Fallback, Sentiment, GENERAL_CATEGORY};

#[derive(Debug)]
struct CompiledCategory {
    name: String,
    re: Regex,
}

/// Immutable, compiled form of every keyword list in the config.
#[derive(Debug)]
pub struct KeywordTable {
    categories: Vec<CompiledCategory>,
    positive: Option<Regex>,
    negative: Option<Regex>,
    locality: Option<Regex>,
}

/// Build `(?i)\b(?:kw1|kw2|...)\b` from a keyword list.
fn compile_terms(list: &str, terms: &[String]) -> Result<Option<Regex>, ConfigError> {
    let escaped: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| ConfigError::BadKeyword {
            list: list.to_string(),
            source,
        })
}

impl KeywordTable {
    pub fn compile(cfg: &SelectionConfig) -> Result<Self, ConfigError> {
        if cfg.categories.is_empty() {
            return Err(ConfigError::EmptyKeywordTable);
        }
        let categories = cfg
            .categories
            .iter()
            .map(|c| {
                let re = compile_terms(&c.name, &c.keywords)?
                    .ok_or_else(|| ConfigError::EmptyCategory(c.name.clone()))?;
                Ok(CompiledCategory {
                    name: c.name.clone(),
                    re,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            categories,
            positive: compile_terms("sentiment_words.positive", &cfg.sentiment_words.positive)?,
            negative: compile_terms("sentiment_words.negative", &cfg.sentiment_words.negative)?,
            locality: compile_terms("locality_keywords", &cfg.locality_keywords)?,
        })
    }

    /// Non-zero hit counts per category, in declared order.
    pub fn score_categories(&self, text: &str) -> Vec<CategoryScore> {
        self.categories
            .iter()
            .filter_map(|c| {
                let hits = c.re.find_iter(text).count() as u32;
                (hits > 0).then(|| CategoryScore {
                    category: c.name.clone(),
                    hits,
                })
            })
            .collect()
    }

    /// Majority of positive vs. negative word hits; a tie is neutral.
    pub fn sentiment(&self, text: &str) -> Sentiment {
        let count = |re: &Option<Regex>| re.as_ref().map_or(0, |r| r.find_iter(text).count());
        let pos = count(&self.positive);
        let neg = count(&self.negative);
        match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    pub fn is_local(&self, text: &str) -> bool {
        self.locality.as_ref().is_some_and(|r| r.is_match(text))
    }
}

/// Pick the highest-scoring category; on ties the earlier (declared) one wins.
fn primary_of(scores: &[CategoryScore]) -> Option<&CategoryScore> {
    scores
        .iter()
        .fold(None, |best: Option<&CategoryScore>, s| match best {
            Some(b) if b.hits >= s.hits => Some(b),
            _ => Some(s),
        })
}

#[derive(Debug)]
pub struct Categorizer<'a> {
    table: &'a KeywordTable,
}

impl<'a> Categorizer<'a> {
    pub fn new(table: &'a KeywordTable) -> Self {
        Self { table }
    }

    pub fn categorize(&self, mut item: ContentItem) -> ContentItem {
        let text = item.search_text();
        let scores = self.table.score_categories(&text);

        match primary_of(&scores) {
            Some(primary) => {
                item.primary_category = primary.category.clone();
                item.categories = scores.iter().map(|s| s.category.clone()).collect();
                item.category_scores = scores;
            }
            None => {
                item.primary_category = GENERAL_CATEGORY.to_string();
                item.categories = vec![GENERAL_CATEGORY.to_string()];
                item.category_scores = vec![CategoryScore {
                    category: GENERAL_CATEGORY.to_string(),
                    hits: 1,
                }];
                item.record_fallback(Fallback::GeneralCategory);
            }
        }

        item.sentiment = self.table.sentiment(&text);
        item.is_local = self.table.is_local(&text);

        debug!(
            target: "categorize",
            id = item.fingerprint(),
            primary = %item.primary_category,
            categories = ?item.categories,
            sentiment = %item.sentiment,
            local = item.is_local,
            "categorized"
        );
        item
    }

    pub fn categorize_all(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        items.into_iter().map(|it| self.categorize(it)).collect()
    }
}
