//! # Selection Config
//!
//! Static configuration for one selection run, loaded once per process.
//!
//! Resolution order (first hit wins):
//! 1. `$SELECTOR_CONFIG_PATH`
//! 2. `config/selection.toml`
//! 3. built-in defaults (`SelectionConfig::default()`)
//!
//! Every key is optional in TOML. Struct sections (`[normalize]`, `[scoring]`,
//! `[sentiment_words]`, `[profiles]`) merge field by field: a key left out
//! keeps its built-in value. Inside an explicit `[profiles.<name>]` table the
//! missing factors are neutral (`1.0`), not that profile's built-in factors.
//! Maps and lists (`category_priority`, `sentiment_weight`, `categories`,
//! `seed_categories`, keyword lists) replace the built-in value whole.
//!
//! `validate()` is the single gate for fatal configuration problems and runs
//! before any item is processed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::categorize::KeywordTable;
use crate::item::Sentiment;

pub const DEFAULT_SELECTOR_CONFIG_PATH: &str = "config/selection.toml";
pub const ENV_SELECTOR_CONFIG_PATH: &str = "SELECTOR_CONFIG_PATH";

/// Offsets observed on real clocks, UTC-12 to UTC+14.
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -12..=14;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sentiment weight for `{0}` is missing")]
    MissingSentimentWeight(Sentiment),
    #[error("category priority table is empty")]
    EmptyCategoryPriority,
    #[error("keyword table is empty")]
    EmptyKeywordTable,
    #[error("category `{0}` has no keywords")]
    EmptyCategory(String),
    #[error("weight `{key}` must be finite and non-negative (got {value})")]
    InvalidWeight { key: String, value: f64 },
    #[error("keyword list `{list}` could not be compiled: {source}")]
    BadKeyword {
        list: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config path from $SELECTOR_CONFIG_PATH does not exist: {}", .0.display())]
    MissingEnvPath(PathBuf),
    #[error("utc_offset_hours must be within -12..=14 (got {0})")]
    InvalidUtcOffset(i32),
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Named set of weighting overrides for the broadcast hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeProfile {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeProfile {
    /// 06–11 morning, 12–17 afternoon, 18–22 evening, everything else night.
    pub fn for_hour(hour: u32) -> Self {
        match hour % 24 {
            6..=11 => TimeProfile::Morning,
            12..=17 => TimeProfile::Afternoon,
            18..=22 => TimeProfile::Evening,
            _ => TimeProfile::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeProfile::Morning => "morning",
            TimeProfile::Afternoon => "afternoon",
            TimeProfile::Evening => "evening",
            TimeProfile::Night => "night",
        }
    }
}

/// Multiplicative factors a time profile applies to the sentiment weights
/// and to the locality bonus. Keyword tables are never touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileWeights {
    pub positive_factor: f64,
    pub neutral_factor: f64,
    pub negative_factor: f64,
    pub locality_factor: f64,
}

impl Default for ProfileWeights {
    fn default() -> Self {
        Self {
            positive_factor: 1.0,
            neutral_factor: 1.0,
            negative_factor: 1.0,
            locality_factor: 1.0,
        }
    }
}

impl ProfileWeights {
    pub fn sentiment_factor(&self, s: Sentiment) -> f64 {
        match s {
            Sentiment::Positive => self.positive_factor,
            Sentiment::Neutral => self.neutral_factor,
            Sentiment::Negative => self.negative_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profiles {
    pub morning: ProfileWeights,
    pub afternoon: ProfileWeights,
    pub evening: ProfileWeights,
    pub night: ProfileWeights,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            morning: ProfileWeights {
                positive_factor: 1.2,
                locality_factor: 1.1,
                ..ProfileWeights::default()
            },
            afternoon: ProfileWeights::default(),
            evening: ProfileWeights {
                negative_factor: 0.9,
                ..ProfileWeights::default()
            },
            night: ProfileWeights {
                negative_factor: 0.9,
                ..ProfileWeights::default()
            },
        }
    }
}

impl Profiles {
    pub fn get(&self, p: TimeProfile) -> &ProfileWeights {
        match p {
            TimeProfile::Morning => &self.morning,
            TimeProfile::Afternoon => &self.afternoon,
            TimeProfile::Evening => &self.evening,
            TimeProfile::Night => &self.night,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Body is cut to this many characters and suffixed with `...`.
    pub max_body_chars: usize,
    /// Titles shorter than this are dropped. Kept low on purpose.
    pub min_title_chars: usize,
    /// A body that is present must have at least this many characters.
    pub min_body_chars: usize,
    /// Records with at least this many spam indicators are dropped.
    pub spam_min_hits: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_body_chars: 1000,
            min_title_chars: 3,
            min_body_chars: 5,
            spam_min_hits: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub locality_bonus: f64,
    /// Category whose items react to the price-change context.
    pub volatile_category: String,
    pub strong_move_pct: f64,
    pub strong_move_boost: f64,
    pub mild_move_pct: f64,
    pub mild_move_boost: f64,
    pub fresh_hours: f64,
    pub fresh_bonus: f64,
    pub recent_hours: f64,
    pub recent_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            locality_bonus: 2.0,
            volatile_category: "bitcoin_crypto".into(),
            strong_move_pct: 5.0,
            strong_move_boost: 3.0,
            mild_move_pct: 2.0,
            mild_move_boost: 1.0,
            fresh_hours: 1.0,
            fresh_bonus: 2.0,
            recent_hours: 6.0,
            recent_bonus: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentWords {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for SentimentWords {
    fn default() -> Self {
        Self {
            positive: words(&[
                "gut", "great", "excellent", "success", "win", "gain", "up", "rise",
                "positive", "growth", "increase", "boom", "bullish", "rally", "erfolg",
                "gewinn", "sieg",
            ]),
            negative: words(&[
                "schlecht", "bad", "terrible", "fail", "loss", "down", "fall", "negative",
                "decline", "crash", "bearish", "drop", "plunge", "verlust", "krise",
                "problem",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// category -> weight; categories not listed weigh 1.
    pub category_priority: HashMap<String, i64>,
    /// Must contain `positive`, `neutral` and `negative`.
    pub sentiment_weight: HashMap<String, f64>,
    pub target_count: usize,
    pub max_per_category_cap: Option<usize>,
    /// When unset, derived from the broadcast hour of the run.
    pub time_profile: Option<TimeProfile>,
    pub utc_offset_hours: i32,
    /// Categories seeded first by the diversity selector, in order.
    pub seed_categories: Vec<String>,
    pub weather_location: String,
    /// Per-source budget for the collection layer.
    pub collect_timeout_ms: u64,
    pub normalize: NormalizeConfig,
    pub scoring: ScoringConfig,
    pub profiles: Profiles,
    /// Declared order doubles as the tie-break order for primary categories.
    pub categories: Vec<CategoryKeywords>,
    pub sentiment_words: SentimentWords,
    pub locality_keywords: Vec<String>,
    pub spam_indicators: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let category_priority = [
            ("bitcoin_crypto", 10),
            ("local", 9),
            ("breaking", 9),
            ("politics", 8),
            ("economy", 8),
            ("technology", 8),
            ("sports", 6),
            ("entertainment", 5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let sentiment_weight = [("positive", 1.3), ("neutral", 1.0), ("negative", 0.9)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Self {
            category_priority,
            sentiment_weight,
            target_count: 4,
            max_per_category_cap: None,
            time_profile: None,
            utc_offset_hours: 1,
            seed_categories: words(&["bitcoin_crypto", "local", "breaking", "technology"]),
            weather_location: "zurich".into(),
            collect_timeout_ms: 10_000,
            normalize: NormalizeConfig::default(),
            scoring: ScoringConfig::default(),
            profiles: Profiles::default(),
            categories: default_categories(),
            sentiment_words: SentimentWords::default(),
            locality_keywords: words(&[
                "zürich", "zurich", "basel", "bern", "schweiz", "switzerland", "swiss",
                "bundesrat", "kantonal", "gemeinde",
            ]),
            spam_indicators: words(&[
                "click here", "buy now", "limited time", "act now", "free money",
                "get rich", "miracle", "secret",
            ]),
        }
    }
}

impl SelectionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Env var, then `config/selection.toml`, then built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_SELECTOR_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::MissingEnvPath(pb));
            }
            return Self::load_from(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_SELECTOR_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        Ok(Self::default())
    }

    /// Sentiment weight; only meaningful after `validate()` succeeded.
    pub fn sentiment_weight_for(&self, s: Sentiment) -> f64 {
        self.sentiment_weight.get(s.as_str()).copied().unwrap_or(1.0)
    }

    /// Weight for a category, 1 for anything not configured.
    pub fn category_weight(&self, category: &str) -> f64 {
        self.category_priority.get(category).copied().unwrap_or(1) as f64
    }

    /// Fatal checks. Runs once before any item is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validated_table().map(|_| ())
    }

    /// Runs every check of `validate()` and hands back the compiled keyword
    /// table, so callers that need it compile it once.
    pub fn validated_table(&self) -> Result<KeywordTable, ConfigError> {
        for s in Sentiment::ALL {
            let w = self
                .sentiment_weight
                .get(s.as_str())
                .copied()
                .ok_or(ConfigError::MissingSentimentWeight(s))?;
            check_weight(&format!("sentiment_weight.{s}"), w)?;
        }
        if self.category_priority.is_empty() {
            return Err(ConfigError::EmptyCategoryPriority);
        }
        for (k, &v) in &self.category_priority {
            check_weight(&format!("category_priority.{k}"), v as f64)?;
        }
        if !UTC_OFFSET_RANGE.contains(&self.utc_offset_hours) {
            return Err(ConfigError::InvalidUtcOffset(self.utc_offset_hours));
        }

        let sc = &self.scoring;
        for (key, value) in [
            ("scoring.locality_bonus", sc.locality_bonus),
            ("scoring.strong_move_boost", sc.strong_move_boost),
            ("scoring.mild_move_boost", sc.mild_move_boost),
            ("scoring.fresh_bonus", sc.fresh_bonus),
            ("scoring.recent_bonus", sc.recent_bonus),
        ] {
            check_weight(key, value)?;
        }
        for (name, p) in [
            ("morning", &self.profiles.morning),
            ("afternoon", &self.profiles.afternoon),
            ("evening", &self.profiles.evening),
            ("night", &self.profiles.night),
        ] {
            for (field, value) in [
                ("positive_factor", p.positive_factor),
                ("neutral_factor", p.neutral_factor),
                ("negative_factor", p.negative_factor),
                ("locality_factor", p.locality_factor),
            ] {
                check_weight(&format!("profiles.{name}.{field}"), value)?;
            }
        }

        // Compiling the table surfaces empty or unbuildable keyword lists.
        KeywordTable::compile(self)
    }
}

fn check_weight(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            key: key.to_string(),
            value,
        })
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_categories() -> Vec<CategoryKeywords> {
    let table: [(&str, &[&str]); 8] = [
        (
            "bitcoin_crypto",
            &[
                "bitcoin", "btc", "cryptocurrency", "crypto", "blockchain", "ethereum",
                "coinbase", "binance", "satoshi", "mining", "kryptowährung", "krypto",
                "digital currency", "defi",
            ],
        ),
        (
            "local",
            &[
                "zürich", "zurich", "basel", "bern", "schweiz", "switzerland", "swiss",
                "svp", "fdp", "glp", "bundesrat", "kantonal", "gemeinde", "stadt",
            ],
        ),
        (
            "breaking",
            &[
                "breaking", "eilmeldung", "urgent", "alert", "sofort", "aktuell", "live",
                "jetzt", "update",
            ],
        ),
        (
            "politics",
            &[
                "politik", "politics", "regierung", "government", "parlament", "election",
                "wahl", "partei", "minister", "bundestag",
            ],
        ),
        (
            "economy",
            &[
                "wirtschaft", "economy", "börse", "stock", "market", "bank", "inflation",
                "recession", "gdp", "trade", "export", "import",
            ],
        ),
        (
            "technology",
            &[
                "technologie", "technology", "tech", "ai", "artificial intelligence",
                "software", "hardware", "digital", "innovation", "startup",
            ],
        ),
        (
            "sports",
            &[
                "sport", "sports", "fussball", "football", "soccer", "tennis", "hockey",
                "basketball", "olympics", "fifa", "uefa",
            ],
        ),
        (
            "entertainment",
            &[
                "entertainment", "unterhaltung", "film", "movie", "music", "celebrity",
                "kultur", "culture", "festival", "concert",
            ],
        ),
    ];
    table
        .iter()
        .map(|(name, kws)| CategoryKeywords {
            name: name.to_string(),
            keywords: words(kws),
        })
        .collect()
}
