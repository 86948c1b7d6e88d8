//! # Selection Pipeline
//! Runs the stages strictly in order:
//! `COLLECTING → NORMALIZING → DEDUPING → CATEGORIZING → ENRICHING → SCORING
//! → SELECTING → ASSESSING → DONE`.
//!
//! Configuration is validated once in [`Pipeline::new`]; after that a run
//! cannot fail. Empty input flows through every stage and ends in `DONE`
//! with an empty selection.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{analyze, content_focus, ContentFocus, DistributionReport};
use crate::categorize::{Categorizer, KeywordTable};
use crate::config::{ConfigError, SelectionConfig, TimeProfile};
use crate::context::{ContextEnricher, ContextSnapshot};
use crate::dedup::{AlreadyUsedStore, Deduplicator};
use crate::diversity::{category_distribution, DiversitySelector};
use crate::ingest::collect::{collect_inputs, CollectReport};
use crate::ingest::types::{CollectedInputs, CryptoProvider, NewsProvider, WeatherProvider};
use crate::ingest::Normalizer;
use crate::item::ContentItem;
use crate::metrics::ensure_metrics_described;
use crate::quality::{QualityAssessor, QualityBreakdown};
use crate::scoring::{resolve_time_profile, PriorityScorer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid selection config: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Collecting,
    Normalizing,
    Deduping,
    Categorizing,
    Enriching,
    Scoring,
    Selecting,
    Assessing,
    Done,
}

impl PipelineStage {
    pub const SEQUENCE: [PipelineStage; 9] = [
        PipelineStage::Collecting,
        PipelineStage::Normalizing,
        PipelineStage::Deduping,
        PipelineStage::Categorizing,
        PipelineStage::Enriching,
        PipelineStage::Scoring,
        PipelineStage::Selecting,
        PipelineStage::Assessing,
        PipelineStage::Done,
    ];
}

/// What happened along the way; degraded paths are counted, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub records_in: usize,
    /// Rejected records per reason label.
    pub rejected: BTreeMap<String, usize>,
    pub duplicates: usize,
    pub already_used: usize,
    /// Scored items that went through at least one fallback.
    pub degraded_items: usize,
    pub time_profile: TimeProfile,
    pub stages: Vec<PipelineStage>,
}

impl PipelineReport {
    fn new(time_profile: TimeProfile) -> Self {
        Self {
            records_in: 0,
            rejected: BTreeMap::new(),
            duplicates: 0,
            already_used: 0,
            degraded_items: 0,
            time_profile,
            stages: Vec::with_capacity(PipelineStage::SEQUENCE.len()),
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug!(target: "pipeline", ?stage, "stage");
        self.stages.push(stage);
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// On-air strings for the context snapshot, sentinel when unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedContext {
    pub weather: String,
    pub crypto: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Highest priority first.
    pub selected: Vec<ContentItem>,
    pub quality_score: f64,
    pub quality: QualityBreakdown,
    pub category_distribution: BTreeMap<String, usize>,
    pub focus_category: String,
    pub focus: ContentFocus,
    pub context: FormattedContext,
    pub snapshot: ContextSnapshot,
    pub report: PipelineReport,
}

pub struct Pipeline {
    cfg: SelectionConfig,
    table: KeywordTable,
}

impl Pipeline {
    /// Validates the config and compiles the keyword table. The only fallible step.
    pub fn new(cfg: SelectionConfig) -> Result<Self, PipelineError> {
        let table = cfg.validated_table()?;
        Ok(Self { cfg, table })
    }

    /// Normalize, dedup and categorize. Shared by `run` and `analyze`.
    fn prepare(
        &self,
        records: &[serde_json::Value],
        used: Option<&dyn AlreadyUsedStore>,
        report: &mut PipelineReport,
    ) -> Vec<ContentItem> {
        report.enter(PipelineStage::Normalizing);
        report.records_in = records.len();
        let normalized =
            Normalizer::new(&self.cfg.normalize, &self.cfg.spam_indicators).normalize(records);
        for (_, err) in &normalized.rejected {
            *report.rejected.entry(err.kind().to_string()).or_insert(0) += 1;
        }

        report.enter(PipelineStage::Deduping);
        let (unique, stats) = Deduplicator::new(used).dedup(normalized.items);
        report.duplicates = stats.duplicates;
        report.already_used = stats.already_used;

        report.enter(PipelineStage::Categorizing);
        Categorizer::new(&self.table).categorize_all(unique)
    }

    /// One synchronous run over already-collected inputs.
    ///
    /// When a store is given, fingerprints found there are excluded and the
    /// fingerprints of the final selection are recorded into it.
    pub fn run(
        &self,
        inputs: &CollectedInputs,
        now: DateTime<Utc>,
        used: Option<&dyn AlreadyUsedStore>,
    ) -> SelectionResult {
        ensure_metrics_described();
        let started = Instant::now();

        let profile = resolve_time_profile(&self.cfg, now);
        let mut report = PipelineReport::new(profile);
        // Inputs were joined by the caller; the stage is still part of the run.
        report.enter(PipelineStage::Collecting);

        let categorized = self.prepare(&inputs.news, used, &mut report);

        report.enter(PipelineStage::Enriching);
        let snapshot = ContextEnricher::new(&self.cfg.weather_location)
            .enrich(inputs.weather.as_ref(), inputs.crypto.as_ref());

        report.enter(PipelineStage::Scoring);
        let scored = PriorityScorer::new(&self.cfg, profile, &snapshot, now).score_all(categorized);
        report.degraded_items = scored.iter().filter(|i| !i.is_clean()).count();

        report.enter(PipelineStage::Selecting);
        let selected = DiversitySelector::new(
            self.cfg.target_count,
            self.cfg.max_per_category_cap,
            &self.cfg.seed_categories,
        )
        .select(scored);

        report.enter(PipelineStage::Assessing);
        let quality = QualityAssessor::assess(&selected, &snapshot);
        let focus = content_focus(&selected, &snapshot, &self.cfg.scoring.volatile_category);

        if let Some(store) = used {
            for it in &selected {
                store.record(it.fingerprint());
            }
        }

        report.enter(PipelineStage::Done);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!("selector_runs_total").increment(1);
        counter!("selector_selected_total").increment(selected.len() as u64);
        gauge!("selector_last_quality_score").set(quality.total);
        histogram!("selector_run_ms").record(elapsed_ms);

        info!(
            target: "pipeline",
            profile = profile.as_str(),
            records = report.records_in,
            rejected = report.rejected_total(),
            duplicates = report.duplicates,
            already_used = report.already_used,
            selected = selected.len(),
            quality = quality.total,
            focus = %focus.focus,
            elapsed_ms,
            "selection done"
        );

        SelectionResult {
            category_distribution: category_distribution(&selected),
            focus_category: focus.focus.clone(),
            quality_score: quality.total,
            quality,
            focus,
            context: FormattedContext {
                weather: snapshot.weather_line().to_string(),
                crypto: snapshot.crypto_line().to_string(),
            },
            snapshot,
            selected,
            report,
        }
    }

    /// Collect from the providers under the configured time budget, then run.
    pub async fn collect_and_run(
        &self,
        news: &[Box<dyn NewsProvider>],
        weather: Option<&dyn WeatherProvider>,
        crypto: Option<&dyn CryptoProvider>,
        now: DateTime<Utc>,
        used: Option<&dyn AlreadyUsedStore>,
    ) -> (SelectionResult, CollectReport) {
        let budget = Duration::from_millis(self.cfg.collect_timeout_ms);
        let (inputs, collected) = collect_inputs(news, weather, crypto, budget).await;
        (self.run(&inputs, now, used), collected)
    }

    /// Sentiment and topic distribution of every usable record, no selection.
    /// The already-used log is neither consulted nor updated.
    pub fn analyze(&self, records: &[serde_json::Value], now: DateTime<Utc>) -> DistributionReport {
        let mut report = PipelineReport::new(resolve_time_profile(&self.cfg, now));
        let items = self.prepare(records, None, &mut report);
        analyze(&items, &self.cfg)
    }
}
