//! Metric descriptions for the selector. The library only records through
//! the `metrics` facade; installing an exporter is up to the host process.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder exists).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("selector_records_total", "Raw records handed to the normalizer.");
        describe_counter!(
            "selector_malformed_total",
            "Records skipped during normalization, labelled by reason."
        );
        describe_counter!(
            "selector_duplicates_total",
            "Items dropped because their fingerprint was already seen in the run."
        );
        describe_counter!(
            "selector_already_used_total",
            "Items dropped because their fingerprint was broadcast before."
        );
        describe_counter!("selector_selected_total", "Items in final selections.");
        describe_counter!("selector_runs_total", "Completed pipeline runs.");
        describe_counter!(
            "selector_provider_errors_total",
            "Upstream fetches that failed or timed out."
        );
        describe_gauge!(
            "selector_last_quality_score",
            "Quality score (0-100) of the most recent selection."
        );
        describe_histogram!("selector_run_ms", "Pipeline run time in milliseconds.");
    });
}
