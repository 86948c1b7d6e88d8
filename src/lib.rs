// src/lib.rs
// Public library surface for the selector binary and integration tests.

pub mod analysis;
pub mod categorize;
pub mod config;
pub mod context;
pub mod dedup;
pub mod diversity;
pub mod item;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod scoring;

// Raw record normalization plus the async collection shell
pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::config::{ConfigError, SelectionConfig, TimeProfile};
pub use crate::context::ContextSnapshot;
pub use crate::dedup::{AlreadyUsedStore, InMemoryUsedStore};
pub use crate::ingest::types::CollectedInputs;
pub use crate::item::{ContentItem, Sentiment};
pub use crate::pipeline::{Pipeline, PipelineError, PipelineStage, SelectionResult};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "broadcast_selector=info,warn";

/// Install a compact stderr subscriber for binaries. Safe to call twice.
/// Set `SELECTOR_LOG_JSON=1` for JSON lines instead.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("SELECTOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
