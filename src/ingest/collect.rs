// src/ingest/collect.rs
//! Joins the independent upstream fetches before a pipeline run.
//!
//! All fetches run concurrently, each bounded by the same time budget.
//! A source that errors or runs out of time is logged, counted and left out;
//! nothing is retried here.

use futures::future::join_all;
use metrics::counter;
use std::time::Duration;
use tokio::time::timeout;

use crate::ingest::types::{
    CollectedInputs, CryptoProvider, NewsProvider, WeatherProvider,
};
use crate::metrics::ensure_metrics_described;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFailure {
    Error(String),
    TimedOut,
}

/// Which sources did not deliver, by name.
#[derive(Debug, Clone, Default)]
pub struct CollectReport {
    pub failures: Vec<(String, SourceFailure)>,
}

impl CollectReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

async fn bounded<T, F>(name: &str, budget: Duration, fut: F) -> Result<T, (String, SourceFailure)>
where
    F: std::future::Future<Output = anyhow::Result<T>>,
{
    match timeout(budget, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => {
            tracing::warn!(target: "ingest", error = ?e, provider = name, "provider error");
            counter!("selector_provider_errors_total").increment(1);
            Err((name.to_string(), SourceFailure::Error(e.to_string())))
        }
        Err(_) => {
            tracing::warn!(target: "ingest", provider = name, budget_ms = budget.as_millis() as u64, "provider timed out");
            counter!("selector_provider_errors_total").increment(1);
            Err((name.to_string(), SourceFailure::TimedOut))
        }
    }
}

/// Run every configured fetch at once and keep whatever arrives in time.
pub async fn collect_inputs(
    news: &[Box<dyn NewsProvider>],
    weather: Option<&dyn WeatherProvider>,
    crypto: Option<&dyn CryptoProvider>,
    budget: Duration,
) -> (CollectedInputs, CollectReport) {
    ensure_metrics_described();

    let news_futs = join_all(
        news.iter()
            .map(|p| bounded(p.name(), budget, p.fetch_news())),
    );
    let weather_fut = async {
        match weather {
            Some(w) => Some(bounded("weather", budget, w.fetch_weather()).await),
            None => None,
        }
    };
    let crypto_fut = async {
        match crypto {
            Some(c) => Some(bounded("crypto", budget, c.fetch_quote()).await),
            None => None,
        }
    };

    let (news_results, weather_res, crypto_res) = tokio::join!(news_futs, weather_fut, crypto_fut);

    let mut inputs = CollectedInputs::default();
    let mut report = CollectReport::default();

    for res in news_results {
        match res {
            Ok(mut records) => inputs.news.append(&mut records),
            Err(f) => report.failures.push(f),
        }
    }
    match weather_res {
        Some(Ok(w)) => inputs.weather = Some(w),
        Some(Err(f)) => report.failures.push(f),
        None => {}
    }
    match crypto_res {
        Some(Ok(c)) => inputs.crypto = Some(c),
        Some(Err(f)) => report.failures.push(f),
        None => {}
    }

    tracing::info!(
        target: "ingest",
        records = inputs.news.len(),
        weather = inputs.weather.is_some(),
        crypto = inputs.crypto.is_some(),
        failures = report.failures.len(),
        "collection joined"
    );

    (inputs, report)
}
