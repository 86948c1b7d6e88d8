//! Runs one selection over a JSON input bundle and prints the result.
//!
//! Usage: `select_demo <input.json> [--analyze]`, e.g. `tests/fixtures/bundle.json`.
//! The bundle looks like `{ "news": [...], "weather": {...}, "crypto": {...} }`;
//! every key is optional.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;

use broadcast_selector::{
    init_tracing, CollectedInputs, InMemoryUsedStore, Pipeline, SelectionConfig,
};

fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: select_demo <input.json> [--analyze]")?;
    let analyze_only = args.any(|a| a == "--analyze");

    let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let inputs: CollectedInputs =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let cfg = SelectionConfig::load_default().context("loading selection config")?;
    let pipeline = Pipeline::new(cfg).context("validating selection config")?;

    let now = Utc::now();
    let out = if analyze_only {
        serde_json::to_string_pretty(&pipeline.analyze(&inputs.news, now))?
    } else {
        let used = InMemoryUsedStore::new();
        serde_json::to_string_pretty(&pipeline.run(&inputs, now, Some(&used)))?
    };
    println!("{out}");
    Ok(())
}
