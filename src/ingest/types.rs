// src/ingest/types.rs
//! Shapes and traits of the upstream collaborators (news, weather, crypto).
//! Fetching itself lives outside this crate; implementors plug in here.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    #[serde(default, alias = "condition")]
    pub description: String,
}

/// Weather readings keyed by location name.
pub type WeatherReport = HashMap<String, WeatherReading>;

/// Latest price snapshot for the tracked coin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CryptoQuote {
    pub price: f64,
    #[serde(alias = "change_24h")]
    pub percent_change_24h: f64,
}

/// Everything collected for one run; any part may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedInputs {
    #[serde(default)]
    pub news: Vec<serde_json::Value>,
    #[serde(default)]
    pub weather: Option<WeatherReport>,
    #[serde(default)]
    pub crypto: Option<CryptoQuote>,
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Raw records as the source delivers them.
    async fn fetch_news(&self) -> Result<Vec<serde_json::Value>>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_weather(&self) -> Result<WeatherReport>;
}

#[async_trait::async_trait]
pub trait CryptoProvider: Send + Sync {
    async fn fetch_quote(&self) -> Result<CryptoQuote>;
}
