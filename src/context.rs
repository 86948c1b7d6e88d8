//! Context enrichment: weather and price snapshots turned into on-air strings.
//!
//! Pure formatting, no I/O. A missing sub-snapshot yields a fixed sentinel
//! string and disables the boosts that depend on it.

use serde::{Deserialize, Serialize};

use crate::ingest::types::{CryptoQuote, WeatherReading, WeatherReport};

pub const WEATHER_UNAVAILABLE: &str = "Weather data unavailable";
pub const CRYPTO_UNAVAILABLE: &str = "Bitcoin data unavailable";

pub const TREND_UP: &str = "📈";
pub const TREND_FLAT: &str = "➡️";
pub const TREND_DOWN: &str = "📉";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherContext {
    pub temperature: f64,
    pub description: String,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoContext {
    pub price: f64,
    pub change_24h: f64,
    pub formatted: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub weather: Option<WeatherContext>,
    pub crypto: Option<CryptoContext>,
}

impl ContextSnapshot {
    /// Absolute 24h price change, if a price snapshot exists.
    pub fn change_magnitude(&self) -> Option<f64> {
        self.crypto.as_ref().map(|c| c.change_24h.abs())
    }

    pub fn weather_line(&self) -> &str {
        self.weather
            .as_ref()
            .map_or(WEATHER_UNAVAILABLE, |w| w.formatted.as_str())
    }

    pub fn crypto_line(&self) -> &str {
        self.crypto
            .as_ref()
            .map_or(CRYPTO_UNAVAILABLE, |c| c.formatted.as_str())
    }
}

/// Fold case and Latin diacritics so `Zürich` finds `zurich` and `Genève`
/// finds `geneve`.
fn location_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.trim().chars().flat_map(char::to_lowercase) {
        match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'ç' => out.push('c'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'ñ' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => out.push('o'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            c => out.push(c),
        }
    }
    out
}

/// Exact name first, then the smallest name that folds to the same key.
fn find_location<'r>(report: &'r WeatherReport, location: &str) -> Option<&'r WeatherReading> {
    if let Some(r) = report.get(location.trim()) {
        return Some(r);
    }
    let wanted = location_key(location);
    report
        .iter()
        .filter(|(name, _)| location_key(name) == wanted)
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, r)| r)
}

/// `1234567.8` → `"1,234,568"`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

pub fn trend_glyph(change: f64) -> &'static str {
    if change > 0.0 {
        TREND_UP
    } else if change < 0.0 {
        TREND_DOWN
    } else {
        TREND_FLAT
    }
}

pub fn format_weather(temperature: f64, description: &str) -> String {
    let desc = if description.trim().is_empty() {
        "unknown"
    } else {
        description.trim()
    };
    format!("{temperature}°C, {desc}")
}

pub fn format_crypto(price: f64, change: f64) -> String {
    format!(
        "${} ({:+.1}%) {}",
        format_thousands(price),
        change,
        trend_glyph(change)
    )
}

#[derive(Debug, Clone)]
pub struct ContextEnricher {
    location: String,
}

impl ContextEnricher {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Build the snapshot from whatever the collaborators delivered.
    pub fn enrich(
        &self,
        weather: Option<&WeatherReport>,
        crypto: Option<&CryptoQuote>,
    ) -> ContextSnapshot {
        let weather = weather
            .and_then(|report| find_location(report, &self.location))
            .filter(|r| r.temperature.is_finite())
            .map(|r| WeatherContext {
                temperature: r.temperature,
                description: r.description.clone(),
                formatted: format_weather(r.temperature, &r.description),
            });

        let crypto = crypto
            .filter(|q| q.price.is_finite() && q.percent_change_24h.is_finite())
            .map(|q| CryptoContext {
                price: q.price,
                change_24h: q.percent_change_24h,
                formatted: format_crypto(q.price, q.percent_change_24h),
            });

        if weather.is_none() {
            tracing::debug!(target: "context", location = %self.location, "weather context unavailable");
        }
        if crypto.is_none() {
            tracing::debug!(target: "context", "crypto context unavailable");
        }

        ContextSnapshot { weather, crypto }
    }
}
