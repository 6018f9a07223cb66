// =============================================================================
// Runtime Configuration - watchlist instruments and analysis tunables
// =============================================================================
//
// Central configuration hub for the Trendwatch backend. Every tunable
// parameter of the analysis pipeline lives here so nothing is an embedded
// constant: the instrument/page grouping, pivot margins, oscillator
// threshold, stochastic lengths, and the display window are all supplied to
// the pipeline at request time.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_page() -> u32 {
    1
}

fn default_bar_count() -> u32 {
    260
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_fetch_retries() -> u32 {
    2
}

fn default_pivot_left() -> usize {
    15
}

fn default_pivot_right() -> usize {
    15
}

fn default_volume_osc_threshold() -> f64 {
    20.0
}

fn default_stoch_k_len() -> usize {
    14
}

fn default_stoch_k_smooth() -> usize {
    3
}

fn default_stoch_d_smooth() -> usize {
    3
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_max_segments() -> usize {
    10
}

fn default_display_window() -> usize {
    220
}

// =============================================================================
// Instruments
// =============================================================================

/// Asset class of a watchlist instrument, used by the dashboard for grouping
/// and styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Forex,
    Metal,
    Energy,
    Index,
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forex => write!(f, "forex"),
            Self::Metal => write!(f, "metal"),
            Self::Energy => write!(f, "energy"),
            Self::Index => write!(f, "index"),
        }
    }
}

/// One watchlist entry: display name, provider symbol, asset class, and the
/// dashboard page it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub symbol: String,
    pub kind: InstrumentKind,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn instrument(name: &str, symbol: &str, kind: InstrumentKind, page: u32) -> Instrument {
    Instrument {
        name: name.to_string(),
        symbol: symbol.to_string(),
        kind,
        page,
    }
}

fn default_instruments() -> Vec<Instrument> {
    use InstrumentKind::*;
    vec![
        // Page 1: majors and crosses.
        instrument("EURUSD", "EUR/USD", Forex, 1),
        instrument("USDJPY", "USD/JPY", Forex, 1),
        instrument("GBPUSD", "GBP/USD", Forex, 1),
        instrument("AUDUSD", "AUD/USD", Forex, 1),
        instrument("USDCAD", "USD/CAD", Forex, 1),
        instrument("USDCHF", "USD/CHF", Forex, 1),
        instrument("EURJPY", "EUR/JPY", Forex, 1),
        instrument("EURGBP", "EUR/GBP", Forex, 1),
        instrument("GBPJPY", "GBP/JPY", Forex, 1),
        instrument("AUDJPY", "AUD/JPY", Forex, 1),
        // Page 2: metals and energy.
        instrument("XAUUSD", "XAU/USD", Metal, 2),
        instrument("XAGUSD", "XAG/USD", Metal, 2),
        instrument("USOIL", "WTI", Energy, 2),
        // Page 3: equity indices.
        instrument("US500", "SPX", Index, 3),
        instrument("NAS100", "NDX", Index, 3),
        instrument("US30", "DJI", Index, 3),
        instrument("GER40", "DAX", Index, 3),
        instrument("UK100", "FTSE", Index, 3),
        instrument("JP225", "NIKKEI", Index, 3),
        instrument("AUS200", "ASX200", Index, 3),
    ]
}

// =============================================================================
// AnalysisParams
// =============================================================================

/// Tunable parameters for the indicator/structural-analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Bars to the left of a candidate pivot that must all be beaten.
    #[serde(default = "default_pivot_left")]
    pub pivot_left: usize,

    /// Bars to the right of a candidate pivot that must not exceed it.
    #[serde(default = "default_pivot_right")]
    pub pivot_right: usize,

    /// Volume-oscillator percentage a breakout marker must clear.
    #[serde(default = "default_volume_osc_threshold")]
    pub volume_osc_threshold: f64,

    /// Stochastic %K lookback window.
    #[serde(default = "default_stoch_k_len")]
    pub stoch_k_len: usize,

    /// SMA length smoothing raw %K into %K.
    #[serde(default = "default_stoch_k_smooth")]
    pub stoch_k_smooth: usize,

    /// SMA length smoothing %K into %D.
    #[serde(default = "default_stoch_d_smooth")]
    pub stoch_d_smooth: usize,

    /// MACD fast EMA period.
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    /// MACD slow EMA period.
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    /// MACD signal EMA period.
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Support/resistance segments retained per kind.
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,

    /// Bars of the full window shown on the dashboard chart.
    #[serde(default = "default_display_window")]
    pub display_window: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            pivot_left: default_pivot_left(),
            pivot_right: default_pivot_right(),
            volume_osc_threshold: default_volume_osc_threshold(),
            stoch_k_len: default_stoch_k_len(),
            stoch_k_smooth: default_stoch_k_smooth(),
            stoch_d_smooth: default_stoch_d_smooth(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            max_segments: default_max_segments(),
            display_window: default_display_window(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Trendwatch backend.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Instruments on the watchlist, grouped into dashboard pages.
    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,

    /// Daily bars fetched per instrument. Must comfortably exceed the
    /// longest indicator lookback (EMA200 plus the 210-bar trend floor).
    #[serde(default = "default_bar_count")]
    pub bar_count: u32,

    /// Per-request timeout for the provider fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Instruments fetched and analysed concurrently per batch request.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Additional fetch attempts after a failure, with linear backoff.
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Pipeline tunables.
    #[serde(default)]
    pub analysis_params: AnalysisParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            bar_count: default_bar_count(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fetch_concurrency: default_fetch_concurrency(),
            fetch_retries: default_fetch_retries(),
            analysis_params: AnalysisParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            instruments = config.instruments.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Instruments belonging to `page`, or all of them when no page is given.
    pub fn instruments_for_page(&self, page: Option<u32>) -> Vec<Instrument> {
        match page {
            Some(p) => self
                .instruments
                .iter()
                .filter(|i| i.page == p)
                .cloned()
                .collect(),
            None => self.instruments.clone(),
        }
    }
}
