// =============================================================================
// Market Data Client - daily OHLCV bars from the provider REST API
// =============================================================================
//
// One parameterized GET per instrument against the provider's `time_series`
// endpoint (symbol, interval=1day, outputsize, apikey). The provider returns
// bars in arbitrary temporal order with numeric fields encoded as strings;
// parsing normalises everything into oldest-first `Bar`s with unix-second
// timestamps. Transient failures are retried a bounded number of times with
// linear backoff before the error is surfaced to the caller.
//
// The API key is never logged or serialized.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// A single daily OHLCV bar. Series built from bars are oldest-first with
/// strictly increasing time.
#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    /// Bar open time, unix seconds (UTC).
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Absent for instruments the provider reports no volume for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// REST client for the market-data provider.
#[derive(Clone)]
pub struct MarketDataClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    retries: u32,
}

impl MarketDataClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key`      - provider API key (query parameter, never logged).
    /// * `timeout_secs` - per-request timeout; the only blocking operation in
    ///                    the whole pipeline.
    /// * `retries`      - additional attempts after a failed fetch.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64, retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            api_key: api_key.into(),
            base_url: "https://api.twelvedata.com/time_series".to_string(),
            client,
            retries,
        }
    }

    /// Fetch `bars` daily bars for `symbol`, oldest-first.
    ///
    /// Retries failed attempts with linear backoff; the final error carries
    /// the context chain of the last attempt.
    #[instrument(skip(self), name = "provider::get_daily_bars")]
    pub async fn get_daily_bars(&self, symbol: &str, bars: u32) -> Result<Vec<Bar>> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_once(symbol, bars).await {
                Ok(parsed) => {
                    debug!(symbol, count = parsed.len(), "daily bars fetched");
                    return Ok(parsed);
                }
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(symbol, attempt, error = %e, "daily bars fetch failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, symbol: &str, bars: u32) -> Result<Vec<Bar>> {
        let outputsize = bars.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("symbol", symbol),
                ("interval", "1day"),
                ("outputsize", outputsize.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("GET time_series request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse time_series response")?;

        if !status.is_success() {
            bail!("provider returned {status}: {body}");
        }

        parse_time_series(&body)
    }
}

impl std::fmt::Debug for MarketDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retries", &self.retries)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Response parsing
// -----------------------------------------------------------------------------

/// Parse a provider `time_series` body into oldest-first bars.
///
/// A body without the `values` list is a fetch error; the provider's
/// `message` field is surfaced when present (it explains rate limits and
/// unknown symbols far better than "missing field").
pub fn parse_time_series(body: &Value) -> Result<Vec<Bar>> {
    let Some(values) = body.get("values").and_then(Value::as_array) else {
        let detail = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("response missing 'values' list");
        bail!("provider error: {detail}");
    };

    let mut bars = Vec::with_capacity(values.len());
    for entry in values {
        let datetime = entry
            .get("datetime")
            .and_then(Value::as_str)
            .context("bar entry missing 'datetime'")?;

        bars.push(Bar {
            time: parse_datetime_secs(datetime)?,
            open: parse_field(entry, "open")?,
            high: parse_field(entry, "high")?,
            low: parse_field(entry, "low")?,
            close: parse_field(entry, "close")?,
            volume: entry
                .get("volume")
                .filter(|v| !v.is_null())
                .map(parse_f64)
                .transpose()?,
        });
    }

    // The provider returns newest-first; accept any order and normalise.
    bars.sort_by_key(|b| b.time);
    bars.dedup_by_key(|b| b.time);
    Ok(bars)
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` into unix seconds (UTC).
fn parse_datetime_secs(s: &str) -> Result<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp());
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("unrecognised datetime '{s}'"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid midnight for '{s}'"))?;
    Ok(midnight.and_utc().timestamp())
}

fn parse_field(entry: &Value, key: &str) -> Result<f64> {
    let val = entry
        .get(key)
        .with_context(|| format!("bar entry missing '{key}'"))?;
    parse_f64(val).with_context(|| format!("bar field '{key}' is not numeric"))
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_f64(val: &Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        bail!("expected string or number, got: {val}")
    }
}
