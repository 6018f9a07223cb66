// =============================================================================
// Pipeline Orchestrator
// =============================================================================
//
// Runs the full derivation chain for each instrument and assembles the batch
// payload for the dashboard:
//
//   fetch full bar window -> derive everything over the *full* window (the
//   EMA200 stack and the trend verdict want maximal history) -> clip lines,
//   segments and markers to the recent display window by time -> package.
//
// One instrument failing to fetch or analyse never aborts the batch: its row
// carries `ok: false` and the error message while every other row is
// returned in full. Per-instrument work runs concurrently, bounded by the
// configured worker-pool size; the trend-priority ordering is applied once
// after all results are collected, so completion order never matters.

use anyhow::{bail, Result};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::levels::{self, LevelKind, LevelSegment};
use crate::analysis::markers::{detect_markers, Marker};
use crate::analysis::pivots::{pivot_high, pivot_low};
use crate::analysis::trend::{classify_trend, TrendState};
use crate::app_state::AppState;
use crate::indicators::ema::ema;
use crate::indicators::macd::macd;
use crate::indicators::series::{forward_fill, last_defined};
use crate::indicators::stochastic::stochastic;
use crate::indicators::volume::volume_oscillator;
use crate::market_data::{Bar, MarketDataClient};
use crate::runtime_config::{AnalysisParams, Instrument, InstrumentKind};

// =============================================================================
// Payload types
// =============================================================================

/// EMA overlay lines, aligned 1:1 with `candles` (null = not enough history).
#[derive(Debug, Clone, Serialize)]
pub struct EmaLines {
    pub ema20: Vec<Option<f64>>,
    pub ema50: Vec<Option<f64>>,
    pub ema100: Vec<Option<f64>>,
    pub ema200: Vec<Option<f64>>,
}

/// Stochastic %K/%D panel lines, aligned 1:1 with `candles`.
#[derive(Debug, Clone, Serialize)]
pub struct StochasticLines {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Support/resistance segments and the markers flagged against them.
#[derive(Debug, Clone, Serialize)]
pub struct StructuralLevels {
    pub segments: Vec<LevelSegment>,
    pub markers: Vec<Marker>,
}

/// The full per-instrument analysis payload.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentAnalysis {
    pub last_close: f64,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema100: Option<f64>,
    pub ema200: Option<f64>,
    pub trend_state: TrendState,
    pub candles: Vec<Bar>,
    pub ema_lines: EmaLines,
    pub macd_histogram: Vec<Option<f64>>,
    pub stochastic: StochasticLines,
    pub structural_levels: StructuralLevels,
}

/// One watchlist row: instrument identity plus either the analysis payload
/// or a failure message.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentRow {
    pub name: String,
    pub symbol: String,
    pub kind: InstrumentKind,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub analysis: Option<InstrumentAnalysis>,
}

/// The batch response for the watchlist endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub updated_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub items: Vec<InstrumentRow>,
}

// =============================================================================
// Per-instrument analysis
// =============================================================================

/// Derive the full analysis bundle from an oldest-first bar sequence.
///
/// Everything lookback-bound is computed over the whole window; only at the
/// end are the outputs clipped to the display window. The clip slices the
/// aligned series at the window-start index, which is the same boundary as
/// clipping by time because every series is positioned 1:1 with the bars.
pub fn analyze_bars(bars: &[Bar], params: &AnalysisParams) -> Result<InstrumentAnalysis> {
    let Some(last_bar) = bars.last() else {
        bail!("provider returned an empty bar series");
    };

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let times: Vec<i64> = bars.iter().map(|b| b.time).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume.unwrap_or(0.0)).collect();

    // ── Trend stack ─────────────────────────────────────────────────────
    let ema20 = ema(&closes, 20);
    let ema50 = ema(&closes, 50);
    let ema100 = ema(&closes, 100);
    let ema200 = ema(&closes, 200);

    let (e20, e50, e100, e200) = (
        last_defined(&ema20),
        last_defined(&ema50),
        last_defined(&ema100),
        last_defined(&ema200),
    );
    let trend_state = classify_trend(bars.len(), e20, e50, e100, e200);

    // ── Oscillator panels ───────────────────────────────────────────────
    let macd_out = macd(
        &closes,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    );
    let stoch = stochastic(
        &highs,
        &lows,
        &closes,
        params.stoch_k_len,
        params.stoch_k_smooth,
        params.stoch_d_smooth,
    );
    let osc = volume_oscillator(&volumes);

    // ── Structural levels and markers ───────────────────────────────────
    let support = forward_fill(&pivot_low(&lows, params.pivot_left, params.pivot_right));
    let resistance = forward_fill(&pivot_high(&highs, params.pivot_left, params.pivot_right));

    let mut segments = levels::build_segments(&support, &times, LevelKind::Support, params.max_segments);
    segments.extend(levels::build_segments(
        &resistance,
        &times,
        LevelKind::Resistance,
        params.max_segments,
    ));

    let markers = detect_markers(
        bars,
        &support,
        &resistance,
        &osc,
        params.volume_osc_threshold,
    );

    // ── Display clipping ────────────────────────────────────────────────
    let start = bars.len().saturating_sub(params.display_window);
    let window_start = times[start];
    let window_end = last_bar.time;

    let segments = levels::clip_segments(&segments, window_start, window_end);
    let markers: Vec<Marker> = markers
        .into_iter()
        .filter(|m| m.time >= window_start)
        .collect();

    Ok(InstrumentAnalysis {
        last_close: last_bar.close,
        ema20: e20,
        ema50: e50,
        ema100: e100,
        ema200: e200,
        trend_state,
        candles: bars[start..].to_vec(),
        ema_lines: EmaLines {
            ema20: ema20[start..].to_vec(),
            ema50: ema50[start..].to_vec(),
            ema100: ema100[start..].to_vec(),
            ema200: ema200[start..].to_vec(),
        },
        macd_histogram: macd_out.histogram[start..].to_vec(),
        stochastic: StochasticLines {
            k: stoch.k[start..].to_vec(),
            d: stoch.d[start..].to_vec(),
        },
        structural_levels: StructuralLevels { segments, markers },
    })
}

async fn fetch_and_analyze(
    client: &MarketDataClient,
    instrument: &Instrument,
    bar_count: u32,
    params: &AnalysisParams,
) -> Result<InstrumentAnalysis> {
    let bars = client.get_daily_bars(&instrument.symbol, bar_count).await?;
    analyze_bars(&bars, params)
}

/// Convert a per-instrument result into its watchlist row. Failures are
/// logged and stringified here, at the isolation boundary.
pub fn row_from_result(
    instrument: &Instrument,
    result: Result<InstrumentAnalysis>,
) -> InstrumentRow {
    match result {
        Ok(analysis) => InstrumentRow {
            name: instrument.name.clone(),
            symbol: instrument.symbol.clone(),
            kind: instrument.kind,
            ok: true,
            error: None,
            analysis: Some(analysis),
        },
        Err(e) => {
            warn!(instrument = %instrument.name, error = %e, "instrument analysis failed");
            InstrumentRow {
                name: instrument.name.clone(),
                symbol: instrument.symbol.clone(),
                kind: instrument.kind,
                ok: false,
                error: Some(format!("{e:#}")),
                analysis: None,
            }
        }
    }
}

// =============================================================================
// Batch orchestration
// =============================================================================

fn row_priority(row: &InstrumentRow) -> u8 {
    row.analysis
        .as_ref()
        .map(|a| a.trend_state.priority())
        .unwrap_or(2)
}

/// Sort indexed rows by trend priority (LONG, SHORT, then the rest), stable
/// by original input order.
pub fn order_rows(rows: &mut [(usize, InstrumentRow)]) {
    rows.sort_by_key(|(index, row)| (row_priority(row), *index));
}

/// Run the whole batch for one request: fetch + analyse every instrument of
/// the requested page concurrently, then order and package the rows.
pub async fn run_batch(state: &AppState, page: Option<u32>) -> BatchReport {
    let (instruments, bar_count, concurrency, params) = {
        let config = state.runtime_config.read();
        (
            config.instruments_for_page(page),
            config.bar_count,
            config.fetch_concurrency.max(1),
            config.analysis_params.clone(),
        )
    };

    let client = state.market_client.clone();
    let mut rows: Vec<(usize, InstrumentRow)> =
        stream::iter(instruments.into_iter().enumerate())
            .map(|(index, instrument)| {
                let client = client.clone();
                let params = params.clone();
                async move {
                    let result =
                        fetch_and_analyze(&client, &instrument, bar_count, &params).await;
                    (index, row_from_result(&instrument, result))
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

    order_rows(&mut rows);

    let failures = rows.iter().filter(|(_, r)| !r.ok).count();
    info!(rows = rows.len(), failures, ?page, "watchlist batch complete");

    BatchReport {
        updated_utc: Utc::now().to_rfc3339(),
        page,
        items: rows.into_iter().map(|(_, row)| row).collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Daily bars with a steadily rising close (uptrend) or falling close.
    fn synth_bars(n: usize, rising: bool) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let step = if rising { i as f64 } else { (n - i) as f64 };
                let close = 100.0 + step * 0.5;
                Bar {
                    time: 1_700_000_000 + i as i64 * 86_400,
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: Some(1_000.0 + i as f64),
                }
            })
            .collect()
    }

    fn test_instrument() -> Instrument {
        Instrument {
            name: "EURUSD".to_string(),
            symbol: "EUR/USD".to_string(),
            kind: InstrumentKind::Forex,
            page: 1,
        }
    }

    #[test]
    fn full_window_uptrend_classifies_long_and_clips_to_display_window() {
        let bars = synth_bars(260, true);
        let params = AnalysisParams::default();
        let analysis = analyze_bars(&bars, &params).unwrap();

        assert_eq!(analysis.trend_state, TrendState::Long);
        assert_eq!(analysis.last_close, bars.last().unwrap().close);
        assert!(analysis.ema200.is_some());

        // Clipped to the display window, all panels aligned with candles.
        assert_eq!(analysis.candles.len(), params.display_window);
        assert_eq!(analysis.ema_lines.ema20.len(), params.display_window);
        assert_eq!(analysis.ema_lines.ema200.len(), params.display_window);
        assert_eq!(analysis.macd_histogram.len(), params.display_window);
        assert_eq!(analysis.stochastic.k.len(), params.display_window);
        assert_eq!(analysis.stochastic.d.len(), params.display_window);

        // Short lookbacks are fully warm inside the window; the EMA200 line
        // still carries its warm-up gap at the window's left edge.
        assert!(analysis.ema_lines.ema20.iter().all(Option::is_some));
        assert!(analysis.macd_histogram.iter().all(Option::is_some));
        assert!(analysis.ema_lines.ema200.first().unwrap().is_none());
        assert!(analysis.ema_lines.ema200.last().unwrap().is_some());
    }

    #[test]
    fn downtrend_classifies_short() {
        let analysis = analyze_bars(&synth_bars(260, false), &AnalysisParams::default()).unwrap();
        assert_eq!(analysis.trend_state, TrendState::Short);
    }

    #[test]
    fn short_history_is_insufficient_with_undefined_long_emas() {
        let analysis = analyze_bars(&synth_bars(100, true), &AnalysisParams::default()).unwrap();
        assert_eq!(analysis.trend_state, TrendState::Insufficient);
        assert!(analysis.ema200.is_none());
        assert!(analysis.ema20.is_some());
        // Shorter than the display window: nothing is padded.
        assert_eq!(analysis.candles.len(), 100);
    }

    #[test]
    fn empty_bar_series_is_an_error() {
        assert!(analyze_bars(&[], &AnalysisParams::default()).is_err());
    }

    /// Slowly oscillating bars: produces real pivot highs and lows so the
    /// structural outputs are non-trivial.
    fn zigzag_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + 10.0 * (i as f64 / 20.0).sin();
                Bar {
                    time: 1_700_000_000 + i as i64 * 86_400,
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: Some(1_000.0),
                }
            })
            .collect()
    }

    #[test]
    fn structural_outputs_stay_inside_the_display_window() {
        let bars = zigzag_bars(260);
        let params = AnalysisParams::default();
        let analysis = analyze_bars(&bars, &params).unwrap();

        let window_start = analysis.candles.first().unwrap().time;
        let window_end = analysis.candles.last().unwrap().time;

        let segments = &analysis.structural_levels.segments;
        assert!(!segments.is_empty(), "oscillating series must produce levels");
        assert!(segments.iter().any(|s| s.kind == LevelKind::Support));
        assert!(segments.iter().any(|s| s.kind == LevelKind::Resistance));

        for seg in segments {
            assert!(seg.valid_from >= window_start);
            assert!(seg.valid_to <= window_end);
            assert!(seg.valid_to > seg.valid_from);
        }
        for marker in &analysis.structural_levels.markers {
            assert!(marker.time >= window_start);
        }
    }

    #[test]
    fn failed_result_becomes_a_failure_row() {
        let row = row_from_result(&test_instrument(), Err(anyhow!("provider error: timeout")));
        assert!(!row.ok);
        assert!(row.analysis.is_none());
        assert!(row.error.as_deref().unwrap().contains("timeout"));
        assert_eq!(row.name, "EURUSD");
    }

    #[test]
    fn successful_result_becomes_a_full_row() {
        let analysis = analyze_bars(&synth_bars(260, true), &AnalysisParams::default()).unwrap();
        let row = row_from_result(&test_instrument(), Ok(analysis));
        assert!(row.ok);
        assert!(row.error.is_none());
        assert!(row.analysis.is_some());
    }

    #[test]
    fn mixed_batch_keeps_every_row_and_orders_by_trend() {
        let params = AnalysisParams::default();
        let results = vec![
            analyze_bars(&synth_bars(260, false), &params), // SHORT
            Err(anyhow!("fetch failed")),                   // failure
            analyze_bars(&synth_bars(260, true), &params),  // LONG
            analyze_bars(&synth_bars(100, true), &params),  // INSUFFICIENT
            analyze_bars(&synth_bars(260, true), &params),  // LONG
        ];

        let mut rows: Vec<(usize, InstrumentRow)> = results
            .into_iter()
            .enumerate()
            .map(|(i, r)| (i, row_from_result(&test_instrument(), r)))
            .collect();
        order_rows(&mut rows);

        // Batch size unchanged; LONGs first in input order, then SHORT, then
        // the failure and the insufficient row in input order.
        assert_eq!(rows.len(), 5);
        let order: Vec<usize> = rows.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![2, 4, 0, 1, 3]);
        assert!(rows.iter().filter(|(_, r)| !r.ok).count() == 1);
    }

    #[test]
    fn row_serialises_flat_with_ok_flag() {
        let analysis = analyze_bars(&synth_bars(260, true), &AnalysisParams::default()).unwrap();
        let row = row_from_result(&test_instrument(), Ok(analysis));
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["ok"], true);
        assert_eq!(json["kind"], "forex");
        assert_eq!(json["trend_state"], "LONG");
        assert!(json["last_close"].is_number());
        assert!(json["candles"].is_array());
        assert!(json.get("error").is_none());

        let failure = row_from_result(&test_instrument(), Err(anyhow!("boom")));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json["error"].as_str().unwrap().contains("boom"));
        assert!(json.get("candles").is_none());
    }
}
