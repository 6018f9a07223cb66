// =============================================================================
// Breakout / Wick Marker Detector
// =============================================================================
//
// Scans each bar against the forward-filled support and resistance levels.
// A close crossing under support (or over resistance) emits exactly one of
// two markers for that direction:
//
//   - a *wick* marker when the bar's shadow dominates its body on the
//     crossing side (the move looks like a rejection, not a break), emitted
//     regardless of volume;
//   - a *breakout* marker otherwise, but only when the volume oscillator
//     clears the configured threshold.
//
// The shape tests are complementary, so a breakout and a wick marker for the
// same direction can never co-occur on one bar.

use serde::Serialize;

use crate::market_data::Bar;

/// Markers retained per instrument, most recent kept.
const MAX_MARKERS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Breakout,
    Wick,
}

/// Where the chart draws the marker relative to the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPosition {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerDirection {
    Up,
    Down,
}

/// A flagged bar on the chart.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub time: i64,
    pub position: MarkerPosition,
    pub kind: MarkerKind,
    pub direction: MarkerDirection,
}

/// Detect breakout and wick markers over the full bar sequence.
///
/// `support` and `resistance` are the forward-filled level series aligned
/// with `bars`; `osc` is the dense volume oscillator. Crossings are only
/// evaluated where the level is defined at both the previous and current bar.
pub fn detect_markers(
    bars: &[Bar],
    support: &[Option<f64>],
    resistance: &[Option<f64>],
    osc: &[f64],
    threshold: f64,
) -> Vec<Marker> {
    let mut markers = Vec::new();

    for i in 1..bars.len() {
        let prev_close = bars[i - 1].close;
        let bar = &bars[i];

        // Close crossing under support: down-direction markers, drawn above.
        if let (Some(prev_sup), Some(sup)) = (support[i - 1], support[i]) {
            let crossunder = prev_close >= prev_sup && bar.close < sup;
            if crossunder {
                let bear_wick = (bar.open - bar.close) < (bar.high - bar.open);
                if bear_wick {
                    markers.push(Marker {
                        time: bar.time,
                        position: MarkerPosition::Above,
                        kind: MarkerKind::Wick,
                        direction: MarkerDirection::Down,
                    });
                } else if osc[i] > threshold {
                    markers.push(Marker {
                        time: bar.time,
                        position: MarkerPosition::Above,
                        kind: MarkerKind::Breakout,
                        direction: MarkerDirection::Down,
                    });
                }
            }
        }

        // Close crossing over resistance: up-direction markers, drawn below.
        if let (Some(prev_res), Some(res)) = (resistance[i - 1], resistance[i]) {
            let crossover = prev_close <= prev_res && bar.close > res;
            if crossover {
                let bull_wick = (bar.open - bar.low) > (bar.close - bar.open);
                if bull_wick {
                    markers.push(Marker {
                        time: bar.time,
                        position: MarkerPosition::Below,
                        kind: MarkerKind::Wick,
                        direction: MarkerDirection::Up,
                    });
                } else if osc[i] > threshold {
                    markers.push(Marker {
                        time: bar.time,
                        position: MarkerPosition::Below,
                        kind: MarkerKind::Breakout,
                        direction: MarkerDirection::Up,
                    });
                }
            }
        }
    }

    if markers.len() > MAX_MARKERS {
        let excess = markers.len() - MAX_MARKERS;
        markers.drain(..excess);
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(time: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time,
            open,
            high,
            low,
            close,
            volume: Some(1_000.0),
        }
    }

    /// Two bars crossing under a support at 10.0, with a body-dominant shape
    /// (not a wick).
    fn breakdown_bars() -> Vec<Bar> {
        vec![
            bar(1, 10.4, 10.6, 10.2, 10.5),
            // open 10.4, close 9.0: body 1.4, upper shadow 10.5-10.4 = 0.1.
            bar(2, 10.4, 10.5, 8.8, 9.0),
        ]
    }

    #[test]
    fn breakdown_requires_the_volume_gate() {
        let bars = breakdown_bars();
        let support = vec![Some(10.0), Some(10.0)];
        let resistance = vec![None, None];

        let strong = detect_markers(&bars, &support, &resistance, &[0.0, 25.0], 20.0);
        assert_eq!(strong.len(), 1);
        assert_eq!(strong[0].kind, MarkerKind::Breakout);
        assert_eq!(strong[0].direction, MarkerDirection::Down);
        assert_eq!(strong[0].position, MarkerPosition::Above);
        assert_eq!(strong[0].time, 2);

        let weak = detect_markers(&bars, &support, &resistance, &[0.0, 5.0], 20.0);
        assert!(weak.is_empty());
    }

    #[test]
    fn bear_wick_ignores_the_volume_gate() {
        // Long upper shadow: open 9.2, high 10.6, close 9.0.
        let bars = vec![
            bar(1, 10.4, 10.6, 10.2, 10.5),
            bar(2, 9.2, 10.6, 8.8, 9.0),
        ];
        let support = vec![Some(10.0), Some(10.0)];
        let resistance = vec![None, None];

        let out = detect_markers(&bars, &support, &resistance, &[0.0, 0.0], 20.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MarkerKind::Wick);
        assert_eq!(out[0].direction, MarkerDirection::Down);
        assert_eq!(out[0].position, MarkerPosition::Above);
    }

    #[test]
    fn breakout_and_bull_wick_are_mutually_exclusive() {
        let resistance = vec![Some(10.0), Some(10.0)];
        let support = vec![None, None];
        let osc = vec![0.0, 30.0];

        // Body-dominant up cross: breakout.
        let body = vec![
            bar(1, 9.6, 9.8, 9.4, 9.5),
            bar(2, 9.6, 10.8, 9.5, 10.7),
        ];
        let out = detect_markers(&body, &support, &resistance, &osc, 20.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MarkerKind::Breakout);
        assert_eq!(out[0].direction, MarkerDirection::Up);
        assert_eq!(out[0].position, MarkerPosition::Below);

        // Shadow-dominant up cross: wick, and never both.
        let shadow = vec![
            bar(1, 9.6, 9.8, 9.4, 9.5),
            bar(2, 10.3, 10.8, 8.5, 10.5),
        ];
        let out = detect_markers(&shadow, &support, &resistance, &osc, 20.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MarkerKind::Wick);
        assert_eq!(out[0].direction, MarkerDirection::Up);
    }

    #[test]
    fn no_marker_where_the_level_is_undefined() {
        let bars = breakdown_bars();
        let support = vec![None, Some(10.0)];
        let resistance = vec![None, None];
        let out = detect_markers(&bars, &support, &resistance, &[0.0, 25.0], 20.0);
        assert!(out.is_empty());
    }

    #[test]
    fn no_crossing_no_marker() {
        // Close stays above support on both bars.
        let bars = vec![
            bar(1, 10.4, 10.6, 10.2, 10.5),
            bar(2, 10.5, 10.7, 10.3, 10.6),
        ];
        let support = vec![Some(10.0), Some(10.0)];
        let out = detect_markers(&bars, &support, &[None, None], &[0.0, 25.0], 20.0);
        assert!(out.is_empty());
    }

    #[test]
    fn retention_caps_at_the_most_recent_150() {
        // Alternate above/below support every bar so each pair emits one
        // down marker, with a long upper shadow so the gate never matters.
        let mut bars = Vec::new();
        for i in 0..400 {
            if i % 2 == 0 {
                bars.push(bar(i as i64, 10.4, 10.6, 10.2, 10.5));
            } else {
                bars.push(bar(i as i64, 9.2, 10.6, 8.8, 9.0));
            }
        }
        let n = bars.len();
        let support = vec![Some(10.0); n];
        let osc = vec![0.0; n];

        let out = detect_markers(&bars, &support, &vec![None; n], &osc, 20.0);
        assert_eq!(out.len(), 150);
        // Oldest dropped first: the last marker is from the final crossing.
        assert_eq!(out.last().unwrap().time, 399);
    }
}
