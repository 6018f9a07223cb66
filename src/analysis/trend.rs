// =============================================================================
// Trend Classifier
// =============================================================================
//
// Classifies an instrument from the latest defined EMA20/50/100/200 values.
// LONG requires the full strict chain ema20 > ema50 > ema100 > ema200; SHORT
// the fully reversed chain. Anything else is NONE. Fewer than 210 bars of
// history is reported as INSUFFICIENT, a distinct outcome that the dashboard
// renders differently from a flat NONE.

use serde::Serialize;

/// Minimum bar history required before a trend verdict is attempted.
pub const MIN_TREND_HISTORY: usize = 210;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendState {
    Long,
    Short,
    None,
    Insufficient,
}

impl TrendState {
    /// Sort priority for the batch response: LONG first, SHORT second,
    /// everything else last.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Long => 0,
            Self::Short => 1,
            Self::None | Self::Insufficient => 2,
        }
    }
}

impl std::fmt::Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
            Self::None => write!(f, "NONE"),
            Self::Insufficient => write!(f, "INSUFFICIENT"),
        }
    }
}

/// Classify from the latest defined EMA stack.
pub fn classify_trend(
    bar_count: usize,
    ema20: Option<f64>,
    ema50: Option<f64>,
    ema100: Option<f64>,
    ema200: Option<f64>,
) -> TrendState {
    if bar_count < MIN_TREND_HISTORY {
        return TrendState::Insufficient;
    }

    match (ema20, ema50, ema100, ema200) {
        (Some(e20), Some(e50), Some(e100), Some(e200)) => {
            if e20 > e50 && e50 > e100 && e100 > e200 {
                TrendState::Long
            } else if e20 < e50 && e50 < e100 && e100 < e200 {
                TrendState::Short
            } else {
                TrendState::None
            }
        }
        _ => TrendState::None,
    }
}
