// =============================================================================
// Moving Average Convergence/Divergence (MACD)
// =============================================================================
//
// macd_line  = EMA(fast) - EMA(slow), defined where both are
// signal     = EMA(signal_period) over the *compacted* macd line, scattered
//              back to the original positions
// histogram  = macd_line - signal, defined where both are
//
// The compaction step matters: the signal line's lookback counts from the
// first defined macd value, not from the start of the bar sequence. Running
// the signal EMA over the aligned series directly would either shift its
// warm-up or average in phantom zeros.

use super::ema::ema;
use super::series::zip_with;
use super::sparse::SparseSeries;

/// The three aligned MACD series. The dashboard payload uses the histogram;
/// the line and signal are exposed for inspection and tests.
#[derive(Debug, Clone)]
pub struct Macd {
    pub macd_line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Compute MACD over `closes` with the given periods.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let macd_line = zip_with(&fast_ema, &slow_ema, |f, s| f - s);

    // Signal: EMA over the defined macd values only, landed back in place.
    let sparse = SparseSeries::from_dense(&macd_line);
    let signal_line = sparse.scatter(&ema(&sparse.values(), signal));

    let histogram = zip_with(&macd_line, &signal_line, |m, s| m - s);

    Macd {
        macd_line,
        signal_line,
        histogram,
    }
}
