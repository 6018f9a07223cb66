// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
// raw_k[i] = 100 * (close[i] - LL) / (HH - LL) over the trailing `k_len`-bar
// high/low window, with raw_k = 0 on a flat window (HH == LL). %K smooths
// raw_k with an SMA of `k_smooth`, %D smooths %K with an SMA of `d_smooth`.

use super::sma::sma;

/// Smoothed %K and %D, aligned with the input bars.
#[derive(Debug, Clone)]
pub struct Stochastic {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Unsmoothed %K. Defined from index `k_len - 1`; a zero-range window yields
/// exactly `0` rather than a division-by-zero artifact.
pub fn raw_k(highs: &[f64], lows: &[f64], closes: &[f64], k_len: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    if k_len == 0 {
        return vec![None; n];
    }

    let mut result = vec![None; n];
    for i in (k_len - 1)..n {
        let window = (i + 1 - k_len)..=i;
        let hh = highs[window.clone()].iter().copied().fold(f64::MIN, f64::max);
        let ll = lows[window].iter().copied().fold(f64::MAX, f64::min);

        result[i] = if hh == ll {
            Some(0.0)
        } else {
            Some(100.0 * (closes[i] - ll) / (hh - ll))
        };
    }
    result
}

/// Full stochastic: raw %K smoothed twice.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_len: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> Stochastic {
    let raw = raw_k(highs, lows, closes, k_len);
    let k = sma(&raw, k_smooth);
    let d = sma(&k, d_smooth);
    Stochastic { k, d }
}
