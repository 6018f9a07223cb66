// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period`
// inputs. Output stays aligned with the input: every slot before index
// `period - 1` is undefined.

/// Compute the aligned EMA series for `values` with look-back `period`.
///
/// The returned vector has the same length as `values`. Slots before index
/// `period - 1` are `None`; slot `period - 1` holds the SMA seed.
///
/// # Edge cases
/// - `period == 0` => entirely undefined output (division by zero guard)
/// - `values.len() < period` => entirely undefined output
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values.
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;

    let mut result = vec![None; values.len()];
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for (i, &v) in values.iter().enumerate().skip(period) {
        let e = v * multiplier + prev * (1.0 - multiplier);
        result[i] = Some(e);
        prev = e;
    }

    result
}
