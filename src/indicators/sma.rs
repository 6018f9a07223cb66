// =============================================================================
// Simple Moving Average (SMA) over a possibly-sparse series
// =============================================================================
//
// True sliding-window mean of the last `period` inputs. A slot is defined
// only once a full window of *defined* inputs has been observed: any
// undefined value inside the window propagates as an undefined output, never
// as a zero. This is what lets the stochastic %K/%D smoothing inherit the
// raw series' warm-up gap instead of averaging phantom zeros into it.

/// Compute the aligned windowed mean of `values` with window `period`.
pub fn sma(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut result = vec![None; values.len()];
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().all(Option::is_some) {
            let sum: f64 = window.iter().map(|v| v.unwrap_or(0.0)).sum();
            result[i] = Some(sum / period as f64);
        }
    }
    result
}
