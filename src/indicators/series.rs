// =============================================================================
// Aligned series helpers
// =============================================================================
//
// Every derived series in the pipeline is a `Vec<Option<f64>>` positioned
// 1:1 against its bar sequence. `None` means the slot is undefined because
// the lookback has not been satisfied yet; it is never conflated with zero.

/// Forward-fill: slot `i` takes the most recent defined value at or before
/// `i`. Leading undefined slots stay undefined.
pub fn forward_fill(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    series
        .iter()
        .map(|slot| {
            if slot.is_some() {
                last = *slot;
            }
            last
        })
        .collect()
}

/// Pointwise combination of two aligned series. The output slot is defined
/// only where both inputs are defined.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}

/// The most recent defined value in the series, if any.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|slot| *slot)
}
