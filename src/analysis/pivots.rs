// =============================================================================
// Pivot Detector
// =============================================================================
//
// A pivot high at index `i` is a bar whose high no preceding bar (within
// `left`) reaches and no following bar (within `right`) exceeds. The
// comparison is deliberately asymmetric: an equal value *before* the
// candidate disqualifies it, an equal value *after* does not. In a flat-top
// run this marks the earliest bar of the run and only that bar. Pivot lows
// mirror the rule sign-reversed.
//
// Output is sparse: `Some(value)` only at qualifying indices, and only where
// both margins fit fully inside the series.

/// Scan for pivot highs over `highs` with `left`/`right` confirmation margins.
pub fn pivot_high(highs: &[f64], left: usize, right: usize) -> Vec<Option<f64>> {
    let n = highs.len();
    let mut result = vec![None; n];
    if n < left + right + 1 {
        return result;
    }

    for i in left..(n - right) {
        let v = highs[i];
        let before_ok = highs[i - left..i].iter().all(|&p| p < v);
        let after_ok = highs[i + 1..=i + right].iter().all(|&f| f <= v);
        if before_ok && after_ok {
            result[i] = Some(v);
        }
    }
    result
}

/// Scan for pivot lows over `lows` with `left`/`right` confirmation margins.
pub fn pivot_low(lows: &[f64], left: usize, right: usize) -> Vec<Option<f64>> {
    let n = lows.len();
    let mut result = vec![None; n];
    if n < left + right + 1 {
        return result;
    }

    for i in left..(n - right) {
        let v = lows[i];
        let before_ok = lows[i - left..i].iter().all(|&p| p > v);
        let after_ok = lows[i + 1..=i + right].iter().all(|&f| f >= v);
        if before_ok && after_ok {
            result[i] = Some(v);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_peak_is_found_at_the_peak() {
        // Strictly increasing then decreasing: exactly one pivot, at the top.
        let highs = vec![1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let out = pivot_high(&highs, 3, 3);
        let found: Vec<usize> = out
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| i))
            .collect();
        assert_eq!(found, vec![4]);
        assert_eq!(out[4], Some(5.0));
    }

    #[test]
    fn flat_top_marks_only_the_earlier_bar() {
        let highs = vec![1.0, 2.0, 5.0, 5.0, 2.0, 1.0];
        let out = pivot_high(&highs, 2, 2);
        // Index 2: nothing before reaches 5.0, the equal 5.0 after does not
        // disqualify. Index 3: the equal 5.0 before does.
        assert_eq!(out[2], Some(5.0));
        assert_eq!(out[3], None);
    }

    #[test]
    fn equal_preceding_value_disqualifies() {
        let highs = vec![5.0, 4.0, 5.0, 3.0, 2.0];
        let out = pivot_high(&highs, 2, 2);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn margins_must_fit_inside_the_series() {
        let highs = vec![1.0, 9.0, 1.0];
        // left=2 cannot fit for any index.
        assert!(pivot_high(&highs, 2, 1).iter().all(Option::is_none));
        // left=1, right=1 fits at index 1.
        assert_eq!(pivot_high(&highs, 1, 1)[1], Some(9.0));
    }

    #[test]
    fn series_shorter_than_both_margins_has_no_pivots() {
        let highs = vec![1.0, 2.0];
        assert!(pivot_high(&highs, 2, 2).iter().all(Option::is_none));
    }

    #[test]
    fn pivot_low_mirrors_the_high_rule() {
        let lows = vec![5.0, 4.0, 1.0, 1.0, 4.0, 5.0];
        let out = pivot_low(&lows, 2, 2);
        assert_eq!(out[2], Some(1.0));
        assert_eq!(out[3], None);

        let valley = vec![9.0, 7.0, 5.0, 3.0, 5.0, 7.0, 9.0];
        let found: Vec<usize> = pivot_low(&valley, 3, 3)
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| i))
            .collect();
        assert_eq!(found, vec![3]);
    }

    #[test]
    fn zero_margins_mark_every_bar() {
        // Degenerate but well-defined: empty margin checks are vacuously true.
        let highs = vec![1.0, 2.0, 3.0];
        let out = pivot_high(&highs, 0, 0);
        assert!(out.iter().all(Option::is_some));
    }
}
