// =============================================================================
// Sparse series
// =============================================================================
//
// A compacted view of an aligned series: the defined values plus the indices
// they came from, and the total length of the original. Used where a
// derivation must run over defined values only and the result must land back
// on the original positions (the MACD signal line counts its lookback from
// the first defined macd value, not from the start of the bar sequence).

/// Defined `(index, value)` points of an aligned series plus its length.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSeries {
    len: usize,
    points: Vec<(usize, f64)>,
}

impl SparseSeries {
    /// Compact an aligned series, remembering where each defined value sat.
    pub fn from_dense(series: &[Option<f64>]) -> Self {
        let points = series
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|v| (i, v)))
            .collect();
        Self {
            len: series.len(),
            points,
        }
    }

    /// Length of the original aligned series.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The defined values in positional order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Scatter a transform of the compacted values back onto the original
    /// positions. `transformed` must be aligned with [`values`](Self::values)
    /// (one slot per defined point); a `None` slot stays undefined in the
    /// output, as do all positions that were undefined to begin with.
    pub fn scatter(&self, transformed: &[Option<f64>]) -> Vec<Option<f64>> {
        debug_assert_eq!(transformed.len(), self.points.len());

        let mut out = vec![None; self.len];
        for ((index, _), slot) in self.points.iter().zip(transformed.iter()) {
            out[*index] = *slot;
        }
        out
    }
}
