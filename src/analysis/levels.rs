// =============================================================================
// Structural Level Builder
// =============================================================================
//
// Turns a forward-filled pivot series into horizontal support/resistance
// segments for the chart. A segment is a maximal run of bars over which the
// filled value stays constant: it opens at the first bar of the run and
// closes at the time of the bar where the value changes (not the prior
// bar's time), so consecutive segments tile the axis without gaps. The final
// open segment closes at the series' last time.

use serde::Serialize;

/// Which side of price the level sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A constant-price level over `[valid_from, valid_to]` (unix seconds).
/// `valid_to` is strictly greater than `valid_from`.
#[derive(Debug, Clone, Serialize)]
pub struct LevelSegment {
    pub price: f64,
    pub kind: LevelKind,
    pub valid_from: i64,
    pub valid_to: i64,
}

/// Compact a forward-filled pivot series into segments. Keeps only the
/// `max_segments` most recently emitted (oldest dropped first).
pub fn build_segments(
    filled: &[Option<f64>],
    times: &[i64],
    kind: LevelKind,
    max_segments: usize,
) -> Vec<LevelSegment> {
    debug_assert_eq!(filled.len(), times.len());

    let mut segments = Vec::new();
    let mut current: Option<(f64, i64)> = None;

    for (i, slot) in filled.iter().enumerate() {
        let Some(v) = slot else { continue };
        match current {
            None => current = Some((*v, times[i])),
            Some((price, from)) if *v != price => {
                emit(&mut segments, price, kind, from, times[i]);
                current = Some((*v, times[i]));
            }
            Some(_) => {}
        }
    }

    if let (Some((price, from)), Some(&last)) = (current, times.last()) {
        emit(&mut segments, price, kind, from, last);
    }

    if segments.len() > max_segments {
        let excess = segments.len() - max_segments;
        segments.drain(..excess);
    }
    segments
}

/// Emit a segment, dropping degenerate runs that carry no visible span.
fn emit(segments: &mut Vec<LevelSegment>, price: f64, kind: LevelKind, from: i64, to: i64) {
    if to > from {
        segments.push(LevelSegment {
            price,
            kind,
            valid_from: from,
            valid_to: to,
        });
    }
}

/// Clip segments to the visible window, discarding any whose clipped end is
/// not strictly after its clipped start.
pub fn clip_segments(
    segments: &[LevelSegment],
    window_start: i64,
    window_end: i64,
) -> Vec<LevelSegment> {
    segments
        .iter()
        .filter_map(|seg| {
            let from = seg.valid_from.max(window_start);
            let to = seg.valid_to.min(window_end);
            (to > from).then(|| LevelSegment {
                valid_from: from,
                valid_to: to,
                ..seg.clone()
            })
        })
        .collect()
}
