// =============================================================================
// Volume Oscillator
// =============================================================================
//
// osc = 100 * (EMA(volume, 5) - EMA(volume, 10)) / EMA(volume, 10)
//
// Unlike the price-derived series, the oscillator is dense: it gates marker
// emission, so a slot is `0.0` (gate closed) whenever either EMA is still
// undefined or the long EMA is zero.

use super::ema::ema;

/// Short EMA period of the oscillator.
const SHORT_PERIOD: usize = 5;
/// Long EMA period of the oscillator.
const LONG_PERIOD: usize = 10;

/// Compute the volume oscillator. `volumes` carries a `0.0` where the
/// provider reported no volume.
pub fn volume_oscillator(volumes: &[f64]) -> Vec<f64> {
    let short = ema(volumes, SHORT_PERIOD);
    let long = ema(volumes, LONG_PERIOD);

    short
        .iter()
        .zip(long.iter())
        .map(|(s, l)| match (s, l) {
            (Some(s), Some(l)) if *l != 0.0 => 100.0 * (s - l) / l,
            _ => 0.0,
        })
        .collect()
}
