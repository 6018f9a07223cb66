// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free series math. Derived series stay positionally
// aligned with their bar sequence as `Vec<Option<f64>>`; a `None` slot means
// the lookback is not satisfied yet, so callers are forced to handle
// insufficient history instead of reading a silent zero.

pub mod ema;
pub mod macd;
pub mod series;
pub mod sma;
pub mod sparse;
pub mod stochastic;
pub mod volume;
