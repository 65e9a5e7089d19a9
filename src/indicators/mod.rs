// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator kernels used by the regime classifier and
// the reference signal sources. Functions return `Option<T>` or an empty
// `Vec` so callers must handle insufficient data and non-finite input.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod momentum;
pub mod percentile;
pub mod rsi;
