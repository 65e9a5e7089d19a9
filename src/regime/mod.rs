// =============================================================================
// Regime Classification Module
// =============================================================================
//
// Three independent regime dimensions derived from a bar series:
// - Trend (ADX, +DI / -DI and the efficiency ratio)
// - Volatility (percentile rank of ATR%)
// - Volume (percentile rank within the window, plus OBV trend)
//
// and a composite favorability read from a constant lookup table.

pub mod detector;
pub mod favorability;
pub mod states;

pub use detector::RegimeClassifier;
pub use favorability::favorability;
pub use states::{
    Favorability, RegimeLabel, RegimeMetrics, RegimeState, TrendRegime, VolatilityRegime,
    VolumeRegime,
};
