// =============================================================================
// Regime Sentiment — regime classification and multi-factor sentiment fusion
// =============================================================================
//
// Turns a time-ordered bar series into one trading sentiment decision:
// directional bias, bounded confidence, risk tier and a trade-permission flag,
// informed by a trend / volatility / volume regime classification.
//
//   BarSeries -> BarValidator -> (SignalRegistry, RegimeClassifier)
//             -> ConfidenceScorer -> SentimentEngine -> SentimentResult
// =============================================================================

pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod multi_timeframe;
pub mod regime;
pub mod runtime_config;
pub mod signals;
pub mod types;
pub mod validator;

pub use engine::{SentimentEngine, SentimentResult};
pub use error::{EngineError, Result};
pub use market_data::{Bar, BarSeries, RawBar};
pub use multi_timeframe::{MultiTimeframeResult, SentimentBreakdown};
pub use regime::{Favorability, RegimeState, TrendRegime, VolatilityRegime, VolumeRegime};
pub use runtime_config::{ConfigHandle, EngineConfig};
pub use signals::{Signal, SignalSource};
pub use types::{Direction, RiskLevel, Timeframe};
pub use validator::{BarValidator, ValidationReport};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shared_types_are_thread_safe() {
        assert_send_sync::<SentimentEngine>();
        assert_send_sync::<ConfigHandle>();
        assert_send_sync::<SentimentResult>();
        assert_send_sync::<MultiTimeframeResult>();
        assert_send_sync::<Box<dyn SignalSource>>();
    }
}
