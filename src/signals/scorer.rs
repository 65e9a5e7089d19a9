// =============================================================================
// Confidence Scorer — weighted fusion of registry signals
// =============================================================================
//
//   w_i        = weight_i / sum(weight)
//   score      = sum(w_i * strength_i / 10 * sign_i)            in [-1, 1]
//   confidence = (score + 1) / 2                                in [0, 1]
//   dispersion = 1 - |sum(w_i * sign_i)| / sum(w_i * |sign_i|)  in [0, 1]
//
// Risk comes from how much the signal directions disagree, independent of
// their strength. The regime never changes the magnitude here; it is only
// recorded in the trace output. Regime adjustment is the engine's job.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EngineError, Result};
use crate::regime::RegimeState;
use crate::runtime_config::ScoringParams;
use crate::types::{Direction, RiskLevel};

use super::registry::{Signal, MAX_STRENGTH};

/// Dispersion reported when every signal is neutral.
const ALL_NEUTRAL_DISPERSION: f64 = 0.5;

/// The contribution of a single signal to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub name: String,
    pub direction: Direction,
    pub strength: f64,
    /// Weight as supplied by the signal.
    pub raw_weight: f64,
    /// Weight after normalisation over this call's signals.
    pub weight: f64,
    pub contribution: f64,
}

/// Output of [`ConfidenceScorer::score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// Bounded confidence in [0, 1].
    pub confidence: f64,
    /// Raw weighted direction score in [-1, 1].
    pub direction_score: f64,
    pub sentiment: Direction,
    pub dispersion: f64,
    pub risk_level: RiskLevel,
    pub contributions: Vec<SignalContribution>,
}

/// Pure scorer over one set of thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer<'a> {
    params: &'a ScoringParams,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(params: &'a ScoringParams) -> Self {
        Self { params }
    }

    /// Fuse `signals` into a confidence, sentiment and risk level.
    ///
    /// Fails with `InsufficientData` when there are no signals or their
    /// weights sum to zero.
    pub fn score(&self, signals: &[Signal], regime: &RegimeState) -> Result<ScoreOutcome> {
        let total_weight: f64 = signals.iter().map(|s| s.weight).sum();
        if signals.is_empty() || total_weight <= 0.0 || !total_weight.is_finite() {
            return Err(EngineError::insufficient(format!(
                "{} signals with total weight {total_weight}",
                signals.len()
            )));
        }

        let mut contributions = Vec::with_capacity(signals.len());
        let mut score = 0.0;
        let mut signed_weight = 0.0;
        let mut directional_weight = 0.0;

        for signal in signals {
            let weight = signal.weight / total_weight;
            let sign = signal.direction.sign();
            let contribution = weight * (signal.strength / MAX_STRENGTH) * sign;

            score += contribution;
            signed_weight += weight * sign;
            directional_weight += weight * sign.abs();

            contributions.push(SignalContribution {
                name: signal.name.clone(),
                direction: signal.direction,
                strength: signal.strength,
                raw_weight: signal.weight,
                weight,
                contribution,
            });
        }

        let score = score.clamp(-1.0, 1.0);
        let confidence = ((score + 1.0) / 2.0).clamp(0.0, 1.0);

        let threshold = self.params.sentiment_threshold;
        let sentiment = if score > threshold {
            Direction::Bullish
        } else if score < -threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let dispersion = if directional_weight > 0.0 {
            (1.0 - signed_weight.abs() / directional_weight).clamp(0.0, 1.0)
        } else {
            ALL_NEUTRAL_DISPERSION
        };
        let [low_edge, high_edge] = self.params.risk_edges;
        let risk_level = if dispersion < low_edge {
            RiskLevel::Low
        } else if dispersion < high_edge {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        trace!(
            signals = signals.len(),
            score = format!("{:.4}", score),
            confidence = format!("{:.4}", confidence),
            dispersion = format!("{:.3}", dispersion),
            %sentiment,
            %risk_level,
            regime = %regime,
            "Signals scored"
        );

        Ok(ScoreOutcome {
            confidence,
            direction_score: score,
            sentiment,
            dispersion,
            risk_level,
            contributions,
        })
    }
}

/// Qualitative label for a confidence value, based on its distance from the
/// undecided midpoint 0.5.
pub fn confidence_label(confidence: f64) -> &'static str {
    let conviction = (2.0 * confidence - 1.0).abs();
    if conviction >= 0.85 {
        "VERY HIGH"
    } else if conviction >= 0.70 {
        "HIGH"
    } else if conviction >= 0.55 {
        "MODERATE"
    } else if conviction >= 0.40 {
        "LOW"
    } else {
        "VERY LOW"
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{RegimeMetrics, TrendRegime, VolatilityRegime, VolumeRegime};
    use proptest::prelude::*;

    fn regime() -> RegimeState {
        RegimeState::new(
            TrendRegime::Ranging,
            VolatilityRegime::Normal,
            VolumeRegime::Normal,
            RegimeMetrics {
                adx: 15.0,
                plus_di: 12.0,
                minus_di: 12.0,
                efficiency: 0.0,
                net_change: 0.0,
                atr_pct: 0.3,
                volatility_percentile: 50.0,
                volatility_expanding: false,
                volume_percentile: 50.0,
                relative_volume: 1.0,
                obv_trend: 0,
            },
        )
    }

    fn sig(direction: Direction, strength: f64, weight: f64) -> Signal {
        Signal::new("s", direction, strength, weight)
    }

    #[test]
    fn mixed_pair_leans_bullish() {
        let params = ScoringParams::default();
        let out = ConfidenceScorer::new(&params)
            .score(
                &[sig(Direction::Bullish, 8.0, 0.5), sig(Direction::Bearish, 4.0, 0.5)],
                &regime(),
            )
            .unwrap();
        // 0.5 * 0.8 - 0.5 * 0.4 = 0.2
        assert!((out.direction_score - 0.2).abs() < 1e-12);
        assert!(out.confidence > 0.5 && out.confidence < 1.0);
        assert_eq!(out.sentiment, Direction::Bullish);
        // Equal weight on opposite sides.
        assert_eq!(out.risk_level, RiskLevel::High);
    }

    #[test]
    fn weights_are_normalised() {
        let params = ScoringParams::default();
        let scorer = ConfidenceScorer::new(&params);
        let a = scorer
            .score(&[sig(Direction::Bullish, 10.0, 0.1)], &regime())
            .unwrap();
        let b = scorer
            .score(&[sig(Direction::Bullish, 10.0, 1.0)], &regime())
            .unwrap();
        assert!((a.confidence - 1.0).abs() < 1e-12);
        assert_eq!(a.confidence, b.confidence);
        assert!((a.contributions[0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn raw_weight_is_kept_beside_normalised() {
        let params = ScoringParams::default();
        let out = ConfidenceScorer::new(&params)
            .score(
                &[sig(Direction::Bullish, 6.0, 0.2), sig(Direction::Bearish, 3.0, 0.6)],
                &regime(),
            )
            .unwrap();
        let raw: Vec<f64> = out.contributions.iter().map(|c| c.raw_weight).collect();
        assert_eq!(raw, [0.2, 0.6]);
        assert!((out.contributions[0].weight - 0.25).abs() < 1e-12);
        assert!((out.contributions[1].weight - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_total_weight_is_insufficient() {
        let params = ScoringParams::default();
        let scorer = ConfidenceScorer::new(&params);
        assert!(matches!(
            scorer.score(&[sig(Direction::Bullish, 5.0, 0.0)], &regime()),
            Err(EngineError::InsufficientData(_))
        ));
        assert!(matches!(
            scorer.score(&[], &regime()),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn sentiment_threshold_is_exclusive() {
        let params = ScoringParams::default();
        let scorer = ConfidenceScorer::new(&params);
        // score exactly 0.10
        let out = scorer
            .score(&[sig(Direction::Bearish, 1.0, 1.0)], &regime())
            .unwrap();
        assert_eq!(out.sentiment, Direction::Neutral);
        let out = scorer
            .score(&[sig(Direction::Bearish, 1.5, 1.0)], &regime())
            .unwrap();
        assert_eq!(out.sentiment, Direction::Bearish);
    }

    #[test]
    fn unanimous_is_low_risk_and_neutral_is_medium() {
        let params = ScoringParams::default();
        let scorer = ConfidenceScorer::new(&params);
        let out = scorer
            .score(
                &[sig(Direction::Bearish, 3.0, 0.4), sig(Direction::Bearish, 9.0, 0.2)],
                &regime(),
            )
            .unwrap();
        assert_eq!(out.dispersion, 0.0);
        assert_eq!(out.risk_level, RiskLevel::Low);

        let out = scorer
            .score(&[sig(Direction::Neutral, 3.0, 0.4)], &regime())
            .unwrap();
        assert_eq!(out.dispersion, 0.5);
        assert_eq!(out.risk_level, RiskLevel::Medium);
        assert_eq!(out.confidence, 0.5);
    }

    #[test]
    fn labels_by_conviction() {
        assert_eq!(confidence_label(0.95), "VERY HIGH");
        assert_eq!(confidence_label(0.05), "VERY HIGH");
        assert_eq!(confidence_label(0.86), "HIGH");
        assert_eq!(confidence_label(0.80), "MODERATE");
        assert_eq!(confidence_label(0.72), "LOW");
        assert_eq!(confidence_label(0.5), "VERY LOW");
    }

    fn arb_signal() -> impl Strategy<Value = Signal> {
        (
            prop_oneof![
                Just(Direction::Bullish),
                Just(Direction::Bearish),
                Just(Direction::Neutral)
            ],
            0.0..=10.0f64,
            0.001..=1.0f64,
        )
            .prop_map(|(d, s, w)| sig(d, s, w))
    }

    proptest! {
        #[test]
        fn outputs_stay_bounded(signals in prop::collection::vec(arb_signal(), 1..20)) {
            let params = ScoringParams::default();
            let out = ConfidenceScorer::new(&params).score(&signals, &regime()).unwrap();
            prop_assert!((0.0..=1.0).contains(&out.confidence));
            prop_assert!((-1.0..=1.0).contains(&out.direction_score));
            prop_assert!((0.0..=1.0).contains(&out.dispersion));
            let weight_sum: f64 = out.contributions.iter().map(|c| c.weight).sum();
            prop_assert!((weight_sum - 1.0).abs() < 1e-9);
        }
    }
}
