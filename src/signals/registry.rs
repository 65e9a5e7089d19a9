// =============================================================================
// Signal Registry — ordered collection of validated indicator outputs
// =============================================================================
//
// Signals come from collaborators (indicator library, pattern detectors, ML
// ensemble) and are treated as opaque. The registry only enforces the
// contract every signal must honour:
//
//   - non-empty name
//   - strength finite and inside [0, 10]
//   - weight finite and inside [0, 1]
//
// Anything else is dropped with a recorded reason instead of failing the
// whole analysis.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Direction;

/// Upper bound of [`Signal::strength`].
pub const MAX_STRENGTH: f64 = 10.0;

/// One named, directional, weighted piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub direction: Direction,
    /// Conviction in [0, 10].
    pub strength: f64,
    /// Relative importance in [0, 1]. Weights need not sum to one.
    pub weight: f64,
}

impl Signal {
    pub fn new(name: impl Into<String>, direction: Direction, strength: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            direction,
            strength,
            weight,
        }
    }

    /// Describe the first contract violation, if any.
    pub fn contract_violation(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("signal has an empty name".to_string());
        }
        if !self.strength.is_finite() || !(0.0..=MAX_STRENGTH).contains(&self.strength) {
            return Some(format!(
                "signal {} strength {} outside [0, {MAX_STRENGTH}]",
                self.name, self.strength
            ));
        }
        if !self.weight.is_finite() || !(0.0..=1.0).contains(&self.weight) {
            return Some(format!(
                "signal {} weight {} outside [0, 1]",
                self.name, self.weight
            ));
        }
        None
    }
}

/// A source or signal left out of the analysis, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedSource {
    pub source: String,
    pub reason: String,
}

/// Signals accepted for one analysis call, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    signals: Vec<Signal>,
    dropped: Vec<DroppedSource>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `signal` from `source`, or record why it was rejected.
    /// Returns whether the signal was accepted.
    pub fn push(&mut self, source: &str, signal: Signal) -> bool {
        match signal.contract_violation() {
            Some(reason) => {
                self.drop_source(source, reason);
                false
            }
            None => {
                self.signals.push(signal);
                true
            }
        }
    }

    /// Push every signal a source produced. An empty batch counts as a drop.
    pub fn extend(&mut self, source: &str, signals: Vec<Signal>) {
        if signals.is_empty() {
            self.drop_source(source, "source produced no signals");
            return;
        }
        for signal in signals {
            self.push(source, signal);
        }
    }

    /// Record that `source` contributed nothing usable.
    pub fn drop_source(&mut self, source: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(source, reason = %reason, "Signal dropped");
        self.dropped.push(DroppedSource {
            source: source.to_string(),
            reason,
        });
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn dropped(&self) -> &[DroppedSource] {
        &self.dropped
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Signal>, Vec<DroppedSource>) {
        (self.signals, self.dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_signals_in_order() {
        let mut registry = SignalRegistry::new();
        assert!(registry.push("ta", Signal::new("rsi", Direction::Bullish, 6.0, 0.2)));
        assert!(registry.push("ta", Signal::new("ema", Direction::Bearish, 0.0, 0.0)));
        assert!(registry.push("ta", Signal::new("smc", Direction::Neutral, 10.0, 1.0)));
        let names: Vec<_> = registry.signals().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["rsi", "ema", "smc"]);
        assert!(registry.dropped().is_empty());
    }

    #[test]
    fn rejects_contract_violations() {
        let mut registry = SignalRegistry::new();
        assert!(!registry.push("ml", Signal::new("", Direction::Bullish, 5.0, 0.5)));
        assert!(!registry.push("ml", Signal::new("a", Direction::Bullish, 10.5, 0.5)));
        assert!(!registry.push("ml", Signal::new("b", Direction::Bullish, f64::NAN, 0.5)));
        assert!(!registry.push("ml", Signal::new("c", Direction::Bullish, 5.0, -0.1)));
        assert!(!registry.push("ml", Signal::new("d", Direction::Bullish, 5.0, f64::INFINITY)));
        assert!(registry.is_empty());
        assert_eq!(registry.dropped().len(), 5);
        assert!(registry.dropped()[1].reason.contains("strength"));
        assert!(registry.dropped()[3].reason.contains("weight"));
    }

    #[test]
    fn empty_batch_is_recorded() {
        let mut registry = SignalRegistry::new();
        registry.extend("smc", Vec::new());
        let (signals, dropped) = registry.into_parts();
        assert!(signals.is_empty());
        assert_eq!(
            dropped,
            vec![DroppedSource {
                source: "smc".into(),
                reason: "source produced no signals".into()
            }]
        );
    }
}
