// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
//   1. Deltas of consecutive closes.
//   2. Average gain / loss seeded with the SMA of the first `period` deltas.
//   3. Wilder's smoothing:
//        avg = (prev_avg * (period - 1) + current) / period
//   4. RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//
// Zone levels are not hard-coded: the momentum source passes its configured
// overbought / oversold levels to `RsiZone::of`.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of an RSI reading relative to the configured levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    /// Overbought at or above `overbought`, oversold at or below `oversold`.
    pub fn of(value: f64, overbought: f64, oversold: f64) -> Self {
        if value >= overbought {
            Self::Overbought
        } else if value <= oversold {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overbought => "OVERBOUGHT",
            Self::Oversold => "OVERSOLD",
            Self::Neutral => "NEUTRAL",
        })
    }
}

/// Full RSI series, one value per close from index `period`.
///
/// Empty when `period` is zero or there are fewer than `period + 1` closes.
/// A non-finite reading truncates the series.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let period_f = period as f64;

    // `max` maps NaN to 0.0, so a broken delta must be caught before folding.
    if deltas[..period].iter().any(|d| !d.is_finite()) {
        return Vec::new();
    }

    let (gain_sum, loss_sum) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| (g + d.max(0.0), l + (-d).max(0.0)));
    let mut avg_gain = gain_sum / period_f;
    let mut avg_loss = loss_sum / period_f;

    let mut out = Vec::with_capacity(deltas.len() - period + 1);
    match rsi_from_averages(avg_gain, avg_loss) {
        Some(first) => out.push(first),
        None => return out,
    }

    for &delta in &deltas[period..] {
        if !delta.is_finite() {
            break;
        }
        avg_gain = (avg_gain * (period_f - 1.0) + delta.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-delta).max(0.0)) / period_f;

        match rsi_from_averages(avg_gain, avg_loss) {
            Some(rsi) => out.push(rsi),
            None => break,
        }
    }

    out
}

/// Latest RSI value, only when the whole series is finite.
pub fn last_rsi(closes: &[f64], period: usize) -> Option<f64> {
    let series = calculate_rsi(closes, period);
    if series.len() == closes.len().saturating_sub(period) {
        series.last().copied()
    } else {
        None
    }
}

/// No movement reads 50; gains with no losses read 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_gain == 0.0 && avg_loss == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };
    rsi.is_finite().then_some(rsi)
}
