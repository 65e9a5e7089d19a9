// =============================================================================
// Signal sources
// =============================================================================
//
// `SignalSource` is the seam through which the indicator library, pattern
// detectors and ML ensemble feed the engine. The reference sources below use
// the in-crate indicator kernels so the engine works end to end on its own.
//
// Each reference source emits exactly one signal named after itself and
// returns an error when the series is too short, so the registry can record
// why it contributed nothing.
// =============================================================================

use anyhow::{bail, Context, Result};

use crate::indicators::ema::ema_spread;
use crate::indicators::momentum::{last_roc, obv_series, obv_slope};
use crate::indicators::rsi::{last_rsi, RsiZone};
use crate::market_data::BarSeries;
use crate::runtime_config::SourceParams;
use crate::types::Direction;

use super::registry::{Signal, MAX_STRENGTH};

/// Producer of signals for one bar series.
pub trait SignalSource: Send + Sync {
    /// Stable identifier used in drop reasons and logs.
    fn name(&self) -> &str;

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>>;
}

/// Names of the reference sources, in the order [`builtin_sources`] builds them.
pub const BUILTIN_SOURCE_NAMES: [&str; 4] = ["ema_trend", "rsi_momentum", "roc_momentum", "volume_flow"];

/// The four reference sources configured from `params`, in a fixed order.
pub fn builtin_sources(params: &SourceParams) -> Vec<Box<dyn SignalSource>> {
    vec![
        Box::new(EmaTrendSource {
            fast: params.ema_fast,
            slow: params.ema_slow,
            weight: params.trend_weight,
        }),
        Box::new(RsiMomentumSource {
            period: params.rsi_period,
            overbought: params.rsi_overbought,
            oversold: params.rsi_oversold,
            weight: params.rsi_weight,
        }),
        Box::new(RocMomentumSource {
            period: params.roc_period,
            weight: params.roc_weight,
        }),
        Box::new(VolumeFlowSource {
            slope_bars: params.obv_slope_bars,
            weight: params.volume_weight,
        }),
    ]
}

fn direction_of(value: f64) -> Direction {
    if value > 0.0 {
        Direction::Bullish
    } else if value < 0.0 {
        Direction::Bearish
    } else {
        Direction::Neutral
    }
}

fn clamp_strength(value: f64) -> f64 {
    value.abs().min(MAX_STRENGTH)
}

// =============================================================================
// EMA trend
// =============================================================================

/// Fast EMA above the slow EMA is bullish. A 1% separation is full strength.
#[derive(Debug, Clone)]
pub struct EmaTrendSource {
    pub fast: usize,
    pub slow: usize,
    pub weight: f64,
}

impl SignalSource for EmaTrendSource {
    fn name(&self) -> &str {
        "ema_trend"
    }

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>> {
        let spread = ema_spread(&series.closes(), self.fast, self.slow).with_context(|| {
            format!(
                "EMA {}/{} needs {} finite closes, have {}",
                self.fast,
                self.slow,
                self.slow,
                series.len()
            )
        })?;

        Ok(vec![Signal::new(
            self.name(),
            direction_of(spread),
            clamp_strength(spread * 1_000.0),
            self.weight,
        )])
    }
}

// =============================================================================
// RSI momentum
// =============================================================================

/// Overbought reads bearish, oversold bullish; in between the bias follows
/// the side of 50. Strength grows with the distance from 50.
#[derive(Debug, Clone)]
pub struct RsiMomentumSource {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub weight: f64,
}

impl SignalSource for RsiMomentumSource {
    fn name(&self) -> &str {
        "rsi_momentum"
    }

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>> {
        let rsi = last_rsi(&series.closes(), self.period).with_context(|| {
            format!(
                "RSI({}) needs {} finite closes, have {}",
                self.period,
                self.period + 1,
                series.len()
            )
        })?;

        let direction = match RsiZone::of(rsi, self.overbought, self.oversold) {
            RsiZone::Overbought => Direction::Bearish,
            RsiZone::Oversold => Direction::Bullish,
            RsiZone::Neutral => direction_of(rsi - 50.0),
        };

        Ok(vec![Signal::new(
            self.name(),
            direction,
            clamp_strength((rsi - 50.0) / 5.0),
            self.weight,
        )])
    }
}

// =============================================================================
// ROC momentum
// =============================================================================

/// Sign of the rate of change gives the direction; 5% is full strength.
#[derive(Debug, Clone)]
pub struct RocMomentumSource {
    pub period: usize,
    pub weight: f64,
}

impl SignalSource for RocMomentumSource {
    fn name(&self) -> &str {
        "roc_momentum"
    }

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>> {
        let roc = last_roc(&series.closes(), self.period).with_context(|| {
            format!(
                "ROC({}) needs more than {} finite closes, have {}",
                self.period,
                self.period,
                series.len()
            )
        })?;

        Ok(vec![Signal::new(
            self.name(),
            direction_of(roc),
            clamp_strength(roc * 2.0),
            self.weight,
        )])
    }
}

// =============================================================================
// Volume flow
// =============================================================================

/// OBV slope over the last `slope_bars` bars, scaled by the mean volume of
/// the same bars. Errors when the series carries no volume.
#[derive(Debug, Clone)]
pub struct VolumeFlowSource {
    pub slope_bars: usize,
    pub weight: f64,
}

impl SignalSource for VolumeFlowSource {
    fn name(&self) -> &str {
        "volume_flow"
    }

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>> {
        if series.len() <= self.slope_bars {
            bail!(
                "OBV slope over {} bars needs {} bars, have {}",
                self.slope_bars,
                self.slope_bars + 1,
                series.len()
            );
        }

        let tail = series.tail(self.slope_bars + 1);
        let volumes: Vec<f64> = tail
            .iter()
            .map(|b| b.volume)
            .collect::<Option<_>>()
            .context("series has no volume for the OBV window")?;
        let closes: Vec<f64> = tail.iter().map(|b| b.close).collect();

        let obv = obv_series(&closes, &volumes);
        let slope = obv_slope(&obv, self.slope_bars).context("OBV slope is not finite")?;

        let mean_volume = volumes.iter().sum::<f64>() / volumes.len() as f64;
        let ratio = if mean_volume > 0.0 {
            slope / mean_volume
        } else {
            0.0
        };

        Ok(vec![Signal::new(
            self.name(),
            direction_of(ratio),
            clamp_strength(ratio * MAX_STRENGTH),
            self.weight,
        )])
    }
}
