// =============================================================================
// Regime Classifier
// =============================================================================
//
// Derives three independent regime dimensions from the trailing window of a
// bar series, then the composite favorability from the constant table.
//
// Trend (on the trailing `lookback` bars, evaluated top to bottom):
//
//   1. STRONG_*  — ADX > adx_strong AND |efficiency| >= efficiency_threshold
//                  AND the net change agrees with the dominant DI
//   2. UPTREND   — ADX >= adx_trending AND +DI > -DI   (mirror: DOWNTREND)
//   3. RANGING   — everything else, including +DI == -DI
//
// Volatility: percentile rank of the latest ATR% among the trailing
// `volatility_history` ATR% readings, cut by `volatility_edges`.
//
// Volume: percentile rank of the latest volume within the window, cut by
// `volume_edges`. Every bar of the window must carry volume.
//
// Nothing is cached between calls; each call builds a fresh snapshot.
// =============================================================================

use tracing::trace;

use crate::error::{EngineError, Result};
use crate::indicators::adx::{directional_index, min_bars, DirectionalIndex};
use crate::indicators::atr::atr_pct_series;
use crate::indicators::momentum::{obv_series, obv_trend_sign};
use crate::indicators::percentile::{band_index, percentile_rank};
use crate::market_data::{Bar, BarSeries};
use crate::runtime_config::RegimeParams;

use super::states::{RegimeMetrics, RegimeState, TrendRegime, VolatilityRegime, VolumeRegime};

/// Stateless classifier over one set of thresholds.
#[derive(Debug, Clone, Copy)]
pub struct RegimeClassifier<'a> {
    params: &'a RegimeParams,
}

impl<'a> RegimeClassifier<'a> {
    pub fn new(params: &'a RegimeParams) -> Self {
        Self { params }
    }

    /// Classify `series` using the configured lookback.
    pub fn classify(&self, series: &BarSeries) -> Result<RegimeState> {
        self.classify_with_lookback(series, self.params.lookback)
    }

    /// Classify `series` over an explicit trailing window of `lookback` bars.
    pub fn classify_with_lookback(&self, series: &BarSeries, lookback: usize) -> Result<RegimeState> {
        let p = self.params;

        if lookback < min_bars(p.adx_period) {
            return Err(EngineError::insufficient(format!(
                "lookback {lookback} too short for ADX period {} (need >= {})",
                p.adx_period,
                min_bars(p.adx_period)
            )));
        }
        if series.len() < lookback {
            return Err(EngineError::insufficient(format!(
                "{} bars < lookback {lookback}",
                series.len()
            )));
        }

        let window = series.tail(lookback);

        // --- Trend ---------------------------------------------------------------
        let di = directional_index(window, p.adx_period)
            .ok_or_else(|| EngineError::analysis("ADX produced no finite value"))?;
        let (net_change, efficiency) = efficiency(window, p.efficiency_epsilon);
        let trend = trend_regime(&di, net_change, efficiency, p);

        // --- Volatility ----------------------------------------------------------
        let atr_pct = atr_pct_series(series.bars(), p.atr_period);
        let current_atr_pct = *atr_pct.last().ok_or_else(|| {
            EngineError::insufficient(format!(
                "{} bars too few for ATR period {}",
                series.len(),
                p.atr_period
            ))
        })?;
        let history = &atr_pct[atr_pct.len().saturating_sub(p.volatility_history)..];
        let volatility_percentile = percentile_rank(history, current_atr_pct)
            .ok_or_else(|| EngineError::analysis("ATR% is not finite"))?;
        let volatility =
            VolatilityRegime::ALL[band_index(volatility_percentile, &p.volatility_edges)];
        let volatility_expanding =
            current_atr_pct > history.iter().sum::<f64>() / history.len() as f64;

        // --- Volume --------------------------------------------------------------
        let volumes: Vec<f64> = window
            .iter()
            .map(|b| b.volume)
            .collect::<Option<_>>()
            .ok_or_else(|| {
                EngineError::insufficient("volume missing inside the classification window")
            })?;
        let current_volume = volumes[volumes.len() - 1];
        let volume_percentile = percentile_rank(&volumes, current_volume)
            .ok_or_else(|| EngineError::analysis("volume is not finite"))?;
        let volume = VolumeRegime::ALL[band_index(volume_percentile, &p.volume_edges)];

        let mean_volume = volumes.iter().sum::<f64>() / volumes.len() as f64;
        let relative_volume = if mean_volume > 0.0 {
            current_volume / mean_volume
        } else {
            0.0
        };
        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
        let obv_trend = obv_trend_sign(&obv_series(&closes, &volumes));

        trace!(
            symbol = series.symbol(),
            timeframe = %series.timeframe(),
            adx = format!("{:.2}", di.adx),
            plus_di = format!("{:.2}", di.plus_di),
            minus_di = format!("{:.2}", di.minus_di),
            efficiency = format!("{:.3}", efficiency),
            atr_pct = format!("{:.4}", current_atr_pct),
            vol_pct = format!("{:.1}", volatility_percentile),
            volume_pct = format!("{:.1}", volume_percentile),
            %trend,
            %volatility,
            %volume,
            "Regime classified"
        );

        Ok(RegimeState::new(
            trend,
            volatility,
            volume,
            RegimeMetrics {
                adx: di.adx,
                plus_di: di.plus_di,
                minus_di: di.minus_di,
                efficiency,
                net_change,
                atr_pct: current_atr_pct,
                volatility_percentile,
                volatility_expanding,
                volume_percentile,
                relative_volume,
                obv_trend,
            },
        ))
    }
}

// =============================================================================
// Decision logic
// =============================================================================

/// Net close change over the window and its efficiency ratio in [-1, 1].
fn efficiency(window: &[Bar], epsilon: f64) -> (f64, f64) {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return (0.0, 0.0);
    };
    let net = last.close - first.close;
    let path: f64 = window
        .windows(2)
        .map(|pair| (pair[1].close - pair[0].close).abs())
        .sum();
    (net, net / path.max(epsilon))
}

/// Trend decision table. ADX exactly at `adx_strong` is not strong; exactly
/// at `adx_trending` is trending.
pub(crate) fn trend_regime(
    di: &DirectionalIndex,
    net_change: f64,
    efficiency: f64,
    p: &RegimeParams,
) -> TrendRegime {
    let strong = di.adx > p.adx_strong && efficiency.abs() >= p.efficiency_threshold;

    if strong && net_change > 0.0 && di.bullish() {
        TrendRegime::StrongUptrend
    } else if strong && net_change < 0.0 && di.bearish() {
        TrendRegime::StrongDowntrend
    } else if di.adx >= p.adx_trending && di.bullish() {
        TrendRegime::Uptrend
    } else if di.adx >= p.adx_trending && di.bearish() {
        TrendRegime::Downtrend
    } else {
        TrendRegime::Ranging
    }
}
