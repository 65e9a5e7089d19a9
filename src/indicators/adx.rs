// =============================================================================
// Average Directional Index (ADX) with Directional Indicators
// =============================================================================
//
// The trend classifier needs three numbers from one pass over the window:
// trend strength (ADX) and which side dominates (+DI vs -DI).
//
//   1. +DM / -DM and True Range per bar transition.
//   2. Wilder's running sums over `period` transitions.
//   3. +DI = 100 * sum(+DM) / sum(TR),  -DI = 100 * sum(-DM) / sum(TR)
//   4. DX  = 100 * |+DI - -DI| / (+DI + -DI)
//   5. ADX = Wilder's average of DX, seeded with the SMA of the first
//      `period` DX values.
//
// The DI pair reported is the one at the final bar.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Bar;

/// ADX together with the final +DI / -DI readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalIndex {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

impl DirectionalIndex {
    /// +DI strictly above -DI.
    pub fn bullish(&self) -> bool {
        self.plus_di > self.minus_di
    }

    /// -DI strictly above +DI.
    pub fn bearish(&self) -> bool {
        self.minus_di > self.plus_di
    }
}

/// Minimum bars needed for one ADX value with the given `period`.
pub fn min_bars(period: usize) -> usize {
    2 * period + 1
}

/// Compute ADX, +DI and -DI at the last bar of `bars`.
///
/// Returns `None` when `period` is zero, there are fewer than
/// [`min_bars`] bars, or any intermediate value is non-finite.
pub fn directional_index(bars: &[Bar], period: usize) -> Option<DirectionalIndex> {
    if period == 0 || bars.len() < min_bars(period) {
        return None;
    }
    // f64::max swallows NaN, so a broken bar must be rejected up front.
    if bars
        .iter()
        .any(|b| !(b.high.is_finite() && b.low.is_finite() && b.close.is_finite()))
    {
        return None;
    }

    let period_f = period as f64;
    let transitions = bars.len() - 1;

    let mut plus_dm = Vec::with_capacity(transitions);
    let mut minus_dm = Vec::with_capacity(transitions);
    let mut tr = Vec::with_capacity(transitions);

    for pair in bars.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        tr.push(cur.true_range(prev.close));
    }

    let mut sum_plus: f64 = plus_dm[..period].iter().sum();
    let mut sum_minus: f64 = minus_dm[..period].iter().sum();
    let mut sum_tr: f64 = tr[..period].iter().sum();

    let mut di = di_pair(sum_plus, sum_minus, sum_tr)?;
    let mut dx_values = Vec::with_capacity(transitions - period + 1);
    dx_values.push(dx(di));

    for i in period..transitions {
        sum_plus = sum_plus - sum_plus / period_f + plus_dm[i];
        sum_minus = sum_minus - sum_minus / period_f + minus_dm[i];
        sum_tr = sum_tr - sum_tr / period_f + tr[i];

        di = di_pair(sum_plus, sum_minus, sum_tr)?;
        dx_values.push(dx(di));
    }

    if dx_values.len() < period {
        return None;
    }

    let mut adx = dx_values[..period].iter().sum::<f64>() / period_f;
    for &value in &dx_values[period..] {
        adx = (adx * (period_f - 1.0) + value) / period_f;
    }

    if !adx.is_finite() {
        return None;
    }

    Some(DirectionalIndex {
        adx,
        plus_di: di.0,
        minus_di: di.1,
    })
}

// =============================================================================
// Internal helpers
// =============================================================================

/// (+DI, -DI) from the running sums. A flat window (zero true range) has no
/// directional movement and yields (0, 0).
fn di_pair(sum_plus: f64, sum_minus: f64, sum_tr: f64) -> Option<(f64, f64)> {
    if sum_tr == 0.0 {
        return Some((0.0, 0.0));
    }
    let plus = sum_plus / sum_tr * 100.0;
    let minus = sum_minus / sum_tr * 100.0;
    if plus.is_finite() && minus.is_finite() {
        Some((plus, minus))
    } else {
        None
    }
}

fn dx((plus, minus): (f64, f64)) -> f64 {
    let total = plus + minus;
    if total == 0.0 {
        0.0
    } else {
        (plus - minus).abs() / total * 100.0
    }
}
