// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// The volatility classifier ranks the current ATR against its own history, so
// this module produces the whole ATR series rather than a single value.
//
//   TR_t   = max(H - L, |H - prevClose|, |L - prevClose|)
//   ATR_0  = SMA of the first `period` TR values
//   ATR_t  = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// ATR% = ATR / close * 100 makes readings comparable across price levels.
// =============================================================================

use crate::market_data::Bar;

/// True range of every bar transition (`bars.len() - 1` values).
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .map(|pair| pair[1].true_range(pair[0].close))
        .collect()
}

/// ATR series aligned to `bars[period..]`.
///
/// Returns an empty `Vec` when `period` is zero, there are fewer than
/// `period + 1` bars, or any price is non-finite.
pub fn atr_series(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }
    if bars
        .iter()
        .any(|b| !(b.high.is_finite() && b.low.is_finite() && b.close.is_finite()))
    {
        return Vec::new();
    }

    let tr = true_ranges(bars);
    let period_f = period as f64;

    let mut atr = tr[..period].iter().sum::<f64>() / period_f;
    let mut out = Vec::with_capacity(tr.len() - period + 1);
    out.push(atr);

    for &value in &tr[period..] {
        atr = (atr * (period_f - 1.0) + value) / period_f;
        out.push(atr);
    }

    out
}

/// ATR as a percentage of the close of the bar it belongs to.
///
/// Bars with a non-positive close are skipped; the validator rejects such
/// series long before they reach the classifier.
pub fn atr_pct_series(bars: &[Bar], period: usize) -> Vec<f64> {
    let atr = atr_series(bars, period);
    // atr[k] belongs to bars[period + k].
    atr.iter()
        .zip(&bars[bars.len() - atr.len()..])
        .filter(|(_, bar)| bar.close > 0.0)
        .map(|(a, bar)| a / bar.close * 100.0)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::bar::fixtures::{bar, trending};

    #[test]
    fn short_input_is_empty() {
        let series = trending(10, 1.0);
        assert!(atr_series(series.bars(), 0).is_empty());
        assert!(atr_series(series.bars(), 14).is_empty());
        assert!(atr_pct_series(series.bars(), 14).is_empty());
    }

    #[test]
    fn series_length_matches_bars() {
        let series = trending(40, 1.0);
        assert_eq!(atr_series(series.bars(), 14).len(), 40 - 14);
        assert_eq!(atr_pct_series(series.bars(), 14).len(), 40 - 14);
    }

    #[test]
    fn constant_range_converges() {
        // Range 10 around a flat close: every TR is 10.
        let bars: Vec<_> = (0..30).map(|i| bar(i, 100.0, 100.0, 5.0, 1.0)).collect();
        let atr = atr_series(&bars, 14);
        for v in atr {
            assert!((v - 10.0).abs() < 1e-9, "expected 10, got {v}");
        }
    }

    #[test]
    fn gap_is_captured_by_true_range() {
        let bars = vec![
            bar(0, 100.0, 95.0, 0.0, 1.0),
            bar(1, 110.0, 112.0, 2.0, 1.0),
        ];
        // high 114, prev close 95 => TR 19
        assert!((true_ranges(&bars)[0] - 19.0).abs() < 1e-10);
    }

    #[test]
    fn widening_bars_raise_atr_pct() {
        let bars: Vec<_> = (0..40)
            .map(|i| bar(i, 100.0, 100.0, 0.5 + i as f64 * 0.1, 1.0))
            .collect();
        let pct = atr_pct_series(&bars, 5);
        assert!(pct.last().unwrap() > pct.first().unwrap());
    }

    #[test]
    fn nan_input_is_empty() {
        let mut bars = trending(30, 1.0).bars().to_vec();
        bars[10].close = f64::NAN;
        assert!(atr_series(&bars, 5).is_empty());
    }
}
