// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// Seeded with the SMA of the first `period` closes. The trend source compares
// a fast and a slow EMA through `ema_spread`.
// =============================================================================

/// EMA series for `closes`, one value per close from index `period - 1`.
///
/// Empty when `period` is zero, the input is shorter than `period`, or the
/// seed is non-finite. A non-finite value later on truncates the series.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let seed = closes[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(closes.len() - period + 1);
    out.push(seed);

    let mut prev = seed;
    for &close in &closes[period..] {
        let ema = close * multiplier + prev * (1.0 - multiplier);
        if !ema.is_finite() {
            break;
        }
        out.push(ema);
        prev = ema;
    }

    out
}

/// Latest EMA value, if the full series could be computed.
pub fn last_ema(closes: &[f64], period: usize) -> Option<f64> {
    let series = calculate_ema(closes, period);
    if series.len() == closes.len().saturating_sub(period) + 1 {
        series.last().copied()
    } else {
        None
    }
}

/// Relative distance of the fast EMA from the slow EMA at the last close:
/// `(fast - slow) / slow`. Positive when the fast average is on top.
///
/// `None` when either EMA cannot be computed or the slow EMA is not positive.
pub fn ema_spread(closes: &[f64], fast: usize, slow: usize) -> Option<f64> {
    let fast = last_ema(closes, fast)?;
    let slow = last_ema(closes, slow)?;
    if slow <= 0.0 {
        return None;
    }
    let spread = (fast - slow) / slow;
    spread.is_finite().then_some(spread)
}
