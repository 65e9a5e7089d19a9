// =============================================================================
// Momentum kernels — Rate of Change and On-Balance Volume
// =============================================================================
//
// ROC = (close - close_n) / close_n * 100
//
// OBV is cumulative signed volume, starting at zero on the first bar:
//   OBV_t = OBV_{t-1} + volume_t   if close_t > close_{t-1}
//         = OBV_{t-1} - volume_t   if close_t < close_{t-1}
//         = OBV_{t-1}              otherwise
// =============================================================================

/// ROC series, one value per close from index `period`. A zero reference
/// close yields 0.0 for that point.
pub fn calculate_roc(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    closes
        .iter()
        .skip(period)
        .zip(closes)
        .map(|(&current, &reference)| {
            if reference == 0.0 {
                0.0
            } else {
                (current - reference) / reference * 100.0
            }
        })
        .collect()
}

/// Latest finite ROC value.
pub fn last_roc(closes: &[f64], period: usize) -> Option<f64> {
    calculate_roc(closes, period)
        .last()
        .copied()
        .filter(|v| v.is_finite())
}

/// OBV series with one value per bar. Empty when the slices differ in length.
pub fn obv_series(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    if closes.len() != volumes.len() || closes.is_empty() {
        return Vec::new();
    }

    let mut obv = 0.0;
    let mut out = Vec::with_capacity(closes.len());
    out.push(obv);

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            obv += volumes[i];
        } else if change < 0.0 {
            obv -= volumes[i];
        }
        out.push(obv);
    }

    out
}

/// Average OBV change per bar over the last `bars` bars.
pub fn obv_slope(obv: &[f64], bars: usize) -> Option<f64> {
    if bars == 0 || obv.len() <= bars {
        return None;
    }
    let last = *obv.last()?;
    let start = obv[obv.len() - 1 - bars];
    let slope = (last - start) / bars as f64;
    slope.is_finite().then_some(slope)
}

/// Sign of the latest OBV against the mean of `obv`: 1, -1 or 0.
pub fn obv_trend_sign(obv: &[f64]) -> i8 {
    let Some(&last) = obv.last() else {
        return 0;
    };
    let mean = obv.iter().sum::<f64>() / obv.len() as f64;
    if last > mean {
        1
    } else if last < mean {
        -1
    } else {
        0
    }
}
