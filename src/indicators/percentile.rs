// ---------------------------------------------------------------------------
// Percentile rank and band lookup
// ---------------------------------------------------------------------------
//
// Volatility and volume regimes are both "where does the current reading sit
// within its own recent history", cut into bands by configurable edges.

/// Share of `history` strictly below `value`, scaled to [0, 100].
///
/// `None` for an empty history or a non-finite value.
pub fn percentile_rank(history: &[f64], value: f64) -> Option<f64> {
    if history.is_empty() || !value.is_finite() {
        return None;
    }
    let below = history.iter().filter(|&&h| h < value).count();
    Some(below as f64 / history.len() as f64 * 100.0)
}

/// Index of the band `value` falls into, given strictly increasing `edges`.
///
/// Band `i` is `[edges[i-1], edges[i])`; the lowest band is open below and the
/// highest closed above, so every value lands in exactly one of
/// `edges.len() + 1` bands.
pub fn band_index(value: f64, edges: &[f64]) -> usize {
    edges.iter().take_while(|&&edge| value >= edge).count()
}
