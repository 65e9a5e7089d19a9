use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Timeframe;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
///
/// A missing price is carried as a non-finite value (see [`RawBar`]); the
/// validator reports it and `clean` forward-fills or drops it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `None` when the feed does not carry volume for this bar.
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: Some(volume),
        }
    }

    /// True range against the previous close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        (self.high - self.low)
            .max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }

    /// True when every price and the volume hold a finite value.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
            && self.volume.map_or(false, f64::is_finite)
    }
}

/// Bar row as delivered by a feed, where any field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl RawBar {
    /// Convert to a [`Bar`], mapping absent prices to NaN. Returns `None`
    /// when the timestamp itself is missing, since such a row cannot be
    /// placed in the series at all.
    pub fn into_bar(self) -> Option<Bar> {
        Some(Bar {
            timestamp: self.timestamp?,
            open: self.open.unwrap_or(f64::NAN),
            high: self.high.unwrap_or(f64::NAN),
            low: self.low.unwrap_or(f64::NAN),
            close: self.close.unwrap_or(f64::NAN),
            volume: self.volume,
        })
    }
}

// ---------------------------------------------------------------------------
// BarSeries -- one symbol + timeframe window
// ---------------------------------------------------------------------------

/// Ordered bars for a single symbol and timeframe.
///
/// Never mutated in place: cleaning and windowing build new series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    /// Build a series from raw feed rows, skipping rows without a timestamp.
    pub fn from_raw(symbol: impl Into<String>, timeframe: Timeframe, rows: Vec<RawBar>) -> Self {
        let bars = rows.into_iter().filter_map(RawBar::into_bar).collect();
        Self::new(symbol, timeframe, bars)
    }

    /// New series with the same labels and different bars.
    pub fn with_bars(&self, bars: Vec<Bar>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The most recent `count` bars (oldest first).
    pub fn tail(&self, count: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(count);
        &self.bars[start..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Volumes of every bar, or `None` when any bar lacks volume.
    pub fn volumes(&self) -> Option<Vec<f64>> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// True when at least one bar carries volume.
    pub fn has_volume(&self) -> bool {
        self.bars.iter().any(|b| b.volume.is_some())
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    pub fn ts(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64)
    }

    /// Bar whose high/low wrap open and close by `spread`.
    pub fn bar(i: usize, open: f64, close: f64, spread: f64, volume: f64) -> Bar {
        Bar::new(
            ts(i),
            open,
            open.max(close) + spread,
            open.min(close) - spread,
            close,
            volume,
        )
    }

    /// Seeded random walk with moves well under 10% and non-zero volume.
    pub fn random_walk(n: usize, seed: u64) -> BarSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut price = 100.0;
        let bars = (0..n)
            .map(|i| {
                let open = price;
                let close = open * (1.0 + rng.gen_range(-0.01..0.01));
                let spread = open * rng.gen_range(0.001..0.004);
                let volume = rng.gen_range(1_000.0..10_000.0);
                price = close;
                bar(i, open, close, spread, volume)
            })
            .collect();
        BarSeries::new("EURUSD", Timeframe::H1, bars)
    }

    /// Steady linear trend: `step` per bar, constant spread and volume.
    pub fn trending(n: usize, step: f64) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let open = 100.0 + i as f64 * step;
                let close = open + step * 0.8;
                bar(i, open, close, step.abs() * 0.3 + 0.05, 5_000.0)
            })
            .collect();
        BarSeries::new("EURUSD", Timeframe::H1, bars)
    }

    /// Oscillating series with no net drift.
    pub fn choppy(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let open = 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 };
                let close = 100.0 + if i % 2 == 0 { -0.5 } else { 0.5 };
                bar(i, open, close, 0.3, 5_000.0)
            })
            .collect();
        BarSeries::new("EURUSD", Timeframe::H1, bars)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn tail_returns_most_recent() {
        let series = trending(10, 1.0);
        let tail = series.tail(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[2].timestamp, ts(9));
        assert_eq!(series.tail(50).len(), 10);
    }

    #[test]
    fn volumes_none_when_any_missing() {
        let mut bars = trending(5, 1.0).bars().to_vec();
        assert!(BarSeries::new("X", Timeframe::H1, bars.clone()).volumes().is_some());
        bars[2].volume = None;
        let series = BarSeries::new("X", Timeframe::H1, bars);
        assert!(series.volumes().is_none());
        assert!(series.has_volume());
    }

    #[test]
    fn raw_bar_missing_price_becomes_nan() {
        let raw = RawBar {
            timestamp: Some(ts(0)),
            open: Some(1.0),
            high: None,
            low: Some(0.5),
            close: Some(0.8),
            volume: Some(10.0),
        };
        let bar = raw.into_bar().unwrap();
        assert!(bar.high.is_nan());
        assert!(!bar.is_complete());
    }

    #[test]
    fn raw_bar_without_timestamp_is_skipped() {
        let rows = vec![
            RawBar::default(),
            RawBar {
                timestamp: Some(ts(1)),
                open: Some(1.0),
                high: Some(1.0),
                low: Some(1.0),
                close: Some(1.0),
                volume: Some(1.0),
            },
        ];
        let series = BarSeries::from_raw("X", Timeframe::M15, rows);
        assert_eq!(series.len(), 1);
        assert_eq!(series.timeframe(), Timeframe::M15);
    }

    #[test]
    fn true_range_uses_prev_close() {
        let b = bar(0, 110.0, 112.0, 3.0, 1.0);
        // high = 115, low = 107, prev close 95 => |115 - 95| = 20
        assert!((b.true_range(95.0) - 20.0).abs() < 1e-10);
    }
}
