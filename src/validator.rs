// =============================================================================
// Bar Validator — sanity checks and repair of raw bar series
// =============================================================================
//
// `validate` runs every check in a fixed order and collects problems instead
// of stopping at the first one (only an empty or volume-less series
// short-circuits). Each problem carries a severity; warnings are listed but
// do not make the report invalid.
//
//   1. required fields        5. non-positive prices / negative volume
//   2. missing values         6. zero-volume share          (warning)
//   3. OHLC envelope          7. duplicate timestamps
//   4. single-bar price spike 8. timestamp ordering
//                             9. time gaps                  (warning)
//
// `clean` repairs what can be repaired and re-validates. It never hands back
// a series that still fails validation, and `clean(clean(s)) == clean(s)`.
//
// Pure: no logging, no I/O.
// =============================================================================

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::market_data::{Bar, BarSeries};
use crate::runtime_config::ValidationParams;

// =============================================================================
// Report types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    MissingField,
    MissingValues,
    OhlcViolation,
    PriceSpike,
    NonPositive,
    ZeroVolume,
    DuplicateTimestamp,
    Unordered,
    TimeGap,
}

impl ProblemKind {
    /// Points deducted from the quality score per problem of this kind.
    fn penalty(self) -> f64 {
        match self {
            Self::MissingField | Self::MissingValues => 10.0,
            Self::OhlcViolation => 15.0,
            Self::PriceSpike => 5.0,
            Self::NonPositive => 10.0,
            Self::DuplicateTimestamp | Self::Unordered => 10.0,
            Self::ZeroVolume | Self::TimeGap => 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub kind: ProblemKind,
    pub severity: Severity,
    pub message: String,
}

/// Ordered outcome of [`BarValidator::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    problems: Vec<Problem>,
}

impl ValidationReport {
    /// True when no problem has `Severity::Error`.
    pub fn is_valid(&self) -> bool {
        self.problems.iter().all(|p| p.severity != Severity::Error)
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Every problem message, warnings included, in check order.
    pub fn messages(&self) -> Vec<String> {
        self.problems.iter().map(|p| p.message.clone()).collect()
    }

    /// Messages of the problems that make the report invalid.
    pub fn errors(&self) -> Vec<String> {
        self.problems
            .iter()
            .filter(|p| p.severity == Severity::Error)
            .map(|p| p.message.clone())
            .collect()
    }

    pub fn has(&self, kind: ProblemKind) -> bool {
        self.problems.iter().any(|p| p.kind == kind)
    }

    fn error(&mut self, kind: ProblemKind, message: String) {
        self.problems.push(Problem {
            kind,
            severity: Severity::Error,
            message,
        });
    }

    fn warning(&mut self, kind: ProblemKind, message: String) {
        self.problems.push(Problem {
            kind,
            severity: Severity::Warning,
            message,
        });
    }
}

/// A stretch between two consecutive bars longer than the gap tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGap {
    /// Last bar before the gap.
    pub start: DateTime<Utc>,
    /// First bar after the gap.
    pub end: DateTime<Utc>,
    /// Whole intervals that fit between the two bars.
    pub bars_missing: i64,
}

/// Data quality in [0, 100]: 100 minus a fixed penalty per problem.
pub fn quality_score(report: &ValidationReport) -> f64 {
    let deducted: f64 = report.problems.iter().map(|p| p.kind.penalty()).sum();
    (100.0 - deducted).max(0.0)
}

// =============================================================================
// BarValidator
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct BarValidator<'a> {
    params: &'a ValidationParams,
}

impl<'a> BarValidator<'a> {
    pub fn new(params: &'a ValidationParams) -> Self {
        Self { params }
    }

    pub fn validate(&self, series: &BarSeries) -> ValidationReport {
        let mut report = ValidationReport::default();
        let bars = series.bars();

        // 1. Required fields
        if bars.is_empty() {
            report.error(ProblemKind::MissingField, "series is empty".to_string());
            return report;
        }
        if !series.has_volume() {
            report.error(
                ProblemKind::MissingField,
                "volume field missing from every bar".to_string(),
            );
            return report;
        }

        let n = bars.len();
        let pct = |count: usize| count as f64 / n as f64 * 100.0;

        // 2. Missing values
        for (field, count) in [
            ("open", bars.iter().filter(|b| !b.open.is_finite()).count()),
            ("high", bars.iter().filter(|b| !b.high.is_finite()).count()),
            ("low", bars.iter().filter(|b| !b.low.is_finite()).count()),
            ("close", bars.iter().filter(|b| !b.close.is_finite()).count()),
            (
                "volume",
                bars.iter()
                    .filter(|b| !b.volume.map_or(false, f64::is_finite))
                    .count(),
            ),
        ] {
            if count > 0 {
                report.error(
                    ProblemKind::MissingValues,
                    format!("missing {field}: {count} bars ({:.1}%)", pct(count)),
                );
            }
        }

        // 3. OHLC envelope, over bars whose prices are all present
        let priced: Vec<&Bar> = bars.iter().filter(|b| prices_finite(b)).collect();
        for (label, count) in [
            ("high < low", priced.iter().filter(|b| b.high < b.low).count()),
            ("high < close", priced.iter().filter(|b| b.high < b.close).count()),
            ("high < open", priced.iter().filter(|b| b.high < b.open).count()),
            ("low > close", priced.iter().filter(|b| b.low > b.close).count()),
            ("low > open", priced.iter().filter(|b| b.low > b.open).count()),
        ] {
            if count > 0 {
                report.error(
                    ProblemKind::OhlcViolation,
                    format!("OHLC violation {label}: {count} bars"),
                );
            }
        }

        // 4. Single-bar moves
        let spikes: Vec<usize> = (1..n)
            .filter(|&i| {
                move_ratio(bars[i - 1].close, bars[i].close)
                    .map_or(false, |m| m.abs() > self.params.max_bar_move)
            })
            .collect();
        if let Some(first) = spikes.first() {
            report.error(
                ProblemKind::PriceSpike,
                format!(
                    "price spike: {} bars moved more than {:.1}% (first at index {first})",
                    spikes.len(),
                    self.params.max_bar_move * 100.0
                ),
            );
        }

        // 5. Non-positive prices, negative volume
        for (field, count) in [
            ("open", count_non_positive(bars, |b| b.open)),
            ("high", count_non_positive(bars, |b| b.high)),
            ("low", count_non_positive(bars, |b| b.low)),
            ("close", count_non_positive(bars, |b| b.close)),
        ] {
            if count > 0 {
                report.error(
                    ProblemKind::NonPositive,
                    format!("non-positive {field}: {count} bars"),
                );
            }
        }
        let negative_volume = bars
            .iter()
            .filter(|b| b.volume.map_or(false, |v| v < 0.0))
            .count();
        if negative_volume > 0 {
            report.error(
                ProblemKind::NonPositive,
                format!("negative volume: {negative_volume} bars"),
            );
        }

        // 6. Zero-volume share
        let zero_volume = bars.iter().filter(|b| b.volume == Some(0.0)).count();
        if zero_volume as f64 / n as f64 > self.params.max_zero_volume_fraction {
            report.warning(
                ProblemKind::ZeroVolume,
                format!(
                    "zero volume on {zero_volume} bars ({:.1}%)",
                    pct(zero_volume)
                ),
            );
        }

        // 7. Duplicate timestamps
        let mut seen = HashSet::with_capacity(n);
        let duplicates = bars.iter().filter(|b| !seen.insert(b.timestamp)).count();
        if duplicates > 0 {
            report.error(
                ProblemKind::DuplicateTimestamp,
                format!("duplicate timestamps: {duplicates}"),
            );
        }

        // 8. Ordering
        let unordered = bars
            .windows(2)
            .filter(|w| w[1].timestamp < w[0].timestamp)
            .count();
        if unordered > 0 {
            report.error(
                ProblemKind::Unordered,
                format!("timestamps out of order at {unordered} positions"),
            );
        }

        // 9. Time gaps
        let gaps = self.detect_gaps(series);
        if let Some(first) = gaps.first() {
            let largest = gaps.iter().map(|g| g.bars_missing).max().unwrap_or(0);
            report.warning(
                ProblemKind::TimeGap,
                format!(
                    "time gaps: {} (largest {largest} bars missing, first after {})",
                    gaps.len(),
                    first.start
                ),
            );
        }

        report
    }

    /// Consecutive bars further apart than `max_gap_intervals` timeframe
    /// intervals. Out-of-order pairs are left to the ordering check.
    pub fn detect_gaps(&self, series: &BarSeries) -> Vec<TimeGap> {
        let interval = i64::from(series.timeframe().minutes());
        let tolerance = interval as f64 * self.params.max_gap_intervals;
        series
            .bars()
            .windows(2)
            .filter_map(|w| {
                let minutes = (w[1].timestamp - w[0].timestamp).num_minutes();
                (minutes as f64 > tolerance).then(|| TimeGap {
                    start: w[0].timestamp,
                    end: w[1].timestamp,
                    bars_missing: minutes / interval - 1,
                })
            })
            .collect()
    }

    /// Repair `series` and return the cleaned copy, or `InvalidData` with the
    /// problems that remain after repair.
    pub fn clean(&self, series: &BarSeries) -> Result<BarSeries> {
        let mut seen = HashSet::with_capacity(series.len());
        let mut bars: Vec<Bar> = series
            .bars()
            .iter()
            .filter(|b| seen.insert(b.timestamp))
            .cloned()
            .collect();

        bars.sort_by_key(|b| b.timestamp);

        self.forward_fill(&mut bars);

        bars.retain(|b| {
            b.is_complete()
                && b.open > 0.0
                && b.high > 0.0
                && b.low > 0.0
                && b.close > 0.0
                && b.volume.map_or(false, |v| v >= 0.0)
        });

        for bar in &mut bars {
            let high = bar.open.max(bar.high).max(bar.close);
            let low = bar.open.min(bar.low).min(bar.close);
            bar.high = high;
            bar.low = low;
        }

        self.drop_bad_ticks(&mut bars);

        let cleaned = series.with_bars(bars);
        let report = self.validate(&cleaned);
        if report.is_valid() {
            Ok(cleaned)
        } else {
            Err(EngineError::invalid(report.errors()))
        }
    }

    /// Carry the last present value forward, at most `max_fill_gap` bars per
    /// run, independently for each field.
    fn forward_fill(&self, bars: &mut [Bar]) {
        let limit = self.params.max_fill_gap;
        fill_field(bars, limit, |b| &mut b.open);
        fill_field(bars, limit, |b| &mut b.high);
        fill_field(bars, limit, |b| &mut b.low);
        fill_field(bars, limit, |b| &mut b.close);

        let mut last = None;
        let mut run = 0;
        for bar in bars.iter_mut() {
            match bar.volume.filter(|v| v.is_finite()) {
                Some(v) => {
                    last = Some(v);
                    run = 0;
                }
                None => {
                    run += 1;
                    bar.volume = if run <= limit { last } else { None };
                }
            }
        }
    }

    /// Remove isolated bad ticks until none are left: a bar whose move in and
    /// move out both exceed `max_bar_move` in opposite directions.
    fn drop_bad_ticks(&self, bars: &mut Vec<Bar>) {
        let limit = self.params.max_bar_move;
        loop {
            let bad: HashSet<usize> = (1..bars.len().saturating_sub(1))
                .filter(|&i| {
                    match (
                        move_ratio(bars[i - 1].close, bars[i].close),
                        move_ratio(bars[i].close, bars[i + 1].close),
                    ) {
                        (Some(move_in), Some(move_out)) => {
                            move_in.abs() > limit
                                && move_out.abs() > limit
                                && move_in.signum() != move_out.signum()
                        }
                        _ => false,
                    }
                })
                .collect();
            if bad.is_empty() {
                return;
            }
            let mut index = 0;
            bars.retain(|_| {
                let keep = !bad.contains(&index);
                index += 1;
                keep
            });
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn prices_finite(bar: &Bar) -> bool {
    bar.open.is_finite() && bar.high.is_finite() && bar.low.is_finite() && bar.close.is_finite()
}

/// `to / from - 1`, when both closes are usable.
fn move_ratio(from: f64, to: f64) -> Option<f64> {
    (from.is_finite() && to.is_finite() && from > 0.0).then(|| to / from - 1.0)
}

fn count_non_positive(bars: &[Bar], field: impl Fn(&Bar) -> f64) -> usize {
    bars.iter()
        .map(field)
        .filter(|v| v.is_finite() && *v <= 0.0)
        .count()
}

fn fill_field(bars: &mut [Bar], limit: usize, field: impl Fn(&mut Bar) -> &mut f64) {
    let mut last: Option<f64> = None;
    let mut run = 0;
    for bar in bars.iter_mut() {
        let value = field(bar);
        if value.is_finite() {
            last = Some(*value);
            run = 0;
        } else {
            run += 1;
            match last {
                Some(prev) if run <= limit => *value = prev,
                _ => {}
            }
        }
    }
}
