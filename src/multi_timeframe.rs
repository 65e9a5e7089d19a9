// =============================================================================
// Multi-Timeframe Alignment
// =============================================================================
//
// Runs the full single-timeframe analysis on every supplied series in
// parallel, then reconciles the decisions:
//
//   dominant  = direction with the greatest total timeframe weight
//               (ties go to the sentiment of the longest tied timeframe)
//   alignment = weight share of timeframes agreeing with the dominant
//   aligned   = alignment >= alignment_threshold
//
// Results are always reduced in ascending timeframe order so the outcome does
// not depend on thread scheduling or input order. Up to five trading
// suggestions are derived from the reconciled view.
// =============================================================================

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{SentimentEngine, SentimentResult};
use crate::error::{EngineError, Result};
use crate::market_data::BarSeries;
use crate::runtime_config::TimeframeParams;
use crate::types::{Direction, RiskLevel, Timeframe};

const MAX_SUGGESTIONS: usize = 5;

/// Timeframes whose agreement confirms the dominant bias.
const HIGHER_TIMEFRAMES: [Timeframe; 2] = [Timeframe::D1, Timeframe::H4];

/// Timeframes used for entry timing, first present wins.
const ENTRY_TIMEFRAMES: [Timeframe; 2] = [Timeframe::M15, Timeframe::H1];

/// Number of timeframes per sentiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentBreakdown {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl SentimentBreakdown {
    fn count(results: &[SentimentResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.sentiment() {
                Direction::Bullish => acc.bullish += 1,
                Direction::Bearish => acc.bearish += 1,
                Direction::Neutral => acc.neutral += 1,
            }
            acc
        })
    }
}

/// Reconciled view over several timeframes of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiTimeframeResult {
    results: Vec<SentimentResult>,
    dominant_sentiment: Direction,
    alignment: f64,
    aligned: bool,
    weighted_confidence: f64,
    breakdown: SentimentBreakdown,
    suggestions: Vec<String>,
}

impl MultiTimeframeResult {
    /// Per-timeframe results, shortest timeframe first.
    pub fn results(&self) -> &[SentimentResult] {
        &self.results
    }

    pub fn get(&self, timeframe: Timeframe) -> Option<&SentimentResult> {
        self.results.iter().find(|r| r.timeframe() == timeframe)
    }

    pub fn dominant_sentiment(&self) -> Direction {
        self.dominant_sentiment
    }

    /// Weight share agreeing with the dominant sentiment, in [0, 1].
    pub fn alignment(&self) -> f64 {
        self.alignment
    }

    pub fn aligned(&self) -> bool {
        self.aligned
    }

    /// Timeframe-weighted mean of the base confidences.
    pub fn weighted_confidence(&self) -> f64 {
        self.weighted_confidence
    }

    pub fn breakdown(&self) -> SentimentBreakdown {
        self.breakdown
    }

    /// At most five trading suggestions, most important first.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// One-line digest, ending with the leading suggestion when there is one.
    pub fn summary(&self) -> String {
        let frames: Vec<String> = self
            .results
            .iter()
            .map(|r| format!("{}={}", r.timeframe(), r.sentiment()))
            .collect();
        let mut line = format!(
            "{} alignment {:.0}% ({}) [{}]",
            self.dominant_sentiment,
            self.alignment * 100.0,
            if self.aligned { "aligned" } else { "mixed" },
            frames.join(", ")
        );
        if let Some(first) = self.suggestions.first() {
            line.push_str(" | ");
            line.push_str(first);
        }
        line
    }
}

impl SentimentEngine {
    /// Analyse several timeframes of one symbol and reconcile them.
    ///
    /// Fails with `InvalidData` on duplicate timeframes and with the first
    /// failing timeframe's error (in ascending timeframe order) otherwise.
    pub fn analyze_timeframes(&self, frames: &[BarSeries]) -> Result<MultiTimeframeResult> {
        if frames.is_empty() {
            return Err(EngineError::insufficient("no timeframes supplied"));
        }

        let mut seen = HashSet::with_capacity(frames.len());
        let duplicates: Vec<String> = frames
            .iter()
            .map(BarSeries::timeframe)
            .filter(|tf| !seen.insert(*tf))
            .map(|tf| format!("duplicate timeframe {tf}"))
            .collect();
        if !duplicates.is_empty() {
            return Err(EngineError::invalid(duplicates));
        }

        let cfg = self.config().snapshot();

        let mut outcomes: Vec<(Timeframe, Result<SentimentResult>)> = frames
            .par_iter()
            .map(|series| (series.timeframe(), self.run(series, &cfg, None)))
            .collect();
        outcomes.sort_by_key(|(tf, _)| *tf);

        let results = outcomes
            .into_iter()
            .map(|(_, outcome)| outcome)
            .collect::<Result<Vec<_>>>()?;

        let reconciled = reconcile(results, &cfg.timeframes);

        info!(
            timeframes = reconciled.results.len(),
            dominant = %reconciled.dominant_sentiment,
            alignment = format!("{:.3}", reconciled.alignment),
            aligned = reconciled.aligned,
            "Multi-timeframe analysis complete"
        );

        Ok(reconciled)
    }
}

/// Reduce per-timeframe results (ascending timeframe order) into one view.
fn reconcile(results: Vec<SentimentResult>, params: &TimeframeParams) -> MultiTimeframeResult {
    let mut weights: Vec<f64> = results
        .iter()
        .map(|r| params.weight(r.timeframe()))
        .collect();
    // All-zero weights fall back to an equal vote.
    if weights.iter().sum::<f64>() <= 0.0 {
        weights = vec![1.0; results.len()];
    }
    let total: f64 = weights.iter().sum();

    let weight_for = |direction: Direction| -> f64 {
        results
            .iter()
            .zip(&weights)
            .filter(|(r, _)| r.sentiment() == direction)
            .map(|(_, w)| w)
            .sum()
    };

    let directions = [Direction::Bullish, Direction::Bearish, Direction::Neutral];
    let totals = directions.map(weight_for);
    let best = totals.iter().copied().fold(f64::MIN, f64::max);
    let tied: Vec<Direction> = directions
        .iter()
        .zip(&totals)
        .filter(|(_, w)| (best - **w).abs() < 1e-12)
        .map(|(d, _)| *d)
        .collect();

    let dominant_sentiment = if tied.len() == 1 {
        tied[0]
    } else {
        results
            .iter()
            .rev()
            .map(SentimentResult::sentiment)
            .find(|s| tied.contains(s))
            .unwrap_or(Direction::Neutral)
    };

    let alignment = (weight_for(dominant_sentiment) / total).clamp(0.0, 1.0);
    let weighted_confidence = results
        .iter()
        .zip(&weights)
        .map(|(r, w)| r.base_confidence() * w)
        .sum::<f64>()
        / total;

    debug!(
        bullish = totals[0],
        bearish = totals[1],
        neutral = totals[2],
        dominant = %dominant_sentiment,
        "Timeframes reconciled"
    );

    let aligned = alignment >= params.alignment_threshold;
    let suggestions = suggestions(&results, dominant_sentiment, aligned);

    MultiTimeframeResult {
        breakdown: SentimentBreakdown::count(&results),
        results,
        dominant_sentiment,
        alignment,
        aligned,
        weighted_confidence,
        suggestions,
    }
}

fn suggestions(results: &[SentimentResult], dominant: Direction, aligned: bool) -> Vec<String> {
    let mut out = Vec::with_capacity(MAX_SUGGESTIONS);
    let sentiment_of = |tf: Timeframe| {
        results
            .iter()
            .find(|r| r.timeframe() == tf)
            .map(SentimentResult::sentiment)
    };

    match (aligned, dominant) {
        (true, Direction::Neutral) => {
            out.push("Timeframes agree on no clear direction".to_string());
        }
        (true, direction) => {
            out.push(format!(
                "Strong {} confluence across timeframes",
                direction.as_lower()
            ));
            out.push(format!(
                "Consider {} positions with higher timeframe confirmation",
                if direction == Direction::Bullish { "long" } else { "short" }
            ));
        }
        (false, _) => {
            out.push("Mixed signals across timeframes, wait for clearer direction".to_string());
            out.push("Consider reducing position size due to lack of confluence".to_string());
        }
    }

    if dominant != Direction::Neutral {
        let higher: Vec<Direction> = HIGHER_TIMEFRAMES
            .iter()
            .filter_map(|tf| sentiment_of(*tf))
            .collect();
        if !higher.is_empty() && higher.iter().all(|s| *s == dominant) {
            out.push(format!(
                "Higher timeframes confirm {} bias",
                dominant.as_lower()
            ));
        }

        let entry = ENTRY_TIMEFRAMES.iter().find_map(|tf| sentiment_of(*tf));
        if entry == Some(dominant) {
            out.push("Lower timeframe provides good entry timing".to_string());
        }
    }

    if results.iter().any(|r| r.risk_level() == RiskLevel::High) {
        out.push("High risk on some timeframes, use tight stops".to_string());
    }

    out.truncate(MAX_SUGGESTIONS);
    out
}
