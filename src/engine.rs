// =============================================================================
// Sentiment Fusion Engine
// =============================================================================
//
// One analysis call runs these stages in order and keeps no state between
// calls:
//
//   VALIDATE  -> clean when invalid; enforce min_bars
//   COLLECT   -> ask every SignalSource; drop failures with a reason
//   CLASSIFY  -> trend / volatility / volume regime and favorability
//   SCORE     -> base confidence, sentiment and risk from the signals alone
//   ADJUST    -> regime_adjustment from the favorability multiplier table
//   FILTER    -> trade permission from the allowed favorabilities
//   EMIT      -> immutable SentimentResult with insights
//
// The regime adjustment and the trade permission are separate outputs and
// never touch base_confidence. The configuration is snapshotted once at entry.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::market_data::BarSeries;
use crate::regime::{Favorability, RegimeClassifier, RegimeState, TrendRegime};
use crate::runtime_config::{ConfigHandle, EngineConfig};
use crate::signals::{
    builtin_sources, confidence_label, BUILTIN_SOURCE_NAMES, ConfidenceScorer, DroppedSource, ScoreOutcome, Signal,
    SignalContribution, SignalRegistry, SignalSource,
};
use crate::types::{Direction, RiskLevel, Timeframe};
use crate::validator::BarValidator;

/// Upper bound on the number of insights attached to a result.
const MAX_INSIGHTS: usize = 5;

/// Source label used for signals handed to [`SentimentEngine::analyze_with_signals`].
const CALLER_SOURCE: &str = "caller";

// =============================================================================
// SentimentResult
// =============================================================================

/// Final decision for one symbol and timeframe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    symbol: String,
    timeframe: Timeframe,
    sentiment: Direction,
    base_confidence: f64,
    direction_score: f64,
    regime: RegimeState,
    regime_adjustment: f64,
    trade_allowed: bool,
    regime_warning: Option<String>,
    risk_level: RiskLevel,
    contributing_signals: Vec<SignalContribution>,
    dropped_sources: Vec<DroppedSource>,
    insights: Vec<String>,
    price: f64,
    as_of: DateTime<Utc>,
}

impl SentimentResult {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn sentiment(&self) -> Direction {
        self.sentiment
    }

    /// Confidence from the signals alone, in [0, 1].
    pub fn base_confidence(&self) -> f64 {
        self.base_confidence
    }

    /// Weighted direction score in [-1, 1].
    pub fn direction_score(&self) -> f64 {
        self.direction_score
    }

    pub fn regime(&self) -> &RegimeState {
        &self.regime
    }

    /// Position-size multiplier derived from favorability.
    pub fn regime_adjustment(&self) -> f64 {
        self.regime_adjustment
    }

    /// `min(base_confidence * regime_adjustment, 1)`, computed on demand.
    pub fn effective_confidence(&self) -> f64 {
        (self.base_confidence * self.regime_adjustment).min(1.0)
    }

    pub fn trade_allowed(&self) -> bool {
        self.trade_allowed
    }

    pub fn regime_warning(&self) -> Option<&str> {
        self.regime_warning.as_deref()
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn contributing_signals(&self) -> &[SignalContribution] {
        &self.contributing_signals
    }

    pub fn dropped_sources(&self) -> &[DroppedSource] {
        &self.dropped_sources
    }

    pub fn insights(&self) -> &[String] {
        &self.insights
    }

    /// Close of the last analysed bar.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Timestamp of the last analysed bar.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn confidence_label(&self) -> &'static str {
        confidence_label(self.base_confidence)
    }

    /// One-line human-readable digest.
    pub fn summary(&self) -> String {
        format!(
            "{} {}: {} {:.1}% ({}) | regime {} x{:.2} | risk {} | trade {}",
            self.symbol,
            self.timeframe,
            self.sentiment,
            self.base_confidence * 100.0,
            self.confidence_label(),
            self.regime.favorability(),
            self.regime_adjustment,
            self.risk_level,
            if self.trade_allowed { "allowed" } else { "blocked" },
        )
    }
}

// =============================================================================
// SentimentEngine
// =============================================================================

/// Stateless orchestrator over a shared configuration and a set of sources.
///
/// `Send + Sync`; one engine can serve concurrent calls.
pub struct SentimentEngine {
    config: ConfigHandle,
    /// Build the reference sources from each call's config snapshot.
    builtin: bool,
    sources: Vec<Box<dyn SignalSource>>,
}

impl SentimentEngine {
    /// Engine with no signal sources. Use [`analyze_with_signals`] or add
    /// sources with [`with_source`].
    ///
    /// [`analyze_with_signals`]: Self::analyze_with_signals
    /// [`with_source`]: Self::with_source
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            config,
            builtin: false,
            sources: Vec::new(),
        }
    }

    /// Engine wired with the reference indicator sources. Their periods and
    /// weights are read from the configuration snapshot of every call, so a
    /// reload takes effect on the next analysis.
    pub fn with_builtin_sources(config: ConfigHandle) -> Self {
        Self {
            config,
            builtin: true,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl SignalSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn add_source(&mut self, source: Box<dyn SignalSource>) {
        self.sources.push(source);
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Reference sources first, then added sources in insertion order.
    pub fn source_names(&self) -> Vec<&str> {
        let builtin: &[&str] = if self.builtin {
            &BUILTIN_SOURCE_NAMES
        } else {
            &[]
        };
        builtin
            .iter()
            .copied()
            .chain(self.sources.iter().map(|s| s.name()))
            .collect()
    }

    /// Full analysis using the registered sources.
    pub fn analyze(&self, series: &BarSeries) -> Result<SentimentResult> {
        let cfg = self.config.snapshot();
        self.run(series, &cfg, None)
    }

    /// Full analysis using caller-supplied signals instead of the registered
    /// sources. The signals pass through the same contract checks.
    pub fn analyze_with_signals(
        &self,
        series: &BarSeries,
        signals: Vec<Signal>,
    ) -> Result<SentimentResult> {
        let cfg = self.config.snapshot();
        self.run(series, &cfg, Some(signals))
    }

    pub(crate) fn run(
        &self,
        series: &BarSeries,
        cfg: &EngineConfig,
        supplied: Option<Vec<Signal>>,
    ) -> Result<SentimentResult> {
        let symbol = series.symbol();
        let timeframe = series.timeframe();

        // --- VALIDATE ------------------------------------------------------------
        let validator = BarValidator::new(&cfg.validation);
        let report = validator.validate(series);
        let cleaned;
        let series = if report.is_valid() {
            series
        } else {
            debug!(
                symbol,
                %timeframe,
                problems = report.problems().len(),
                "Series invalid, cleaning"
            );
            cleaned = validator.clean(series)?;
            &cleaned
        };
        if series.len() < cfg.min_bars {
            return Err(EngineError::insufficient(format!(
                "{} bars < min_bars {}",
                series.len(),
                cfg.min_bars
            )));
        }
        let last = series
            .last()
            .ok_or_else(|| EngineError::insufficient("series is empty"))?;

        // --- COLLECT_SIGNALS -----------------------------------------------------
        let mut registry = SignalRegistry::new();
        match supplied {
            Some(signals) => registry.extend(CALLER_SOURCE, signals),
            None => {
                let builtin = if self.builtin {
                    builtin_sources(&cfg.sources)
                } else {
                    Vec::new()
                };
                for source in builtin.iter().chain(&self.sources) {
                    match source.signals(series) {
                        Ok(signals) => registry.extend(source.name(), signals),
                        Err(e) => registry.drop_source(source.name(), format!("{e:#}")),
                    }
                }
            }
        }
        if registry.is_empty() {
            let reasons: Vec<String> = registry
                .dropped()
                .iter()
                .map(|d| format!("{}: {}", d.source, d.reason))
                .collect();
            return Err(EngineError::insufficient(if reasons.is_empty() {
                "no signal sources registered".to_string()
            } else {
                format!("no usable signals ({})", reasons.join("; "))
            }));
        }
        debug!(
            symbol,
            %timeframe,
            accepted = registry.len(),
            dropped = registry.dropped().len(),
            "Signals collected"
        );

        // --- CLASSIFY_REGIME -----------------------------------------------------
        let regime = RegimeClassifier::new(&cfg.regime).classify(series)?;
        debug!(symbol, %timeframe, regime = %regime, "Regime classified");

        // --- SCORE ---------------------------------------------------------------
        let outcome = ConfidenceScorer::new(&cfg.scoring).score(registry.signals(), &regime)?;

        // --- ADJUST --------------------------------------------------------------
        let favorability = regime.favorability();
        let regime_adjustment = cfg
            .scoring
            .size_multiplier(favorability)
            .clamp(0.0, cfg.scoring.max_regime_adjustment);

        // --- FILTER --------------------------------------------------------------
        let trade_allowed = cfg.scoring.is_allowed(favorability);
        let regime_warning = (!trade_allowed).then(|| {
            format!(
                "{favorability} regime ({}, volatility {}, volume {}): trading not advised",
                regime.trend(),
                regime.volatility(),
                regime.volume()
            )
        });

        // --- EMIT ----------------------------------------------------------------
        let insights = build_insights(&regime, &outcome);
        let (_, dropped_sources) = registry.into_parts();

        let result = SentimentResult {
            symbol: symbol.to_string(),
            timeframe,
            sentiment: outcome.sentiment,
            base_confidence: outcome.confidence,
            direction_score: outcome.direction_score,
            regime,
            regime_adjustment,
            trade_allowed,
            regime_warning,
            risk_level: outcome.risk_level,
            contributing_signals: outcome.contributions,
            dropped_sources,
            insights,
            price: last.close,
            as_of: last.timestamp,
        };

        info!(
            symbol,
            %timeframe,
            sentiment = %result.sentiment,
            confidence = format!("{:.3}", result.base_confidence),
            favorability = %favorability,
            adjustment = format!("{:.2}", result.regime_adjustment),
            trade_allowed,
            "Sentiment analysis complete"
        );

        Ok(result)
    }
}

// =============================================================================
// Insights
// =============================================================================

fn build_insights(regime: &RegimeState, outcome: &ScoreOutcome) -> Vec<String> {
    let m = regime.metrics();
    let mut insights = Vec::with_capacity(MAX_INSIGHTS);

    insights.push(format!(
        "Regime {}: {} with {} volatility and {} volume",
        regime.favorability(),
        regime.trend(),
        regime.volatility(),
        regime.volume()
    ));

    insights.push(match regime.trend() {
        TrendRegime::StrongUptrend | TrendRegime::StrongDowntrend => format!(
            "Strong directional move: ADX {:.1}, efficiency {:.2}",
            m.adx, m.efficiency
        ),
        TrendRegime::Uptrend | TrendRegime::Downtrend => format!(
            "Trend in place: ADX {:.1} (+DI {:.1} / -DI {:.1})",
            m.adx, m.plus_di, m.minus_di
        ),
        TrendRegime::Ranging => format!("No clear trend: ADX {:.1}", m.adx),
    });

    insights.push(format!(
        "ATR {:.3}% of price, {:.0}th percentile of recent history, {}",
        m.atr_pct,
        m.volatility_percentile,
        if m.volatility_expanding { "expanding" } else { "contracting" }
    ));

    let obv = match m.obv_trend {
        1 => "rising",
        -1 => "falling",
        _ => "flat",
    };
    insights.push(format!(
        "Volume {:.2}x window average, OBV {obv}",
        m.relative_volume
    ));

    let agreeing = outcome
        .contributions
        .iter()
        .filter(|c| c.direction == outcome.sentiment)
        .count();
    insights.push(if outcome.sentiment == Direction::Neutral {
        format!(
            "Signals balanced: score {:+.3}, dispersion {:.2}",
            outcome.direction_score, outcome.dispersion
        )
    } else {
        format!(
            "{agreeing} of {} signals {}",
            outcome.contributions.len(),
            outcome.sentiment.as_lower()
        )
    });

    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Favorabilities in which trading is blocked under `cfg`.
pub fn blocked_regimes(cfg: &EngineConfig) -> Vec<Favorability> {
    Favorability::ALL
        .into_iter()
        .filter(|f| !cfg.scoring.is_allowed(*f))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::bar::fixtures::{bar, random_walk};
    use crate::regime::VolatilityRegime;
    use proptest::prelude::*;

    struct FailingSource;

    impl SignalSource for FailingSource {
        fn name(&self) -> &str {
            "smc"
        }

        fn signals(&self, _series: &BarSeries) -> anyhow::Result<Vec<Signal>> {
            anyhow::bail!("pattern service unavailable")
        }
    }

    struct FixedSource(Vec<Signal>);

    impl SignalSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn signals(&self, _series: &BarSeries) -> anyhow::Result<Vec<Signal>> {
            Ok(self.0.clone())
        }
    }

    fn engine() -> SentimentEngine {
        SentimentEngine::with_builtin_sources(ConfigHandle::default())
    }

    /// Ranging, ever-widening bars with flat volume: UNFAVORABLE.
    fn unfavorable_series() -> BarSeries {
        let bars = (0..150)
            .map(|i| {
                let open = 100.0 + if i % 2 == 0 { 0.2 } else { -0.2 };
                bar(i, open, 100.0, 0.1 + i as f64 * 0.02, 5_000.0)
            })
            .collect();
        BarSeries::new("EURUSD", Timeframe::H1, bars)
    }

    fn pair() -> Vec<Signal> {
        vec![
            Signal::new("ml", Direction::Bullish, 8.0, 0.5),
            Signal::new("smc", Direction::Bearish, 4.0, 0.5),
        ]
    }

    #[test]
    fn random_walk_produces_bounded_result() {
        let result = engine().analyze(&random_walk(200, 17)).unwrap();
        assert_eq!(result.symbol(), "EURUSD");
        assert_eq!(result.timeframe(), Timeframe::H1);
        assert!((0.0..=1.0).contains(&result.base_confidence()));
        assert_eq!(result.contributing_signals().len(), 4);
        assert!(result.dropped_sources().is_empty());
        assert!(!result.insights().is_empty() && result.insights().len() <= MAX_INSIGHTS);
        assert_eq!(result.as_of(), random_walk(200, 17).last().unwrap().timestamp);
    }

    #[test]
    fn unfavorable_regime_blocks_without_touching_confidence() {
        let engine = SentimentEngine::new(ConfigHandle::default());
        let series = unfavorable_series();
        let result = engine.analyze_with_signals(&series, pair()).unwrap();

        assert_eq!(result.regime().favorability(), Favorability::Unfavorable);
        assert_eq!(result.regime().volatility(), VolatilityRegime::VeryHigh);
        assert!(!result.trade_allowed());
        assert!(result.regime_warning().unwrap().starts_with("UNFAVORABLE"));
        assert_eq!(result.regime_adjustment(), 0.0);
        assert_eq!(result.effective_confidence(), 0.0);
        assert!(result.regime().metrics().volatility_expanding);
        assert!(result.insights()[2].ends_with("history, expanding"));

        // Same value the scorer produces on its own.
        let cfg = EngineConfig::default();
        let standalone = ConfidenceScorer::new(&cfg.scoring)
            .score(&pair(), result.regime())
            .unwrap();
        assert_eq!(result.base_confidence(), standalone.confidence);
        assert!(result.base_confidence() > 0.5 && result.base_confidence() < 1.0);
    }

    #[test]
    fn allowing_every_regime_lifts_the_block() {
        let handle = ConfigHandle::default();
        let engine = SentimentEngine::new(handle.clone());
        let mut cfg = EngineConfig::default();
        cfg.scoring.allowed_regimes = Favorability::ALL.to_vec();
        handle.update(cfg).unwrap();

        let result = engine
            .analyze_with_signals(&unfavorable_series(), pair())
            .unwrap();
        assert!(result.trade_allowed());
        assert!(result.regime_warning().is_none());
        assert!(blocked_regimes(&handle.snapshot()).is_empty());
    }

    #[test]
    fn reloaded_source_weights_apply_to_next_call() {
        let handle = ConfigHandle::default();
        let engine = SentimentEngine::with_builtin_sources(handle.clone());
        let series = random_walk(200, 17);

        let before = engine.analyze(&series).unwrap();
        let ema_before = before.contributing_signals()[0].weight;
        assert!(ema_before < 1.0);

        let mut cfg = EngineConfig::default();
        cfg.sources.trend_weight = 1.0;
        cfg.sources.rsi_weight = 0.0;
        cfg.sources.roc_weight = 0.0;
        cfg.sources.volume_weight = 0.0;
        handle.update(cfg).unwrap();

        let after = engine.analyze(&series).unwrap();
        let weights: Vec<(&str, f64)> = after
            .contributing_signals()
            .iter()
            .map(|c| (c.name.as_str(), c.weight))
            .collect();
        assert_eq!(
            weights,
            [
                ("ema_trend", 1.0),
                ("rsi_momentum", 0.0),
                ("roc_momentum", 0.0),
                ("volume_flow", 0.0)
            ]
        );
        assert_eq!(after.contributing_signals()[0].raw_weight, 1.0);
    }

    #[test]
    fn reloaded_source_periods_apply_to_next_call() {
        let handle = ConfigHandle::default();
        let engine = SentimentEngine::with_builtin_sources(handle.clone());
        let series = random_walk(200, 5);
        assert!(engine.analyze(&series).unwrap().dropped_sources().is_empty());

        let mut cfg = EngineConfig::default();
        cfg.sources.ema_slow = 500;
        handle.update(cfg).unwrap();

        let result = engine.analyze(&series).unwrap();
        assert_eq!(result.dropped_sources().len(), 1);
        assert_eq!(result.dropped_sources()[0].source, "ema_trend");
        assert!(result.dropped_sources()[0].reason.contains("EMA 20/500"));
    }

    #[test]
    fn source_names_list_builtin_then_added() {
        let engine = engine().with_source(FailingSource);
        assert_eq!(
            engine.source_names(),
            ["ema_trend", "rsi_momentum", "roc_momentum", "volume_flow", "smc"]
        );
        assert!(SentimentEngine::new(ConfigHandle::default())
            .source_names()
            .is_empty());
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = engine().analyze(&random_walk(10, 1)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[test]
    fn failing_source_is_dropped_with_reason() {
        let result = engine()
            .with_source(FailingSource)
            .analyze(&random_walk(200, 5))
            .unwrap();
        assert_eq!(result.dropped_sources().len(), 1);
        assert_eq!(result.dropped_sources()[0].source, "smc");
        assert!(result.dropped_sources()[0].reason.contains("unavailable"));
        assert_eq!(result.contributing_signals().len(), 4);
    }

    #[test]
    fn only_failing_sources_is_insufficient() {
        let engine = SentimentEngine::new(ConfigHandle::default())
            .with_source(FailingSource)
            .with_source(FixedSource(vec![Signal::new(
                "bad",
                Direction::Bullish,
                12.0,
                0.5,
            )]));
        let err = engine.analyze(&random_walk(200, 5)).unwrap_err();
        match err {
            EngineError::InsufficientData(msg) => {
                assert!(msg.contains("smc"));
                assert!(msg.contains("fixed"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_sources_is_insufficient() {
        let engine = SentimentEngine::new(ConfigHandle::default());
        assert!(matches!(
            engine.analyze(&random_walk(200, 5)),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn dirty_series_is_cleaned_first() {
        let mut bars = random_walk(200, 23).bars().to_vec();
        bars[50].close *= 2.0;
        let series = random_walk(200, 23).with_bars(bars);
        let result = engine().analyze(&series).unwrap();
        assert!((0.0..=1.0).contains(&result.base_confidence()));
    }

    #[test]
    fn unrepairable_series_is_invalid() {
        let mut bars = random_walk(200, 23).bars().to_vec();
        bars[199].close *= 2.0;
        let series = random_walk(200, 23).with_bars(bars);
        assert!(matches!(
            engine().analyze(&series),
            Err(EngineError::InvalidData { .. })
        ));
    }

    #[test]
    fn summary_mentions_decision() {
        let engine = SentimentEngine::new(ConfigHandle::default());
        let result = engine
            .analyze_with_signals(&unfavorable_series(), pair())
            .unwrap();
        let summary = result.summary();
        assert!(summary.starts_with("EURUSD H1: BULLISH 60.0%"));
        assert!(summary.ends_with("trade blocked"));
    }

    #[test]
    fn result_serialises() {
        let result = engine().analyze(&random_walk(200, 2)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["timeframe"], "H1");
        assert!(json["regime"]["favorability"].is_string());
        assert!(json["base_confidence"].is_number());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn deterministic_and_bounded(seed in 0u64..1_000) {
            let engine = engine();
            let series = random_walk(180, seed);
            let a = engine.analyze(&series).unwrap();
            let b = engine.analyze(&series).unwrap();
            prop_assert_eq!(&a, &b);

            let max = engine.config().snapshot().scoring.max_regime_adjustment;
            prop_assert!((0.0..=1.0).contains(&a.base_confidence()));
            prop_assert!((0.0..=max).contains(&a.regime_adjustment()));
            prop_assert!(a.effective_confidence() <= 1.0);
        }
    }
}
