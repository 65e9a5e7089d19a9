// =============================================================================
// Runtime Configuration — Hot-reloadable engine settings with atomic save
// =============================================================================
//
// Every numeric threshold the engine uses lives here. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.
//
// The engine never reads the configuration through a live lock: each analysis
// call takes an `Arc` snapshot from `ConfigHandle` at entry, so a reload in the
// middle of a call cannot change what that call sees.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::regime::Favorability;
use crate::types::Timeframe;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_min_bars() -> usize {
    100
}

fn default_max_bar_move() -> f64 {
    0.10
}

fn default_max_fill_gap() -> usize {
    3
}

fn default_max_zero_volume_fraction() -> f64 {
    0.10
}

fn default_max_gap_intervals() -> f64 {
    3.0
}

fn default_lookback() -> usize {
    50
}

fn default_adx_period() -> usize {
    14
}

fn default_atr_period() -> usize {
    14
}

fn default_adx_trending() -> f64 {
    25.0
}

fn default_adx_strong() -> f64 {
    40.0
}

fn default_efficiency_threshold() -> f64 {
    0.5
}

fn default_efficiency_epsilon() -> f64 {
    1e-4
}

fn default_volatility_history() -> usize {
    100
}

fn default_volatility_edges() -> [f64; 4] {
    [20.0, 40.0, 70.0, 90.0]
}

fn default_volume_edges() -> [f64; 3] {
    [25.0, 75.0, 95.0]
}

fn default_sentiment_threshold() -> f64 {
    0.10
}

fn default_risk_edges() -> [f64; 2] {
    [1.0 / 3.0, 2.0 / 3.0]
}

fn default_size_multipliers() -> BTreeMap<Favorability, f64> {
    BTreeMap::from([
        (Favorability::Favorable, 1.0),
        (Favorability::Moderate, 0.7),
        (Favorability::Cautious, 0.4),
        (Favorability::Unfavorable, 0.0),
    ])
}

fn default_max_regime_adjustment() -> f64 {
    1.5
}

fn default_allowed_regimes() -> Vec<Favorability> {
    vec![Favorability::Favorable, Favorability::Moderate]
}

fn default_timeframe_weights() -> BTreeMap<Timeframe, f64> {
    BTreeMap::from([
        (Timeframe::M15, 0.10),
        (Timeframe::H1, 0.20),
        (Timeframe::H4, 0.30),
        (Timeframe::D1, 0.40),
    ])
}

fn default_timeframe_weight() -> f64 {
    0.25
}

fn default_alignment_threshold() -> f64 {
    0.7
}

fn default_ema_fast() -> usize {
    20
}

fn default_ema_slow() -> usize {
    50
}

fn default_rsi_period() -> usize {
    14
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_roc_period() -> usize {
    10
}

fn default_obv_slope_bars() -> usize {
    5
}

fn default_trend_weight() -> f64 {
    0.20
}

fn default_rsi_weight() -> f64 {
    0.10
}

fn default_roc_weight() -> f64 {
    0.10
}

fn default_volume_weight() -> f64 {
    0.15
}

// =============================================================================
// ValidationParams
// =============================================================================

/// Thresholds for the bar validator and cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationParams {
    /// Largest accepted single-bar close-to-close move, as a fraction.
    #[serde(default = "default_max_bar_move")]
    pub max_bar_move: f64,

    /// Longest run of missing values `clean` will forward-fill.
    #[serde(default = "default_max_fill_gap")]
    pub max_fill_gap: usize,

    /// Share of zero-volume bars above which a warning is reported.
    #[serde(default = "default_max_zero_volume_fraction")]
    pub max_zero_volume_fraction: f64,

    /// Bar spacing, in timeframe intervals, above which a time gap is reported.
    #[serde(default = "default_max_gap_intervals")]
    pub max_gap_intervals: f64,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            max_bar_move: default_max_bar_move(),
            max_fill_gap: default_max_fill_gap(),
            max_zero_volume_fraction: default_max_zero_volume_fraction(),
            max_gap_intervals: default_max_gap_intervals(),
        }
    }
}

// =============================================================================
// RegimeParams
// =============================================================================

/// Classifier thresholds and percentile band edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeParams {
    /// Bars in the classification window.
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    #[serde(default = "default_adx_period")]
    pub adx_period: usize,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// ADX at or above this is trending.
    #[serde(default = "default_adx_trending")]
    pub adx_trending: f64,

    /// ADX strictly above this may be a strong trend.
    #[serde(default = "default_adx_strong")]
    pub adx_strong: f64,

    /// Minimum |efficiency| for a strong trend.
    #[serde(default = "default_efficiency_threshold")]
    pub efficiency_threshold: f64,

    /// Floor for the efficiency denominator (path length).
    #[serde(default = "default_efficiency_epsilon")]
    pub efficiency_epsilon: f64,

    /// ATR% values used as the volatility percentile history.
    #[serde(default = "default_volatility_history")]
    pub volatility_history: usize,

    /// Percentile edges VERY_LOW|LOW|NORMAL|HIGH|VERY_HIGH.
    #[serde(default = "default_volatility_edges")]
    pub volatility_edges: [f64; 4],

    /// Percentile edges DRY|NORMAL|ELEVATED|SURGE.
    #[serde(default = "default_volume_edges")]
    pub volume_edges: [f64; 3],
}

impl Default for RegimeParams {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            adx_period: default_adx_period(),
            atr_period: default_atr_period(),
            adx_trending: default_adx_trending(),
            adx_strong: default_adx_strong(),
            efficiency_threshold: default_efficiency_threshold(),
            efficiency_epsilon: default_efficiency_epsilon(),
            volatility_history: default_volatility_history(),
            volatility_edges: default_volatility_edges(),
            volume_edges: default_volume_edges(),
        }
    }
}

// =============================================================================
// ScoringParams
// =============================================================================

/// Confidence scoring, regime adjustment and trade filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// |direction score| above which the sentiment leaves NEUTRAL.
    #[serde(default = "default_sentiment_threshold")]
    pub sentiment_threshold: f64,

    /// Dispersion edges LOW|MEDIUM|HIGH.
    #[serde(default = "default_risk_edges")]
    pub risk_edges: [f64; 2],

    /// Regime adjustment multiplier per favorability.
    #[serde(default = "default_size_multipliers")]
    pub size_multipliers: BTreeMap<Favorability, f64>,

    /// Upper bound for any configured multiplier.
    #[serde(default = "default_max_regime_adjustment")]
    pub max_regime_adjustment: f64,

    /// Favorabilities in which trading is permitted.
    #[serde(default = "default_allowed_regimes")]
    pub allowed_regimes: Vec<Favorability>,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            sentiment_threshold: default_sentiment_threshold(),
            risk_edges: default_risk_edges(),
            size_multipliers: default_size_multipliers(),
            max_regime_adjustment: default_max_regime_adjustment(),
            allowed_regimes: default_allowed_regimes(),
        }
    }
}

impl ScoringParams {
    /// Multiplier for `favorability`. Validation guarantees every key exists.
    pub fn size_multiplier(&self, favorability: Favorability) -> f64 {
        self.size_multipliers
            .get(&favorability)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_allowed(&self, favorability: Favorability) -> bool {
        self.allowed_regimes.contains(&favorability)
    }
}

// =============================================================================
// SourceParams
// =============================================================================

/// Periods, levels and weights of the built-in signal sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceParams {
    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,

    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,

    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    #[serde(default = "default_roc_period")]
    pub roc_period: usize,

    /// Bars over which the OBV slope is measured.
    #[serde(default = "default_obv_slope_bars")]
    pub obv_slope_bars: usize,

    #[serde(default = "default_trend_weight")]
    pub trend_weight: f64,

    #[serde(default = "default_rsi_weight")]
    pub rsi_weight: f64,

    #[serde(default = "default_roc_weight")]
    pub roc_weight: f64,

    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            ema_fast: default_ema_fast(),
            ema_slow: default_ema_slow(),
            rsi_period: default_rsi_period(),
            rsi_overbought: default_rsi_overbought(),
            rsi_oversold: default_rsi_oversold(),
            roc_period: default_roc_period(),
            obv_slope_bars: default_obv_slope_bars(),
            trend_weight: default_trend_weight(),
            rsi_weight: default_rsi_weight(),
            roc_weight: default_roc_weight(),
            volume_weight: default_volume_weight(),
        }
    }
}

// =============================================================================
// TimeframeParams
// =============================================================================

/// Multi-timeframe reconciliation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeParams {
    /// Alignment weight per timeframe (longer timeframes weigh more).
    #[serde(default = "default_timeframe_weights")]
    pub weights: BTreeMap<Timeframe, f64>,

    /// Weight for timeframes missing from `weights`.
    #[serde(default = "default_timeframe_weight")]
    pub default_weight: f64,

    /// Alignment score at or above which timeframes count as aligned.
    #[serde(default = "default_alignment_threshold")]
    pub alignment_threshold: f64,
}

impl Default for TimeframeParams {
    fn default() -> Self {
        Self {
            weights: default_timeframe_weights(),
            default_weight: default_timeframe_weight(),
            alignment_threshold: default_alignment_threshold(),
        }
    }
}

impl TimeframeParams {
    pub fn weight(&self, timeframe: Timeframe) -> f64 {
        self.weights
            .get(&timeframe)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for the sentiment engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum bars an analysis window must hold after cleaning.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,

    #[serde(default)]
    pub validation: ValidationParams,

    #[serde(default)]
    pub regime: RegimeParams,

    #[serde(default)]
    pub scoring: ScoringParams,

    #[serde(default)]
    pub sources: SourceParams,

    #[serde(default)]
    pub timeframes: TimeframeParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bars: default_min_bars(),
            validation: ValidationParams::default(),
            regime: RegimeParams::default(),
            scoring: ScoringParams::default(),
            sources: SourceParams::default(),
            timeframes: TimeframeParams::default(),
        }
    }
}

impl EngineConfig {
    /// Check ranges, orderings and band partitions.
    pub fn validate(&self) -> crate::error::Result<()> {
        let r = &self.regime;
        let v = &self.validation;
        let s = &self.scoring;
        let src = &self.sources;
        let tf = &self.timeframes;

        ensure(r.adx_period > 0, "adx_period must be positive")?;
        ensure(r.atr_period > 0, "atr_period must be positive")?;
        ensure(
            r.lookback >= 2 * r.adx_period + 1,
            format!(
                "lookback {} too short for adx_period {} (need >= {})",
                r.lookback,
                r.adx_period,
                2 * r.adx_period + 1
            ),
        )?;
        ensure(
            self.min_bars >= r.lookback,
            format!("min_bars {} below lookback {}", self.min_bars, r.lookback),
        )?;
        ensure(r.volatility_history > 0, "volatility_history must be positive")?;
        ensure(
            r.adx_trending > 0.0 && r.adx_trending < r.adx_strong && r.adx_strong < 100.0,
            "ADX thresholds must satisfy 0 < adx_trending < adx_strong < 100",
        )?;
        ensure(
            (0.0..=1.0).contains(&r.efficiency_threshold),
            "efficiency_threshold must be in [0, 1]",
        )?;
        ensure(
            r.efficiency_epsilon > 0.0 && r.efficiency_epsilon.is_finite(),
            "efficiency_epsilon must be positive",
        )?;
        check_edges("volatility_edges", &r.volatility_edges, 100.0)?;
        check_edges("volume_edges", &r.volume_edges, 100.0)?;

        ensure(
            v.max_bar_move > 0.0 && v.max_bar_move.is_finite(),
            "max_bar_move must be positive",
        )?;
        ensure(
            (0.0..=1.0).contains(&v.max_zero_volume_fraction),
            "max_zero_volume_fraction must be in [0, 1]",
        )?;
        ensure(
            v.max_gap_intervals >= 1.0 && v.max_gap_intervals.is_finite(),
            "max_gap_intervals must be at least 1",
        )?;

        ensure(
            (0.0..1.0).contains(&s.sentiment_threshold),
            "sentiment_threshold must be in [0, 1)",
        )?;
        check_edges("risk_edges", &s.risk_edges, 1.0)?;
        ensure(
            s.max_regime_adjustment > 0.0 && s.max_regime_adjustment.is_finite(),
            "max_regime_adjustment must be positive",
        )?;
        for fav in Favorability::ALL {
            let m = s.size_multipliers.get(&fav).copied().ok_or_else(|| {
                EngineError::Config(format!("size_multipliers missing entry for {fav}"))
            })?;
            ensure(
                m.is_finite() && m >= 0.0 && m <= s.max_regime_adjustment,
                format!(
                    "size multiplier for {fav} ({m}) outside [0, {}]",
                    s.max_regime_adjustment
                ),
            )?;
        }

        ensure(
            src.ema_fast > 0 && src.ema_fast < src.ema_slow,
            "sources must satisfy 0 < ema_fast < ema_slow",
        )?;
        ensure(src.rsi_period > 0, "rsi_period must be positive")?;
        ensure(src.roc_period > 0, "roc_period must be positive")?;
        ensure(src.obv_slope_bars > 0, "obv_slope_bars must be positive")?;
        ensure(
            src.rsi_oversold < src.rsi_overbought,
            "rsi_oversold must be below rsi_overbought",
        )?;
        for (name, w) in [
            ("trend_weight", src.trend_weight),
            ("rsi_weight", src.rsi_weight),
            ("roc_weight", src.roc_weight),
            ("volume_weight", src.volume_weight),
        ] {
            ensure(
                (0.0..=1.0).contains(&w),
                format!("{name} must be in [0, 1]"),
            )?;
        }

        ensure(
            tf.default_weight >= 0.0 && tf.default_weight.is_finite(),
            "default timeframe weight must be non-negative",
        )?;
        for (timeframe, w) in &tf.weights {
            ensure(
                *w >= 0.0 && w.is_finite(),
                format!("weight for {timeframe} must be non-negative"),
            )?;
        }
        ensure(
            (0.0..=1.0).contains(&tf.alignment_threshold),
            "alignment_threshold must be in [0, 1]",
        )?;

        Ok(())
    }

    /// Load configuration from a JSON file at `path` and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("engine config at {} rejected", path.display()))?;

        info!(
            path = %path.display(),
            lookback = config.regime.lookback,
            min_bars = config.min_bars,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise engine config")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}

fn ensure(cond: bool, msg: impl Into<String>) -> crate::error::Result<()> {
    if cond {
        Ok(())
    } else {
        Err(EngineError::Config(msg.into()))
    }
}

/// Edges must be finite, strictly increasing and strictly inside `(0, upper)`
/// so the bands they cut partition `[0, upper]` with no gap or overlap.
fn check_edges(name: &str, edges: &[f64], upper: f64) -> crate::error::Result<()> {
    ensure(
        edges.iter().all(|e| e.is_finite() && *e > 0.0 && *e < upper),
        format!("{name} must lie strictly inside (0, {upper})"),
    )?;
    ensure(
        edges.windows(2).all(|w| w[0] < w[1]),
        format!("{name} must be strictly increasing"),
    )
}

// =============================================================================
// ConfigHandle
// =============================================================================

/// Shared, hot-swappable configuration.
///
/// Readers call [`snapshot`](Self::snapshot) once per analysis and keep the
/// returned `Arc` for the whole call.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<EngineConfig>>>,
}

impl ConfigHandle {
    /// Wrap a validated configuration.
    pub fn new(config: EngineConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    /// Consistent view of the configuration at this instant.
    pub fn snapshot(&self) -> Arc<EngineConfig> {
        self.inner.read().clone()
    }

    /// Replace the configuration. Snapshots already handed out are unaffected.
    pub fn update(&self, config: EngineConfig) -> crate::error::Result<()> {
        config.validate()?;
        *self.inner.write() = Arc::new(config);
        info!("engine config updated");
        Ok(())
    }

    /// Re-read `path` and swap it in.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<()> {
        let config = EngineConfig::load(path)?;
        self.update(config)?;
        Ok(())
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(EngineConfig::default()))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_bars, 100);
        assert_eq!(cfg.regime.lookback, 50);
        assert_eq!(cfg.validation.max_fill_gap, 3);
        assert!((cfg.validation.max_bar_move - 0.10).abs() < f64::EPSILON);
        assert!((cfg.scoring.size_multiplier(Favorability::Moderate) - 0.7).abs() < f64::EPSILON);
        assert_eq!(cfg.scoring.size_multiplier(Favorability::Unfavorable), 0.0);
        assert!(cfg.scoring.is_allowed(Favorability::Favorable));
        assert!(!cfg.scoring.is_allowed(Favorability::Cautious));
        assert!((cfg.timeframes.weight(Timeframe::D1) - 0.40).abs() < f64::EPSILON);
        assert!((cfg.timeframes.weight(Timeframe::W1) - 0.25).abs() < f64::EPSILON);
        cfg.validate().unwrap();
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "regime": { "lookback": 60 }, "scoring": { "allowed_regimes": ["FAVORABLE"] } }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.regime.lookback, 60);
        assert_eq!(cfg.regime.adx_period, 14);
        assert_eq!(cfg.scoring.allowed_regimes, vec![Favorability::Favorable]);
        assert_eq!(cfg.scoring.size_multipliers.len(), 4);
    }

    #[test]
    fn timeframe_weight_keys_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"H4\""));
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timeframes.weights, cfg.timeframes.weights);
    }

    #[test]
    fn rejects_overlapping_volatility_edges() {
        let mut cfg = EngineConfig::default();
        cfg.regime.volatility_edges = [20.0, 40.0, 40.0, 90.0];
        assert!(matches!(cfg.validate(), Err(EngineError::Config(_))));

        cfg.regime.volatility_edges = [0.0, 40.0, 70.0, 90.0];
        assert!(cfg.validate().is_err());

        cfg.regime.volatility_edges = [20.0, 40.0, 70.0, 100.0];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_multiplier_above_max() {
        let mut cfg = EngineConfig::default();
        cfg.scoring.size_multipliers.insert(Favorability::Favorable, 2.0);
        assert!(cfg.validate().is_err());

        cfg.scoring.max_regime_adjustment = 2.0;
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_missing_multiplier() {
        let mut cfg = EngineConfig::default();
        cfg.scoring.size_multipliers.remove(&Favorability::Cautious);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("CAUTIOUS"));
    }

    #[test]
    fn rejects_lookback_too_short_for_adx() {
        let mut cfg = EngineConfig::default();
        cfg.regime.lookback = 20;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn snapshot_survives_update() {
        let handle = ConfigHandle::default();
        let before = handle.snapshot();

        let mut next = EngineConfig::default();
        next.regime.lookback = 80;
        handle.update(next).unwrap();

        assert_eq!(before.regime.lookback, 50);
        assert_eq!(handle.snapshot().regime.lookback, 80);
    }

    #[test]
    fn update_rejects_invalid_config() {
        let handle = ConfigHandle::default();
        let mut bad = EngineConfig::default();
        bad.timeframes.alignment_threshold = 1.5;
        assert!(handle.update(bad).is_err());
        assert_eq!(handle.snapshot().timeframes.alignment_threshold, 0.7);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("regime-sentiment-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine_config.json");

        let mut cfg = EngineConfig::default();
        cfg.scoring.sentiment_threshold = 0.2;
        cfg.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);

        let handle = ConfigHandle::default();
        handle.reload(&path).unwrap();
        assert!((handle.snapshot().scoring.sentiment_threshold - 0.2).abs() < f64::EPSILON);

        std::fs::remove_dir_all(&dir).ok();
    }
}
