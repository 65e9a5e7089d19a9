// =============================================================================
// Regime dimensions and the immutable regime snapshot
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use super::favorability::favorability;

// =============================================================================
// Dimensions
// =============================================================================

/// Direction and strength of the prevailing trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendRegime {
    StrongUptrend,
    Uptrend,
    Ranging,
    Downtrend,
    StrongDowntrend,
}

impl TrendRegime {
    pub const ALL: [TrendRegime; 5] = [
        Self::StrongUptrend,
        Self::Uptrend,
        Self::Ranging,
        Self::Downtrend,
        Self::StrongDowntrend,
    ];

    /// Any directional state, strong or not.
    pub fn is_trending(self) -> bool {
        !matches!(self, Self::Ranging)
    }

    /// Signed trend strength in [-1, 1]: 1 strong up, 0.5 up, 0 ranging.
    pub fn score(self) -> f64 {
        match self {
            Self::StrongUptrend => 1.0,
            Self::Uptrend => 0.5,
            Self::Ranging => 0.0,
            Self::Downtrend => -0.5,
            Self::StrongDowntrend => -1.0,
        }
    }
}

impl fmt::Display for TrendRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StrongUptrend => "STRONG_UPTREND",
            Self::Uptrend => "UPTREND",
            Self::Ranging => "RANGING",
            Self::Downtrend => "DOWNTREND",
            Self::StrongDowntrend => "STRONG_DOWNTREND",
        })
    }
}

/// Current ATR% relative to its own history, lowest band first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRegime {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
}

impl VolatilityRegime {
    pub const ALL: [VolatilityRegime; 5] = [
        Self::VeryLow,
        Self::Low,
        Self::Normal,
        Self::High,
        Self::VeryHigh,
    ];

    /// Position in [`Self::ALL`], which is also the percentile band index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// VERY_LOW or VERY_HIGH.
    pub fn is_extreme(self) -> bool {
        matches!(self, Self::VeryLow | Self::VeryHigh)
    }

    /// Tradability of this volatility in (0, 1]; NORMAL scores highest.
    pub fn score(self) -> f64 {
        match self {
            Self::VeryLow => 0.2,
            Self::Low => 0.5,
            Self::Normal => 1.0,
            Self::High => 0.7,
            Self::VeryHigh => 0.3,
        }
    }
}

impl fmt::Display for VolatilityRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VeryLow => "VERY_LOW",
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY_HIGH",
        })
    }
}

/// Current volume relative to the lookback window, lowest band first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeRegime {
    Dry,
    Normal,
    Elevated,
    Surge,
}

impl VolumeRegime {
    pub const ALL: [VolumeRegime; 4] = [Self::Dry, Self::Normal, Self::Elevated, Self::Surge];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for VolumeRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dry => "DRY",
            Self::Normal => "NORMAL",
            Self::Elevated => "ELEVATED",
            Self::Surge => "SURGE",
        })
    }
}

/// Composite judgment of whether conditions favor acting on a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Favorability {
    Favorable,
    Moderate,
    Cautious,
    Unfavorable,
}

impl Favorability {
    pub const ALL: [Favorability; 4] = [
        Self::Favorable,
        Self::Moderate,
        Self::Cautious,
        Self::Unfavorable,
    ];
}

impl fmt::Display for Favorability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Favorable => "FAVORABLE",
            Self::Moderate => "MODERATE",
            Self::Cautious => "CAUTIOUS",
            Self::Unfavorable => "UNFAVORABLE",
        })
    }
}

/// Coarse single-number regime class, e.g. for labelling training rows.
///
/// High volatility takes precedence over the trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeLabel {
    Ranging,
    TrendingUp,
    TrendingDown,
    HighVolatility,
}

impl RegimeLabel {
    pub fn of(trend: TrendRegime, volatility: VolatilityRegime) -> Self {
        match (trend, volatility) {
            (_, VolatilityRegime::High | VolatilityRegime::VeryHigh) => Self::HighVolatility,
            (TrendRegime::StrongUptrend | TrendRegime::Uptrend, _) => Self::TrendingUp,
            (TrendRegime::StrongDowntrend | TrendRegime::Downtrend, _) => Self::TrendingDown,
            (TrendRegime::Ranging, _) => Self::Ranging,
        }
    }

    /// Numeric class: 0 ranging, 1 up, 2 down, 3 high volatility.
    pub fn code(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Raw readings behind a classification, kept for insights and logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeMetrics {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    /// Net change over path length in the window, in [-1, 1].
    pub efficiency: f64,
    pub net_change: f64,
    /// Latest ATR as a percentage of close.
    pub atr_pct: f64,
    pub volatility_percentile: f64,
    /// Latest ATR% above the mean of its history.
    pub volatility_expanding: bool,
    pub volume_percentile: f64,
    /// Current volume over the window mean.
    pub relative_volume: f64,
    /// Sign of OBV against its window mean: 1, -1 or 0.
    pub obv_trend: i8,
}

/// Immutable regime snapshot for one analysis call.
///
/// Favorability is always derived from the three dimensions in
/// [`RegimeState::new`]; there is no way to set it independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeState {
    trend: TrendRegime,
    volatility: VolatilityRegime,
    volume: VolumeRegime,
    favorability: Favorability,
    trend_score: f64,
    volatility_score: f64,
    label: RegimeLabel,
    metrics: RegimeMetrics,
}

impl RegimeState {
    pub fn new(
        trend: TrendRegime,
        volatility: VolatilityRegime,
        volume: VolumeRegime,
        metrics: RegimeMetrics,
    ) -> Self {
        Self {
            trend,
            volatility,
            volume,
            favorability: favorability(trend, volatility, volume),
            trend_score: trend.score(),
            volatility_score: volatility.score(),
            label: RegimeLabel::of(trend, volatility),
            metrics,
        }
    }

    pub fn trend(&self) -> TrendRegime {
        self.trend
    }

    pub fn volatility(&self) -> VolatilityRegime {
        self.volatility
    }

    pub fn volume(&self) -> VolumeRegime {
        self.volume
    }

    pub fn favorability(&self) -> Favorability {
        self.favorability
    }

    pub fn trend_score(&self) -> f64 {
        self.trend_score
    }

    pub fn volatility_score(&self) -> f64 {
        self.volatility_score
    }

    pub fn label(&self) -> RegimeLabel {
        self.label
    }

    pub fn metrics(&self) -> &RegimeMetrics {
        &self.metrics
    }
}

impl fmt::Display for RegimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / vol {} / volume {} => {}",
            self.trend, self.volatility, self.volume, self.favorability
        )
    }
}
