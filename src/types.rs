// =============================================================================
// Shared types used across the sentiment engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Directional bias of a signal or of a final sentiment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// +1.0 for bullish, -1.0 for bearish, 0.0 for neutral.
    pub fn sign(self) -> f64 {
        match self {
            Self::Bullish => 1.0,
            Self::Bearish => -1.0,
            Self::Neutral => 0.0,
        }
    }

    /// Lowercase label used in human-readable insights.
    pub fn as_lower(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Qualitative risk tier attached to a sentiment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Chart interval of a bar series.
///
/// Variants are declared shortest first so the derived `Ord` matches the
/// duration ordering used by the multi-timeframe reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Self::M1,
        Self::M5,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::D1,
        Self::W1,
        Self::MN1,
    ];

    /// Bar duration in minutes.
    pub fn minutes(self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M5 => 5,
            Self::M15 => 15,
            Self::M30 => 30,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1440,
            Self::W1 => 10080,
            Self::MN1 => 43200,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::M30 => "M30",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
            Self::W1 => "W1",
            Self::MN1 => "MN1",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.to_string() == upper)
            .ok_or_else(|| format!("unknown timeframe: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Bullish.sign(), 1.0);
        assert_eq!(Direction::Bearish.sign(), -1.0);
        assert_eq!(Direction::Neutral.sign(), 0.0);
    }

    #[test]
    fn direction_serialises_upper_case() {
        let json = serde_json::to_string(&Direction::Bullish).unwrap();
        assert_eq!(json, "\"BULLISH\"");
        let back: Direction = serde_json::from_str("\"BEARISH\"").unwrap();
        assert_eq!(back, Direction::Bearish);
    }

    #[test]
    fn timeframe_order_follows_duration() {
        let mut minutes: Vec<u32> = Timeframe::ALL.iter().map(|tf| tf.minutes()).collect();
        let sorted = {
            let mut m = minutes.clone();
            m.sort_unstable();
            m
        };
        assert_eq!(minutes, sorted);
        minutes.dedup();
        assert_eq!(minutes.len(), Timeframe::ALL.len());
        assert!(Timeframe::D1 > Timeframe::H4);
    }

    #[test]
    fn timeframe_parse() {
        assert_eq!("h4".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert_eq!(" D1 ".parse::<Timeframe>().unwrap(), Timeframe::D1);
        assert!("H2".parse::<Timeframe>().is_err());
    }

    #[test]
    fn risk_level_display() {
        assert_eq!(RiskLevel::Medium.to_string(), "MEDIUM");
        assert!(RiskLevel::High > RiskLevel::Low);
    }
}
