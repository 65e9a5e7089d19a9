// =============================================================================
// Composite favorability lookup
// =============================================================================
//
// A constant table keyed by (trending?, volatility, volume). Every strong or
// plain up/down trend shares the "trending" plane; RANGING has its own.
//
// Rows: volatility VERY_LOW..VERY_HIGH. Columns: volume DRY, NORMAL,
// ELEVATED, SURGE.
// =============================================================================

use super::states::{Favorability, TrendRegime, VolatilityRegime, VolumeRegime};

use Favorability::{Cautious as C, Favorable as F, Moderate as M, Unfavorable as U};

const TRENDING: [[Favorability; 4]; 5] = [
    [C, M, M, C], // VERY_LOW
    [M, F, F, M], // LOW
    [M, F, F, M], // NORMAL
    [M, M, M, M], // HIGH
    [C, M, M, C], // VERY_HIGH
];

const RANGING: [[Favorability; 4]; 5] = [
    [U, C, C, C], // VERY_LOW
    [C, C, M, C], // LOW
    [C, C, M, C], // NORMAL
    [C, C, M, C], // HIGH
    [U, C, C, C], // VERY_HIGH
];

/// Total mapping from the three regime dimensions to a favorability.
pub fn favorability(
    trend: TrendRegime,
    volatility: VolatilityRegime,
    volume: VolumeRegime,
) -> Favorability {
    let plane = if trend.is_trending() {
        &TRENDING
    } else {
        &RANGING
    };
    plane[volatility.index()][volume.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// The rule form of the table, written independently of the arrays.
    fn by_rule(
        trend: TrendRegime,
        volatility: VolatilityRegime,
        volume: VolumeRegime,
    ) -> Favorability {
        use VolatilityRegime as V;
        use VolumeRegime as Q;
        if trend.is_trending() {
            if matches!(volatility, V::Low | V::Normal) && matches!(volume, Q::Normal | Q::Elevated)
            {
                Favorability::Favorable
            } else if volatility.is_extreme() && matches!(volume, Q::Dry | Q::Surge) {
                Favorability::Cautious
            } else {
                Favorability::Moderate
            }
        } else if volatility.is_extreme() && volume == Q::Dry {
            Favorability::Unfavorable
        } else if !volatility.is_extreme() && volume == Q::Elevated {
            Favorability::Moderate
        } else {
            Favorability::Cautious
        }
    }

    #[test]
    fn every_triple_matches_rules() {
        let mut seen = 0;
        for trend in TrendRegime::ALL {
            for volatility in VolatilityRegime::ALL {
                for volume in VolumeRegime::ALL {
                    assert_eq!(
                        favorability(trend, volatility, volume),
                        by_rule(trend, volatility, volume),
                        "{trend} / {volatility} / {volume}"
                    );
                    seen += 1;
                }
            }
        }
        assert_eq!(seen, 100);
    }

    #[test]
    fn all_four_outcomes_reachable() {
        let mut counts: HashMap<Favorability, usize> = HashMap::new();
        for trend in TrendRegime::ALL {
            for volatility in VolatilityRegime::ALL {
                for volume in VolumeRegime::ALL {
                    *counts.entry(favorability(trend, volatility, volume)).or_default() += 1;
                }
            }
        }
        // 4 trending states x (4 F + 12 M + 4 C), RANGING has 2 U + 3 M + 15 C
        assert_eq!(counts[&Favorability::Favorable], 16);
        assert_eq!(counts[&Favorability::Unfavorable], 2);
        assert_eq!(counts[&Favorability::Moderate], 4 * 12 + 3);
        assert_eq!(counts[&Favorability::Cautious], 4 * 4 + 15);
    }

    #[test]
    fn strong_and_plain_trends_agree() {
        for volatility in VolatilityRegime::ALL {
            for volume in VolumeRegime::ALL {
                assert_eq!(
                    favorability(TrendRegime::StrongUptrend, volatility, volume),
                    favorability(TrendRegime::Downtrend, volatility, volume)
                );
            }
        }
    }
}
