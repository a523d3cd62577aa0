use crate::scoring::outcome::{CompositeBreakdown, CompositeScore};
use crate::scoring::round_dp;

pub const COMPATIBILITY_WEIGHT: f64 = 0.35;
pub const PROFIT_WEIGHT: f64 = 0.25;
pub const SUSTAINABILITY_WEIGHT: f64 = 0.20;
pub const ROTATION_WEIGHT: f64 = 0.15;
/// Applied to `(1 - risk_factor) * 100`, so lower risk ranks higher.
pub const RISK_WEIGHT: f64 = 0.05;

/// Profit thresholds for absolute normalisation, highest first.
const PROFIT_LADDER: [(f64, f64); 5] = [
    (200_000.0, 100.0),
    (150_000.0, 85.0),
    (100_000.0, 70.0),
    (50_000.0, 50.0),
    (25_000.0, 30.0),
];
const PROFIT_LADDER_FLOOR: f64 = 15.0;

/// Blends the per-criterion scores into one composite for ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationRanker;

impl RecommendationRanker {
    /// Weighted composite of 0-100 scores and a 0-1 risk factor.
    pub fn composite(
        &self,
        compatibility: f64,
        profit_normalized: f64,
        sustainability: f64,
        rotation: f64,
        risk_factor: f64,
    ) -> CompositeScore {
        let profit = profit_normalized.clamp(0.0, 100.0);
        let risk = (1.0 - risk_factor) * 100.0;

        let parts = CompositeBreakdown {
            compatibility: compatibility * COMPATIBILITY_WEIGHT,
            profit: profit * PROFIT_WEIGHT,
            sustainability: sustainability * SUSTAINABILITY_WEIGHT,
            rotation: rotation * ROTATION_WEIGHT,
            risk: risk * RISK_WEIGHT,
        };
        let total =
            parts.compatibility + parts.profit + parts.sustainability + parts.rotation + parts.risk;

        CompositeScore {
            composite_score: round_dp(total, 2),
            breakdown: CompositeBreakdown {
                compatibility: round_dp(parts.compatibility, 2),
                profit: round_dp(parts.profit, 2),
                sustainability: round_dp(parts.sustainability, 2),
                rotation: round_dp(parts.rotation, 2),
                risk: round_dp(parts.risk, 2),
            },
        }
    }

    /// Map a profit figure onto 0-100.
    ///
    /// With a positive `max_profit` the score is relative to it, capped at
    /// 100; otherwise a fixed threshold ladder applies.
    pub fn normalize_profit(&self, profit: f64, max_profit: Option<f64>) -> f64 {
        if profit <= 0.0 {
            return 0.0;
        }
        match max_profit {
            Some(max) if max > 0.0 => (profit / max * 100.0).min(100.0),
            _ => PROFIT_LADDER
                .iter()
                .find(|(threshold, _)| profit >= *threshold)
                .map(|(_, score)| *score)
                .unwrap_or(PROFIT_LADDER_FLOOR),
        }
    }
}
