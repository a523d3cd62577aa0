pub mod compatibility;
pub mod outcome;
pub mod profit;
pub mod ranker;
pub mod rotation;
pub mod sustainability;

pub use compatibility::CompatibilityScorer;
pub use outcome::{
    CompatibilityResult, CompositeScore, Factor, FactorFit, ProfitResult, RotationResult,
    SustainabilityResult,
};
pub use profit::ProfitCalculator;
pub use ranker::RecommendationRanker;
pub use rotation::RotationAnalyzer;
pub use sustainability::SustainabilityScorer;

/// Qualitative band for a 0-100 score, used for headline reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScoreBand {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl ScoreBand {
    pub(crate) fn of(score: f64) -> ScoreBand {
        if score >= 80.0 {
            ScoreBand::Excellent
        } else if score >= 60.0 {
            ScoreBand::Good
        } else if score >= 40.0 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Poor
        }
    }
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Round for presentation. Computation always uses the unrounded value.
pub(crate) fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}
