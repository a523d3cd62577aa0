use crate::crops::Footprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A soil, weather or calendar factor checked by the compatibility scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Ph,
    N,
    P,
    K,
    Moisture,
    Temperature,
    Season,
}

/// Qualitative verdict for one factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorFit {
    Optimal,
    Acceptable,
    Poor,
    Sufficient,
    Low,
    Deficient,
    Suitable,
    Unsuitable,
    Unknown,
}

impl fmt::Display for FactorFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FactorFit::Optimal => "optimal",
            FactorFit::Acceptable => "acceptable",
            FactorFit::Poor => "poor",
            FactorFit::Sufficient => "sufficient",
            FactorFit::Low => "low",
            FactorFit::Deficient => "deficient",
            FactorFit::Suitable => "suitable",
            FactorFit::Unsuitable => "unsuitable",
            FactorFit::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// How well current conditions match one crop's requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub crop_name: String,
    /// 0-100.
    pub score: f64,
    /// Headline first, then one entry per violated requirement.
    pub reasons: Vec<String>,
    pub match_details: BTreeMap<Factor, FactorFit>,
}

/// How favourable a field's recent planting history is for one crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationResult {
    pub crop_name: String,
    /// 0-100.
    pub rotation_score: f64,
    pub reasons: Vec<String>,
    #[serde(rename = "rotation_benefits")]
    pub benefits: Vec<String>,
    #[serde(rename = "rotation_penalties")]
    pub penalties: Vec<String>,
    /// True when a legume follows a non-legume in the lookback window.
    #[serde(default)]
    pub nitrogen_fixation_bonus: bool,
}

/// Per-hectare cost split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub inputs: f64,
    pub labor: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitBreakdown {
    pub revenue: f64,
    pub costs: CostBreakdown,
    pub profit: f64,
}

/// Revenue, cost and profit estimate for one crop, per hectare.
///
/// Figures are rounded to 2 decimals; they are computed at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitResult {
    pub crop_name: String,
    /// Adjusted yield, kg/ha.
    pub expected_yield: f64,
    pub market_price_per_kg: f64,
    pub revenue: f64,
    pub input_costs: f64,
    pub labor_costs: f64,
    pub total_costs: f64,
    pub gross_profit: f64,
    pub risk_factor: f64,
    pub risk_factor_percentage: f64,
    pub risk_adjusted_profit: f64,
    pub profit_margin_percentage: f64,
    pub roi: f64,
    pub breakdown: ProfitBreakdown,
}

/// The four sustainability sub-scores, each nominally 0-25.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityBreakdown {
    pub water_score: f64,
    pub water_score_percentage: f64,
    pub soil_score: f64,
    pub soil_score_percentage: f64,
    pub carbon_score: f64,
    pub carbon_score_percentage: f64,
    pub biodiversity_score: f64,
    pub biodiversity_score_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityResult {
    pub crop_name: String,
    /// 0-100.
    pub sustainability_score: f64,
    pub breakdown: SustainabilityBreakdown,
    /// Raw reference values the sub-scores were derived from.
    pub factors: Footprint,
}

/// Weight contributions of each criterion to the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBreakdown {
    pub compatibility: f64,
    pub profit: f64,
    pub sustainability: f64,
    pub rotation: f64,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub composite_score: f64,
    pub breakdown: CompositeBreakdown,
}
