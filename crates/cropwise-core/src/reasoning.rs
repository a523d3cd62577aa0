use crate::scoring::outcome::{
    CompatibilityResult, Factor, FactorFit, ProfitResult, RotationResult, SustainabilityResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a crop was recommended, as persisted alongside the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reasoning {
    pub reasons: Vec<String>,
    #[serde(default)]
    pub match_details: BTreeMap<Factor, FactorFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_details: Option<ProfitResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability_details: Option<SustainabilityResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_analysis: Option<RotationResult>,
    /// Set when the record came from the external predictor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ml_prediction: bool,
}

impl Reasoning {
    pub fn from_compatibility(result: &CompatibilityResult) -> Self {
        Reasoning {
            reasons: result.reasons.clone(),
            match_details: result.match_details.clone(),
            ..Reasoning::default()
        }
    }

    /// Reasoning for a predictor-sourced record.
    pub fn from_prediction(confidence: f64) -> Self {
        Reasoning {
            reasons: vec![format!("Model prediction with {:.1}% confidence", confidence)],
            ml_prediction: true,
            ..Reasoning::default()
        }
    }

    pub fn with_profit(mut self, profit: ProfitResult) -> Self {
        self.profit_details = Some(profit);
        self
    }

    pub fn with_sustainability(mut self, sustainability: SustainabilityResult) -> Self {
        self.sustainability_details = Some(sustainability);
        self
    }

    pub fn with_rotation(mut self, rotation: Option<RotationResult>) -> Self {
        self.rotation_analysis = rotation;
        self
    }

    pub fn headline(&self) -> Option<&str> {
        self.reasons.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_sections_omitted() {
        let reasoning = Reasoning::from_prediction(87.456);
        let json = serde_json::to_value(&reasoning).unwrap();
        assert_eq!(json["reasons"][0], "Model prediction with 87.5% confidence");
        assert!(json.get("profit_details").is_none());
        assert!(json.get("rotation_analysis").is_none());
        assert_eq!(json["ml_prediction"], true);
    }

    #[test]
    fn test_match_details_keys_are_snake_case() {
        let mut details = BTreeMap::new();
        details.insert(Factor::Ph, FactorFit::Optimal);
        details.insert(Factor::Season, FactorFit::Unsuitable);
        let result = CompatibilityResult {
            crop_name: "Rice".into(),
            score: 80.0,
            reasons: vec!["Excellent match for current conditions".into()],
            match_details: details,
        };
        let reasoning = Reasoning::from_compatibility(&result);
        let json = serde_json::to_value(&reasoning).unwrap();
        assert_eq!(json["match_details"]["ph"], "optimal");
        assert_eq!(json["match_details"]["season"], "unsuitable");
        assert!(json.get("ml_prediction").is_none());
        assert_eq!(reasoning.headline(), Some("Excellent match for current conditions"));
    }
}
