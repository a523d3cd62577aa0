use crate::crops::schema::CropTable;
use crate::scoring::outcome::{SustainabilityBreakdown, SustainabilityResult};
use crate::scoring::{clamp_score, round_dp};

/// Maximum of each of the four sub-scores before bonuses.
const SUB_SCORE_MAX: f64 = 25.0;

/// Sustainability score from water, soil, carbon and biodiversity sub-scores.
#[derive(Debug, Clone, Copy)]
pub struct SustainabilityScorer<'a> {
    table: &'a CropTable,
}

/// Water sub-score when availability is known, by availability/usage ratio.
fn water_score_known(available: f64, usage: f64) -> f64 {
    if available >= usage * 1.2 {
        25.0
    } else if available >= usage {
        20.0
    } else if available >= usage * 0.8 {
        15.0
    } else {
        5.0
    }
}

/// Water sub-score from the crop's own usage tier.
fn water_score_by_usage(usage: f64) -> f64 {
    if usage < 500_000.0 {
        20.0
    } else if usage < 1_000_000.0 {
        15.0
    } else {
        10.0
    }
}

fn carbon_score(footprint: f64) -> f64 {
    if footprint < 1500.0 {
        25.0
    } else if footprint < 2500.0 {
        20.0
    } else if footprint < 3500.0 {
        15.0
    } else {
        10.0
    }
}

/// Maps an impact on the -100..100 scale to 0..25.
fn impact_score(impact: f64) -> f64 {
    (12.5 + impact / 2.0).clamp(0.0, SUB_SCORE_MAX)
}

fn percentage_of_max(sub_score: f64) -> f64 {
    round_dp(sub_score / SUB_SCORE_MAX * 100.0, 1)
}

impl<'a> SustainabilityScorer<'a> {
    pub fn new(table: &'a CropTable) -> Self {
        SustainabilityScorer { table }
    }

    /// Score `crop`.
    ///
    /// `water_availability` is litres per hectare, `None` when unknown.
    /// Bonuses are added after the soil and biodiversity sub-scores are
    /// capped; only the total is clamped to 0-100.
    pub fn calculate(
        &self,
        crop: &str,
        water_availability: Option<f64>,
        soil_health_bonus: f64,
        rotation_bonus: f64,
    ) -> SustainabilityResult {
        let footprint = self.table.footprint_for(crop);

        let water = match water_availability {
            Some(available) => water_score_known(available, footprint.water_usage),
            None => water_score_by_usage(footprint.water_usage),
        };
        let soil = impact_score(footprint.soil_health_impact) + soil_health_bonus;
        let carbon = carbon_score(footprint.carbon_footprint);
        let biodiversity = impact_score(footprint.biodiversity_impact) + rotation_bonus;

        let total = clamp_score(water + soil + carbon + biodiversity);

        SustainabilityResult {
            crop_name: crop.to_string(),
            sustainability_score: round_dp(total, 2),
            breakdown: SustainabilityBreakdown {
                water_score: round_dp(water, 2),
                water_score_percentage: percentage_of_max(water),
                soil_score: round_dp(soil, 2),
                soil_score_percentage: percentage_of_max(soil),
                carbon_score: round_dp(carbon, 2),
                carbon_score_percentage: percentage_of_max(carbon),
                biodiversity_score: round_dp(biodiversity, 2),
                biodiversity_score_percentage: percentage_of_max(biodiversity),
            },
            factors: footprint,
        }
    }
}
