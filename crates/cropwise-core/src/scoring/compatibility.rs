use crate::conditions::FieldConditions;
use crate::crops::schema::CropTable;
use crate::crops::Season;
use crate::scoring::outcome::{CompatibilityResult, Factor, FactorFit};
use crate::scoring::{clamp_score, round_dp, ScoreBand};
use chrono::NaiveDate;
use std::collections::BTreeMap;

const PH_TOLERANCE: f64 = 0.5;
const PH_NEAR_PENALTY: f64 = 10.0;
const PH_FAR_PENALTY: f64 = 30.0;
const PH_UNKNOWN_PENALTY: f64 = 5.0;

const TEMPERATURE_TOLERANCE: f64 = 3.0;
const TEMPERATURE_NEAR_PENALTY: f64 = 5.0;
const TEMPERATURE_FAR_PENALTY: f64 = 15.0;

const NUTRIENT_LOW_RATIO: f64 = 0.7;
const NUTRIENT_LOW_PENALTY: f64 = 5.0;
const NUTRIENT_DEFICIENT_PENALTY: f64 = 15.0;

const MOISTURE_LOW_RATIO: f64 = 0.8;
const MOISTURE_LOW_PENALTY: f64 = 5.0;
const MOISTURE_DEFICIENT_PENALTY: f64 = 10.0;

/// Penalty for any unmeasured factor other than pH.
const UNKNOWN_PENALTY: f64 = 3.0;
const SEASON_PENALTY: f64 = 20.0;

/// Position of a value relative to a `[min, max]` band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BandFit {
    Inside,
    Near,
    Outside,
}

fn check_band(value: f64, min: f64, max: f64, tolerance: f64) -> BandFit {
    if min <= value && value <= max {
        BandFit::Inside
    } else if (value - min).abs() < tolerance || (value - max).abs() < tolerance {
        BandFit::Near
    } else {
        BandFit::Outside
    }
}

/// Position of a value relative to a required minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MinimumFit {
    Sufficient,
    Low,
    Deficient,
}

fn check_minimum(value: f64, min: f64, low_ratio: f64) -> MinimumFit {
    if value >= min {
        MinimumFit::Sufficient
    } else if value >= min * low_ratio {
        MinimumFit::Low
    } else {
        MinimumFit::Deficient
    }
}

/// Scores how well field conditions match a crop's agronomic requirements.
///
/// Starts at 100 and subtracts an independent penalty per factor that misses
/// the crop's band. Unmeasured factors cost a small fixed penalty.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityScorer<'a> {
    table: &'a CropTable,
    reference_date: Option<NaiveDate>,
}

/// Accumulates penalties and reasons while checking factors.
struct Tally {
    score: f64,
    reasons: Vec<String>,
    details: BTreeMap<Factor, FactorFit>,
}

impl Tally {
    fn record(&mut self, factor: Factor, fit: FactorFit, penalty: f64, reason: Option<String>) {
        self.score -= penalty;
        self.details.insert(factor, fit);
        if let Some(reason) = reason {
            self.reasons.push(reason);
        }
    }
}

impl<'a> CompatibilityScorer<'a> {
    pub fn new(table: &'a CropTable) -> Self {
        CompatibilityScorer {
            table,
            reference_date: None,
        }
    }

    /// Pin the date used to infer the season when conditions carry none.
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Season used when the conditions do not specify one.
    pub fn current_season(&self) -> Season {
        self.reference_date
            .map(Season::for_date)
            .unwrap_or_else(Season::current)
    }

    /// Score `crop` against `conditions`.
    ///
    /// A crop missing from the table scores 0 with a single reason.
    pub fn score(&self, crop: &str, conditions: &FieldConditions) -> CompatibilityResult {
        let Some(profile) = self.table.get(crop) else {
            return CompatibilityResult {
                crop_name: crop.to_string(),
                score: 0.0,
                reasons: vec!["Crop not in database".to_string()],
                match_details: BTreeMap::new(),
            };
        };
        let req = &profile.requirements;

        let mut tally = Tally {
            score: 100.0,
            reasons: Vec::new(),
            details: BTreeMap::new(),
        };

        match conditions.ph {
            Some(ph) => match check_band(ph, req.ph_min, req.ph_max, PH_TOLERANCE) {
                BandFit::Inside => tally.record(Factor::Ph, FactorFit::Optimal, 0.0, None),
                BandFit::Near => tally.record(
                    Factor::Ph,
                    FactorFit::Acceptable,
                    PH_NEAR_PENALTY,
                    Some(format!(
                        "pH ({}) slightly outside optimal range ({}-{})",
                        ph, req.ph_min, req.ph_max
                    )),
                ),
                BandFit::Outside => tally.record(
                    Factor::Ph,
                    FactorFit::Poor,
                    PH_FAR_PENALTY,
                    Some(format!(
                        "pH ({}) outside optimal range ({}-{})",
                        ph, req.ph_min, req.ph_max
                    )),
                ),
            },
            None => tally.record(Factor::Ph, FactorFit::Unknown, PH_UNKNOWN_PENALTY, None),
        }

        let nutrients = [
            (Factor::N, "Nitrogen", conditions.n, req.n_min),
            (Factor::P, "Phosphorus", conditions.p, req.p_min),
            (Factor::K, "Potassium", conditions.k, req.k_min),
        ];
        for (factor, label, value, min) in nutrients {
            let Some(value) = value else {
                tally.record(factor, FactorFit::Unknown, UNKNOWN_PENALTY, None);
                continue;
            };
            match check_minimum(value, min, NUTRIENT_LOW_RATIO) {
                MinimumFit::Sufficient => tally.record(factor, FactorFit::Sufficient, 0.0, None),
                MinimumFit::Low => tally.record(
                    factor,
                    FactorFit::Low,
                    NUTRIENT_LOW_PENALTY,
                    Some(format!(
                        "{} ({} kg/ha) below optimal ({} kg/ha)",
                        label, value, min
                    )),
                ),
                MinimumFit::Deficient => tally.record(
                    factor,
                    FactorFit::Deficient,
                    NUTRIENT_DEFICIENT_PENALTY,
                    Some(format!(
                        "{} ({} kg/ha) significantly below optimal ({} kg/ha)",
                        label, value, min
                    )),
                ),
            }
        }

        match conditions.moisture {
            Some(moisture) => {
                let min = req.moisture_min;
                match check_minimum(moisture, min, MOISTURE_LOW_RATIO) {
                    MinimumFit::Sufficient => {
                        tally.record(Factor::Moisture, FactorFit::Sufficient, 0.0, None)
                    }
                    MinimumFit::Low => tally.record(
                        Factor::Moisture,
                        FactorFit::Low,
                        MOISTURE_LOW_PENALTY,
                        Some(format!("Moisture ({}%) below optimal ({}%)", moisture, min)),
                    ),
                    MinimumFit::Deficient => tally.record(
                        Factor::Moisture,
                        FactorFit::Deficient,
                        MOISTURE_DEFICIENT_PENALTY,
                        Some(format!(
                            "Moisture ({}%) significantly below optimal ({}%)",
                            moisture, min
                        )),
                    ),
                }
            }
            None => tally.record(Factor::Moisture, FactorFit::Unknown, UNKNOWN_PENALTY, None),
        }

        match conditions.temperature {
            Some(t) => {
                let (min, max) = (req.temperature_min, req.temperature_max);
                match check_band(t, min, max, TEMPERATURE_TOLERANCE) {
                    BandFit::Inside => {
                        tally.record(Factor::Temperature, FactorFit::Optimal, 0.0, None)
                    }
                    BandFit::Near => tally.record(
                        Factor::Temperature,
                        FactorFit::Acceptable,
                        TEMPERATURE_NEAR_PENALTY,
                        Some(format!(
                            "Temperature ({}°C) slightly outside optimal range ({}-{}°C)",
                            t, min, max
                        )),
                    ),
                    BandFit::Outside => tally.record(
                        Factor::Temperature,
                        FactorFit::Poor,
                        TEMPERATURE_FAR_PENALTY,
                        Some(format!(
                            "Temperature ({}°C) outside optimal range ({}-{}°C)",
                            t, min, max
                        )),
                    ),
                }
            }
            None => tally.record(
                Factor::Temperature,
                FactorFit::Unknown,
                UNKNOWN_PENALTY,
                None,
            ),
        }

        let season = conditions
            .season
            .unwrap_or_else(|| self.current_season());
        if req.allows_season(season) {
            tally.record(Factor::Season, FactorFit::Suitable, 0.0, None);
        } else {
            tally.record(
                Factor::Season,
                FactorFit::Unsuitable,
                SEASON_PENALTY,
                Some(format!(
                    "Current season ({}) not ideal for {}",
                    season, profile.name
                )),
            );
        }

        let score = clamp_score(tally.score);
        let headline = match ScoreBand::of(score) {
            ScoreBand::Excellent => "Excellent match for current conditions",
            ScoreBand::Good => "Good match for current conditions",
            ScoreBand::Moderate => "Moderate match - some conditions need improvement",
            ScoreBand::Poor => "Poor match - significant improvements needed",
        };
        let mut reasons = Vec::with_capacity(tally.reasons.len() + 1);
        reasons.push(headline.to_string());
        reasons.extend(tally.reasons);

        CompatibilityResult {
            crop_name: profile.name.clone(),
            score: round_dp(score, 2),
            reasons,
            match_details: tally.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::builtin::load_default;

    fn rice_conditions() -> FieldConditions {
        FieldConditions {
            ph: Some(6.2),
            n: Some(120.0),
            p: Some(25.0),
            k: Some(45.0),
            moisture: Some(65.0),
            temperature: Some(28.0),
            rainfall: Some(1100.0),
            season: Some(Season::Kharif),
            ..FieldConditions::default()
        }
    }

    #[test]
    fn test_rice_optimal_conditions() {
        let table = load_default().unwrap();
        let result = CompatibilityScorer::new(&table).score("Rice", &rice_conditions());
        assert_eq!(result.score, 100.0);
        assert_eq!(result.reasons, vec!["Excellent match for current conditions"]);
        assert_eq!(result.match_details[&Factor::Ph], FactorFit::Optimal);
        assert_eq!(result.match_details[&Factor::Season], FactorFit::Suitable);
    }

    #[test]
    fn test_exact_boundaries_score_full() {
        let table = load_default().unwrap();
        let scorer = CompatibilityScorer::new(&table);
        for crop in &table.crops {
            let req = &crop.requirements;
            for ph in [req.ph_min, req.ph_max] {
                for t in [req.temperature_min, req.temperature_max] {
                    let conditions = FieldConditions {
                        ph: Some(ph),
                        n: Some(req.n_min),
                        p: Some(req.p_min),
                        k: Some(req.k_min),
                        moisture: Some(req.moisture_min),
                        temperature: Some(t),
                        season: Some(req.seasons[0]),
                        ..FieldConditions::default()
                    };
                    let result = scorer.score(&crop.name, &conditions);
                    assert_eq!(result.score, 100.0, "{}", crop.name);
                    assert_eq!(result.reasons.len(), 1, "{}", crop.name);
                }
            }
        }
    }

    #[test]
    fn test_all_missing_conditions() {
        let table = load_default().unwrap();
        let scorer = CompatibilityScorer::new(&table);
        let empty = FieldConditions::default();
        for crop in table.crop_names() {
            let result = scorer.score(crop, &empty);
            assert!((0.0..=100.0).contains(&result.score));
            for factor in [
                Factor::Ph,
                Factor::N,
                Factor::P,
                Factor::K,
                Factor::Moisture,
                Factor::Temperature,
            ] {
                assert_eq!(result.match_details[&factor], FactorFit::Unknown, "{crop}");
            }
        }
    }

    #[test]
    fn test_all_missing_penalty_total() {
        let table = load_default().unwrap();
        // Sugarcane is year-round, so only the unknown penalties apply: 5 + 3*5.
        let result = CompatibilityScorer::new(&table).score("Sugarcane", &FieldConditions::default());
        assert_eq!(result.score, 80.0);
        assert_eq!(result.reasons, vec!["Excellent match for current conditions"]);
    }

    #[test]
    fn test_ph_tolerance_bands() {
        let table = load_default().unwrap();
        let scorer = CompatibilityScorer::new(&table);
        let mut c = rice_conditions();

        c.ph = Some(4.7);
        let near = scorer.score("Rice", &c);
        assert_eq!(near.score, 90.0);
        assert_eq!(near.match_details[&Factor::Ph], FactorFit::Acceptable);
        assert!(near.reasons[1].contains("slightly outside"));

        c.ph = Some(4.0);
        let far = scorer.score("Rice", &c);
        assert_eq!(far.score, 70.0);
        assert_eq!(far.match_details[&Factor::Ph], FactorFit::Poor);
    }

    #[test]
    fn test_nutrient_bands() {
        let table = load_default().unwrap();
        let scorer = CompatibilityScorer::new(&table);
        let mut c = rice_conditions();

        // Rice n_min 100, low threshold 70.
        c.n = Some(72.0);
        let low = scorer.score("Rice", &c);
        assert_eq!(low.score, 95.0);
        assert_eq!(low.match_details[&Factor::N], FactorFit::Low);

        c.n = Some(65.0);
        let deficient = scorer.score("Rice", &c);
        assert_eq!(deficient.score, 85.0);
        assert_eq!(deficient.match_details[&Factor::N], FactorFit::Deficient);
        assert!(deficient.reasons[1].starts_with("Nitrogen"));
    }

    #[test]
    fn test_moisture_and_temperature_bands() {
        let table = load_default().unwrap();
        let scorer = CompatibilityScorer::new(&table);
        let mut c = rice_conditions();
        c.moisture = Some(50.0);
        c.temperature = Some(37.0);
        let result = scorer.score("Rice", &c);
        assert_eq!(result.match_details[&Factor::Moisture], FactorFit::Low);
        assert_eq!(result.match_details[&Factor::Temperature], FactorFit::Acceptable);
        assert_eq!(result.score, 90.0);

        c.moisture = Some(10.0);
        c.temperature = Some(5.0);
        let result = scorer.score("Rice", &c);
        assert_eq!(result.score, 75.0);
        assert_eq!(result.reasons[0], "Good match for current conditions");
    }

    #[test]
    fn test_wrong_season() {
        let table = load_default().unwrap();
        let mut c = rice_conditions();
        c.season = Some(Season::Rabi);
        let result = CompatibilityScorer::new(&table).score("Rice", &c);
        assert_eq!(result.score, 80.0);
        assert_eq!(result.match_details[&Factor::Season], FactorFit::Unsuitable);
        assert_eq!(result.reasons[1], "Current season (rabi) not ideal for Rice");
    }

    #[test]
    fn test_season_inferred_from_reference_date() {
        let table = load_default().unwrap();
        let mut c = rice_conditions();
        c.season = None;
        let july = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        let january = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let scorer = CompatibilityScorer::new(&table);
        assert_eq!(scorer.on_date(july).score("Rice", &c).score, 100.0);
        assert_eq!(scorer.on_date(january).score("Rice", &c).score, 80.0);
    }

    #[test]
    fn test_score_clamped_at_zero() {
        let table = load_default().unwrap();
        let c = FieldConditions {
            ph: Some(1.0),
            n: Some(0.0),
            p: Some(0.0),
            k: Some(0.0),
            moisture: Some(0.0),
            temperature: Some(-20.0),
            season: Some(Season::Rabi),
            ..FieldConditions::default()
        };
        let result = CompatibilityScorer::new(&table).score("Rice", &c);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.reasons[0], "Poor match - significant improvements needed");
    }

    #[test]
    fn test_unknown_crop() {
        let table = load_default().unwrap();
        let result = CompatibilityScorer::new(&table).score("Quinoa", &rice_conditions());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.reasons, vec!["Crop not in database"]);
        assert!(result.match_details.is_empty());
    }
}
