use crate::conditions::CropHistoryEntry;
use crate::crops::schema::CropTable;
use crate::crops::CropFamily;
use crate::scoring::outcome::RotationResult;
use crate::scoring::{clamp_score, round_dp, ScoreBand};
use chrono::{Datelike, Local};

/// Default number of years of history considered.
pub const DEFAULT_LOOKBACK_YEARS: i32 = 3;

const REPEAT_PENALTY_PER_OCCURRENCE: f64 = 25.0;
const REPEAT_PENALTY_CAP: f64 = 50.0;
const INCOMPATIBLE_PENALTY: f64 = 15.0;
const COMPATIBLE_BONUS: f64 = 10.0;
const LEGUME_BONUS: f64 = 5.0;

/// Scores a crop against a field's recent planting history.
///
/// No usable history is neutral (100), never a bonus or a penalty.
#[derive(Debug, Clone, Copy)]
pub struct RotationAnalyzer<'a> {
    table: &'a CropTable,
    lookback_years: i32,
    current_year: Option<i32>,
}

impl<'a> RotationAnalyzer<'a> {
    pub fn new(table: &'a CropTable) -> Self {
        RotationAnalyzer {
            table,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            current_year: None,
        }
    }

    pub fn with_lookback(mut self, years: i32) -> Self {
        self.lookback_years = years;
        self
    }

    /// Pin the year the lookback window is measured from.
    pub fn in_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    fn current_year(&self) -> i32 {
        self.current_year
            .unwrap_or_else(|| Local::now().date_naive().year())
    }

    pub fn score(&self, crop: &str, history: &[CropHistoryEntry]) -> RotationResult {
        if history.is_empty() {
            return neutral(crop, "No crop history - rotation score neutral");
        }

        // Entries without a crop name or year are skipped, not fatal.
        let earliest = self.current_year() - self.lookback_years;
        let recent: Vec<&str> = history
            .iter()
            .filter_map(CropHistoryEntry::planting)
            .filter(|(_, year)| *year >= earliest)
            .map(|(name, _)| name)
            .collect();

        if recent.is_empty() {
            return neutral(crop, "No recent crop history - rotation score neutral");
        }

        let mut score = 100.0;
        let mut reasons = Vec::new();
        let mut benefits = Vec::new();
        let mut penalties = Vec::new();

        let repeats = recent.iter().filter(|prev| **prev == crop).count();
        if repeats > 0 {
            let penalty = (repeats as f64 * REPEAT_PENALTY_PER_OCCURRENCE).min(REPEAT_PENALTY_CAP);
            score -= penalty;
            penalties.push(format!(
                "Crop {} was grown {} time(s) in last {} years",
                crop, repeats, self.lookback_years
            ));
            reasons.push(format!(
                "Crop rotation: {} grown recently - {}% penalty",
                crop, penalty
            ));
        }

        let incompatible = self.table.incompatible_predecessors(crop);
        for prev in recent.iter().filter(|p| incompatible.iter().any(|i| i == *p)) {
            score -= INCOMPATIBLE_PENALTY;
            penalties.push(format!("Incompatible crop {} grown recently", prev));
            reasons.push(format!(
                "Crop rotation: {} is incompatible with {}",
                prev, crop
            ));
        }

        let compatible = self.table.compatible_predecessors(crop);
        for prev in recent.iter().filter(|p| compatible.iter().any(|c| c == *p)) {
            score += COMPATIBLE_BONUS;
            benefits.push(format!("Good rotation: {} → {}", prev, crop));
            reasons.push(format!("Crop rotation: Good rotation from {}", prev));
        }

        // Any non-legume in the window counts, not just the latest planting.
        let mut nitrogen_fixation_bonus = false;
        if self.table.family_of(crop) == CropFamily::Legume
            && recent
                .iter()
                .any(|prev| self.table.family_of(prev) != CropFamily::Legume)
        {
            score += LEGUME_BONUS;
            nitrogen_fixation_bonus = true;
            benefits.push("Legume crop after non-legume improves soil nitrogen".to_string());
            reasons.push("Crop rotation: Legume crop benefits soil health".to_string());
        }

        let score = clamp_score(score);
        let headline = match ScoreBand::of(score) {
            ScoreBand::Excellent => "Excellent crop rotation pattern",
            ScoreBand::Good => "Good crop rotation pattern",
            ScoreBand::Moderate => "Moderate crop rotation - some improvements recommended",
            ScoreBand::Poor => "Poor crop rotation - significant improvements needed",
        };
        reasons.insert(0, headline.to_string());

        RotationResult {
            crop_name: crop.to_string(),
            rotation_score: round_dp(score, 2),
            reasons,
            benefits,
            penalties,
            nitrogen_fixation_bonus,
        }
    }
}

fn neutral(crop: &str, reason: &str) -> RotationResult {
    RotationResult {
        crop_name: crop.to_string(),
        rotation_score: 100.0,
        reasons: vec![reason.to_string()],
        benefits: Vec::new(),
        penalties: Vec::new(),
        nitrogen_fixation_bonus: false,
    }
}
