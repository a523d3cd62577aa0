use crate::conditions::{CropHistoryEntry, FieldConditions};
use crate::crops::schema::CropTable;
use crate::error::CropwiseError;
use crate::predictor::{CropPrediction, CropPredictor, TimeoutPredictor};
use crate::reasoning::Reasoning;
use crate::scoring::rotation::DEFAULT_LOOKBACK_YEARS;
use crate::scoring::{
    round_dp, CompatibilityScorer, ProfitCalculator, ProfitResult, RecommendationRanker,
    RotationAnalyzer, RotationResult, SustainabilityScorer,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Soil-health bonus when a legume follows a non-legume.
const LEGUME_SOIL_BONUS: f64 = 5.0;
const ROTATION_BONUS_PER_BENEFIT: f64 = 5.0;
const ROTATION_BONUS_CAP: f64 = 10.0;

/// Ordering used for the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Predictor confidence or rule-based compatibility.
    #[default]
    Confidence,
    /// Weighted composite of all criteria.
    Composite,
}

/// Options controlling a recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub limit: usize,
    pub use_external_predictor: bool,
    pub lookback_years: i32,
    /// How many records the caller should persist.
    pub persist_top: usize,
    pub rank_by: RankBy,
    /// `None` or 0 disables the call deadline.
    pub predictor_timeout_ms: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            limit: 10,
            use_external_predictor: true,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            persist_top: 5,
            rank_by: RankBy::Confidence,
            predictor_timeout_ms: Some(2_000),
        }
    }
}

/// Load engine options from a JSON file. Missing fields take defaults.
pub fn load_options(path: &Path) -> Result<EngineOptions, CropwiseError> {
    let content = std::fs::read_to_string(path).map_err(|e| CropwiseError::OptionsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CropwiseError::OptionsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// One recommended crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop_name: String,
    /// 0-100.
    pub confidence_score: f64,
    /// kg/ha.
    pub expected_yield: f64,
    /// Currency per hectare.
    pub profit_margin: f64,
    /// 0-100.
    pub sustainability_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_score: Option<f64>,
    pub reasoning: Reasoning,
    #[serde(default)]
    pub ml_prediction: bool,
}

impl Recommendation {
    fn ranking_key(&self, rank_by: RankBy) -> f64 {
        match rank_by {
            RankBy::Confidence => self.confidence_score,
            RankBy::Composite => self.composite_score.unwrap_or(self.confidence_score),
        }
    }
}

/// Produces ranked crop recommendations for a field.
///
/// Tries the external predictor first when enabled and available; any
/// predictor failure falls back to rule-based scoring over the whole crop
/// table. `get_recommendations` never fails.
pub struct RecommendationEngine {
    table: CropTable,
    predictor: Arc<dyn CropPredictor>,
    /// Deadline for the whole predictor path, when configured.
    deadline: Option<TimeoutPredictor>,
    options: EngineOptions,
    reference_date: Option<NaiveDate>,
}

/// What the predictor said for one request, before validation.
type PredictorAnswer = Vec<(CropPrediction, Option<f64>)>;

/// Availability check, ranking and per-crop yields in one pass.
///
/// `Ok(None)` means the predictor reported itself unavailable.
fn query_predictor(
    predictor: &dyn CropPredictor,
    conditions: &FieldConditions,
    limit: usize,
) -> Result<Option<PredictorAnswer>, CropwiseError> {
    if !predictor.is_available() {
        return Ok(None);
    }
    let predictions = predictor.predict(conditions, limit)?;
    let mut answer = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        let predicted_yield = predictor.predict_yield(&prediction.crop_name, conditions)?;
        answer.push((prediction, predicted_yield));
    }
    Ok(Some(answer))
}

impl RecommendationEngine {
    /// Build an engine. When `options.predictor_timeout_ms` is set, the
    /// whole predictor path of a request (availability, ranking and yields)
    /// shares that one deadline.
    pub fn new(table: CropTable, predictor: Arc<dyn CropPredictor>, options: EngineOptions) -> Self {
        let deadline = match options.predictor_timeout_ms {
            Some(ms) if ms > 0 => Some(TimeoutPredictor::new(
                Arc::clone(&predictor),
                Duration::from_millis(ms),
            )),
            _ => None,
        };
        RecommendationEngine {
            table,
            predictor,
            deadline,
            options,
            reference_date: None,
        }
    }

    /// Pin the date used for season inference and the rotation window.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn table(&self) -> &CropTable {
        &self.table
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.backend_name()
    }

    /// Recommendations using the engine's configured limit and predictor flag.
    pub fn get_recommendations(
        &self,
        conditions: &FieldConditions,
        history: Option<&[CropHistoryEntry]>,
    ) -> Vec<Recommendation> {
        self.get_recommendations_with(
            conditions,
            history,
            self.options.limit,
            self.options.use_external_predictor,
        )
    }

    pub fn get_recommendations_with(
        &self,
        conditions: &FieldConditions,
        history: Option<&[CropHistoryEntry]>,
        limit: usize,
        use_external_predictor: bool,
    ) -> Vec<Recommendation> {
        if use_external_predictor {
            match self.predictor_recommendations(conditions, limit) {
                Ok(Some(records)) => {
                    tracing::info!(
                        backend = self.predictor.backend_name(),
                        count = records.len(),
                        "using external predictor"
                    );
                    return self.finish(records, limit);
                }
                Ok(None) => {
                    tracing::debug!(
                        backend = self.predictor.backend_name(),
                        "predictor unavailable; using rule-based scoring"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        backend = self.predictor.backend_name(),
                        error = %e,
                        "predictor failed; falling back to rule-based scoring"
                    );
                }
            }
        }

        let records = self.rule_based_recommendations(conditions, history);
        tracing::info!(count = records.len(), "using rule-based scoring");
        self.finish(records, limit)
    }

    fn finish(&self, mut records: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
        let rank_by = self.options.rank_by;
        // Stable: ties keep crop-table (or predictor) order.
        records.sort_by(|a, b| b.ranking_key(rank_by).total_cmp(&a.ranking_key(rank_by)));
        records.truncate(limit);
        records
    }

    fn predictor_recommendations(
        &self,
        conditions: &FieldConditions,
        limit: usize,
    ) -> Result<Option<Vec<Recommendation>>, CropwiseError> {
        let answer = match &self.deadline {
            Some(deadline) => {
                let conditions = conditions.clone();
                deadline.run_bounded(move |p| query_predictor(p, &conditions, limit))?
            }
            None => query_predictor(self.predictor.as_ref(), conditions, limit)?,
        };
        let Some(answer) = answer else {
            return Ok(None);
        };
        if answer.is_empty() {
            return Err(self.predictor_error("no predictions returned".into()));
        }
        answer
            .iter()
            .map(|(prediction, predicted_yield)| self.predictor_record(prediction, *predicted_yield))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn predictor_error(&self, reason: String) -> CropwiseError {
        CropwiseError::Predictor {
            backend: self.predictor.backend_name().to_string(),
            reason,
        }
    }

    /// Confidence and yield must be finite; they are clamped to 0-100 and
    /// non-negative respectively.
    fn predictor_record(
        &self,
        prediction: &CropPrediction,
        predicted_yield: Option<f64>,
    ) -> Result<Recommendation, CropwiseError> {
        let crop = prediction.crop_name.as_str();
        if !prediction.confidence_score.is_finite() {
            return Err(self.predictor_error(format!(
                "non-finite confidence {} for {}",
                prediction.confidence_score, crop
            )));
        }
        let confidence = prediction.confidence_score.clamp(0.0, 100.0);

        let profile = self.table.get(crop);
        let avg_yield = profile.map_or(0.0, |p| p.average_yield);
        let avg_profit = profile.map_or(0.0, |p| p.average_profit);

        let expected_yield = match predicted_yield {
            Some(y) if !y.is_finite() => {
                return Err(self.predictor_error(format!("non-finite yield {} for {}", y, crop)));
            }
            Some(y) => y.max(0.0),
            None => avg_yield * confidence / 100.0,
        };
        let profit_per_kg = avg_profit / avg_yield.max(1.0);

        Ok(Recommendation {
            crop_name: prediction.crop_name.clone(),
            confidence_score: confidence,
            expected_yield: round_dp(expected_yield, 2),
            profit_margin: round_dp(expected_yield * profit_per_kg, 2),
            sustainability_score: self.table.sustainability_baseline(crop),
            composite_score: None,
            reasoning: Reasoning::from_prediction(confidence),
            ml_prediction: true,
        })
    }

    fn rule_based_recommendations(
        &self,
        conditions: &FieldConditions,
        history: Option<&[CropHistoryEntry]>,
    ) -> Vec<Recommendation> {
        let mut compatibility = CompatibilityScorer::new(&self.table);
        let mut rotation = RotationAnalyzer::new(&self.table).with_lookback(self.options.lookback_years);
        if let Some(date) = self.reference_date {
            compatibility = compatibility.on_date(date);
            rotation = rotation.in_year(date.year());
        }
        let profit = ProfitCalculator::new(&self.table);
        let sustainability = SustainabilityScorer::new(&self.table);
        let water = conditions.water_availability();

        struct Candidate {
            record: Recommendation,
            profit: ProfitResult,
            rotation: RotationResult,
            compatibility: f64,
            sustainability: f64,
        }

        let candidates: Vec<Candidate> = self
            .table
            .crops
            .iter()
            .map(|crop| {
                let name = crop.name.as_str();
                let compat = compatibility.score(name, conditions);
                let multiplier = compat.score / 100.0;

                let rotation_result = rotation.score(name, history.unwrap_or(&[]));
                let soil_bonus = if rotation_result.nitrogen_fixation_bonus {
                    LEGUME_SOIL_BONUS
                } else {
                    0.0
                };
                let rotation_bonus = (rotation_result.benefits.len() as f64
                    * ROTATION_BONUS_PER_BENEFIT)
                    .min(ROTATION_BONUS_CAP);

                let profit_result = profit.calculate(name, crop.average_yield, multiplier, 1.0);
                let sustainability_result =
                    sustainability.calculate(name, water, soil_bonus, rotation_bonus);

                let reasoning = Reasoning::from_compatibility(&compat)
                    .with_profit(profit_result.clone())
                    .with_sustainability(sustainability_result.clone())
                    .with_rotation(history.map(|_| rotation_result.clone()));

                Candidate {
                    record: Recommendation {
                        crop_name: crop.name.clone(),
                        confidence_score: compat.score,
                        expected_yield: round_dp(crop.average_yield * multiplier, 2),
                        profit_margin: round_dp(crop.average_profit * multiplier, 2),
                        sustainability_score: crop.sustainability_score,
                        composite_score: None,
                        reasoning,
                        ml_prediction: false,
                    },
                    profit: profit_result,
                    rotation: rotation_result,
                    compatibility: compat.score,
                    sustainability: sustainability_result.sustainability_score,
                }
            })
            .collect();

        let best_profit = candidates
            .iter()
            .map(|c| c.profit.risk_adjusted_profit)
            .fold(f64::NEG_INFINITY, f64::max);
        let ranker = RecommendationRanker;

        candidates
            .into_iter()
            .map(|c| {
                let profit_score = ranker.normalize_profit(c.profit.risk_adjusted_profit, Some(best_profit));
                let composite = ranker.composite(
                    c.compatibility,
                    profit_score,
                    c.sustainability,
                    c.rotation.rotation_score,
                    c.profit.risk_factor,
                );
                Recommendation {
                    composite_score: Some(composite.composite_score),
                    ..c.record
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("table", &self.table.name)
            .field("predictor", &self.predictor.backend_name())
            .field("deadline", &self.deadline.as_ref().map(TimeoutPredictor::timeout))
            .field("options", &self.options)
            .field("reference_date", &self.reference_date)
            .finish()
    }
}
