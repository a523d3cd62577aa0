pub mod conditions;
pub mod crops;
pub mod engine;
pub mod error;
pub mod predictor;
pub mod reasoning;
pub mod scoring;
pub mod store;

use conditions::{CropHistoryEntry, FieldConditions, FieldRecord, SoilReading, WeatherObservation};
use engine::{Recommendation, RecommendationEngine};
use error::CropwiseError;
use store::{RecommendationStore, UpsertOutcome};

pub use engine::{EngineOptions, RankBy};

/// Main API entry point: recommend crops for one field.
///
/// Conditions are assembled from the field record, its latest soil reading
/// and the latest weather observation; any of them may be partial.
pub fn recommend_for_field(
    engine: &RecommendationEngine,
    field: &FieldRecord,
    soil: Option<&SoilReading>,
    weather: Option<&WeatherObservation>,
    history: Option<&[CropHistoryEntry]>,
) -> Vec<Recommendation> {
    let conditions = FieldConditions::assemble(field, soil, weather);
    engine.get_recommendations(&conditions, history)
}

/// Recommend for `conditions` and persist the top records for the field.
///
/// The number persisted comes from the engine's `persist_top` option.
pub fn recommend_and_persist(
    engine: &RecommendationEngine,
    store: &dyn RecommendationStore,
    user_id: &str,
    field_id: &str,
    conditions: &FieldConditions,
    history: Option<&[CropHistoryEntry]>,
) -> Result<(Vec<Recommendation>, Vec<(String, UpsertOutcome)>), CropwiseError> {
    let recommendations = engine.get_recommendations(conditions, history);
    let outcomes = store::persist_top(
        store,
        user_id,
        field_id,
        &recommendations,
        engine.options().persist_top,
    )?;
    tracing::info!(
        user = user_id,
        field = field_id,
        persisted = outcomes.len(),
        "recommendations saved"
    );
    Ok((recommendations, outcomes))
}
