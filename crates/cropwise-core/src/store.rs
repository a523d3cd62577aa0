//! Persistence of the top recommendations per field.
//!
//! Rows are keyed by (user, field, crop). Saving a recommendation for a key
//! that already has a row updates that row in place instead of adding a
//! second one.

use crate::engine::Recommendation;
use crate::error::CropwiseError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecommendationKey {
    pub user_id: String,
    pub field_id: String,
    pub crop_name: String,
}

/// A persisted recommendation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecommendation {
    pub key: RecommendationKey,
    pub confidence_score: f64,
    /// kg/ha, 2 dp.
    pub expected_yield: Decimal,
    /// Currency per hectare, 2 dp.
    pub profit_margin: Decimal,
    pub sustainability_score: f64,
    pub reasoning: serde_json::Value,
    /// Incremented on every update; 1 for a fresh insert.
    pub revision: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Storage backend for recommendation rows.
pub trait RecommendationStore {
    /// Most recent row for `key`, if any.
    fn find_latest(
        &self,
        key: &RecommendationKey,
    ) -> Result<Option<StoredRecommendation>, CropwiseError>;

    /// Write `row`, replacing any row with the same key.
    fn save(&self, row: StoredRecommendation) -> Result<(), CropwiseError>;
}

fn to_decimal(value: f64, column: &str) -> Result<Decimal, CropwiseError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| CropwiseError::Store(format!("{} is not representable: {}", column, value)))
}

/// Upsert the first `top_k` recommendations for a user's field.
///
/// Returns one `(crop, outcome)` pair per persisted record, in list order.
pub fn persist_top(
    store: &dyn RecommendationStore,
    user_id: &str,
    field_id: &str,
    recommendations: &[Recommendation],
    top_k: usize,
) -> Result<Vec<(String, UpsertOutcome)>, CropwiseError> {
    let mut outcomes = Vec::new();
    for rec in recommendations.iter().take(top_k) {
        let key = RecommendationKey {
            user_id: user_id.to_string(),
            field_id: field_id.to_string(),
            crop_name: rec.crop_name.clone(),
        };
        let expected_yield = to_decimal(rec.expected_yield, "expected_yield")?;
        let profit_margin = to_decimal(rec.profit_margin, "profit_margin")?;
        let reasoning = serde_json::to_value(&rec.reasoning)?;

        let (row, outcome) = match store.find_latest(&key)? {
            Some(existing) => (
                StoredRecommendation {
                    confidence_score: rec.confidence_score,
                    expected_yield,
                    profit_margin,
                    sustainability_score: rec.sustainability_score,
                    reasoning,
                    revision: existing.revision + 1,
                    key,
                },
                UpsertOutcome::Updated,
            ),
            None => (
                StoredRecommendation {
                    key,
                    confidence_score: rec.confidence_score,
                    expected_yield,
                    profit_margin,
                    sustainability_score: rec.sustainability_score,
                    reasoning,
                    revision: 1,
                },
                UpsertOutcome::Inserted,
            ),
        };
        store.save(row)?;
        tracing::debug!(crop = %rec.crop_name, ?outcome, "recommendation persisted");
        outcomes.push((rec.crop_name.clone(), outcome));
    }
    Ok(outcomes)
}

/// In-process store backed by a `BTreeMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<RecommendationKey, StoredRecommendation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows in key order.
    pub fn rows(&self) -> Result<Vec<StoredRecommendation>, CropwiseError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| CropwiseError::Store("store lock poisoned".into()))?;
        Ok(rows.values().cloned().collect())
    }
}

impl RecommendationStore for MemoryStore {
    fn find_latest(
        &self,
        key: &RecommendationKey,
    ) -> Result<Option<StoredRecommendation>, CropwiseError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| CropwiseError::Store("store lock poisoned".into()))?;
        Ok(rows.get(key).cloned())
    }

    fn save(&self, row: StoredRecommendation) -> Result<(), CropwiseError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| CropwiseError::Store("store lock poisoned".into()))?;
        rows.insert(row.key.clone(), row);
        Ok(())
    }
}
