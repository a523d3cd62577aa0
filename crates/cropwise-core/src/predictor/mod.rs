pub mod features;
pub mod lazy;
pub mod linear;
pub mod timeout;

use crate::conditions::FieldConditions;
use crate::error::CropwiseError;
use serde::{Deserialize, Serialize};

pub use lazy::LazyPredictor;
pub use linear::LinearModelPredictor;
pub use timeout::TimeoutPredictor;

/// One crop suggested by an external predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPrediction {
    pub crop_name: String,
    /// 0-100.
    pub confidence_score: f64,
}

/// Trait for alternate scoring backends (e.g. a trained model).
///
/// The engine only calls `predict`/`predict_yield` when `is_available()`
/// is true, and treats any error as a reason to use rule-based scoring.
pub trait CropPredictor: Send + Sync {
    /// Whether the backend can serve predictions right now.
    fn is_available(&self) -> bool;

    /// Crops ranked by confidence, highest first, at most `limit`.
    fn predict(
        &self,
        conditions: &FieldConditions,
        limit: usize,
    ) -> Result<Vec<CropPrediction>, CropwiseError>;

    /// Predicted yield in kg/ha, `None` if the backend has no estimate.
    fn predict_yield(
        &self,
        crop_name: &str,
        conditions: &FieldConditions,
    ) -> Result<Option<f64>, CropwiseError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// A predictor that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPredictor;

impl CropPredictor for NullPredictor {
    fn is_available(&self) -> bool {
        false
    }

    fn predict(
        &self,
        _conditions: &FieldConditions,
        _limit: usize,
    ) -> Result<Vec<CropPrediction>, CropwiseError> {
        Err(CropwiseError::PredictorUnavailable(
            "no predictor configured".into(),
        ))
    }

    fn predict_yield(
        &self,
        _crop_name: &str,
        _conditions: &FieldConditions,
    ) -> Result<Option<f64>, CropwiseError> {
        Ok(None)
    }

    fn backend_name(&self) -> &str {
        "none"
    }
}
