use crate::conditions::FieldConditions;
use crate::error::CropwiseError;
use crate::predictor::features::FeatureSet;
use crate::predictor::{CropPrediction, CropPredictor};
use crate::scoring::round_dp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Upper bound on predicted yields, kg/ha.
pub const MAX_PREDICTED_YIELD: f64 = 200_000.0;

/// Standardisation applied to the feature vector before scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Softmax weights for one crop class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassWeights {
    pub crop_name: String,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

/// Linear yield regressor for one crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldRegressor {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

/// On-disk model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub name: Option<String>,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<FeatureScaler>,
    pub classes: Vec<ClassWeights>,
    /// Regressors use `yield_feature_names`; the crop's class index is
    /// available to them as the `crop_encoded` feature.
    #[serde(default)]
    pub yield_feature_names: Vec<String>,
    #[serde(default)]
    pub yield_models: BTreeMap<String, YieldRegressor>,
}

/// Predictor backed by a linear softmax classifier and per-crop
/// linear yield regressors.
#[derive(Debug, Clone)]
pub struct LinearModelPredictor {
    name: String,
    artifact: ModelArtifact,
}

fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

fn validate_artifact(artifact: &ModelArtifact) -> Result<(), CropwiseError> {
    let width = artifact.feature_names.len();
    if width == 0 {
        return Err(CropwiseError::ModelInvalid("no feature names".into()));
    }
    if artifact.classes.is_empty() {
        return Err(CropwiseError::ModelInvalid("no crop classes".into()));
    }
    if let Some(scaler) = &artifact.scaler {
        if scaler.mean.len() != width || scaler.scale.len() != width {
            return Err(CropwiseError::ModelInvalid(format!(
                "scaler has {}/{} entries for {} features",
                scaler.mean.len(),
                scaler.scale.len(),
                width
            )));
        }
        if scaler.scale.iter().any(|s| *s == 0.0) {
            return Err(CropwiseError::ModelInvalid("scaler has a zero scale".into()));
        }
    }
    for class in &artifact.classes {
        if class.weights.len() != width {
            return Err(CropwiseError::ModelInvalid(format!(
                "class '{}' has {} weights, expected {}",
                class.crop_name,
                class.weights.len(),
                width
            )));
        }
    }
    let yield_width = if artifact.yield_feature_names.is_empty() {
        width
    } else {
        artifact.yield_feature_names.len()
    };
    for (crop, regressor) in &artifact.yield_models {
        if regressor.weights.len() != yield_width {
            return Err(CropwiseError::ModelInvalid(format!(
                "yield model '{}' has {} weights, expected {}",
                crop,
                regressor.weights.len(),
                yield_width
            )));
        }
    }
    Ok(())
}

impl LinearModelPredictor {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, CropwiseError> {
        validate_artifact(&artifact)?;
        let name = artifact
            .name
            .clone()
            .unwrap_or_else(|| "linear-model".to_string());
        Ok(LinearModelPredictor { name, artifact })
    }

    pub fn parse_str(json: &str) -> Result<Self, CropwiseError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Load and validate an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CropwiseError> {
        let content = std::fs::read_to_string(path).map_err(|e| CropwiseError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&content).map_err(|e| CropwiseError::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::from_artifact(artifact)
    }

    pub fn crop_names(&self) -> impl Iterator<Item = &str> {
        self.artifact.classes.iter().map(|c| c.crop_name.as_str())
    }

    fn scaled_features(&self, features: &FeatureSet) -> Vec<f64> {
        let raw = features.to_vector(&self.artifact.feature_names, None);
        match &self.artifact.scaler {
            Some(scaler) => raw
                .iter()
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect(),
            None => raw,
        }
    }

    fn crop_code(&self, crop_name: &str) -> Option<f64> {
        self.artifact
            .classes
            .iter()
            .position(|c| c.crop_name == crop_name)
            .map(|i| i as f64)
    }
}

impl CropPredictor for LinearModelPredictor {
    fn is_available(&self) -> bool {
        true
    }

    fn predict(
        &self,
        conditions: &FieldConditions,
        limit: usize,
    ) -> Result<Vec<CropPrediction>, CropwiseError> {
        let features = self.scaled_features(&FeatureSet::from_conditions(conditions));
        let logits: Vec<f64> = self
            .artifact
            .classes
            .iter()
            .map(|c| dot(&c.weights, &features) + c.bias)
            .collect();
        let probabilities = softmax(&logits);
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(CropwiseError::Predictor {
                backend: self.name.clone(),
                reason: "non-finite class probability".into(),
            });
        }

        let mut predictions: Vec<CropPrediction> = self
            .artifact
            .classes
            .iter()
            .zip(probabilities)
            .map(|(class, p)| CropPrediction {
                crop_name: class.crop_name.clone(),
                confidence_score: round_dp(p * 100.0, 2),
            })
            .collect();
        predictions.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));
        predictions.truncate(limit);
        Ok(predictions)
    }

    fn predict_yield(
        &self,
        crop_name: &str,
        conditions: &FieldConditions,
    ) -> Result<Option<f64>, CropwiseError> {
        let Some(regressor) = self.artifact.yield_models.get(crop_name) else {
            return Ok(None);
        };
        let names = if self.artifact.yield_feature_names.is_empty() {
            &self.artifact.feature_names
        } else {
            &self.artifact.yield_feature_names
        };
        let features =
            FeatureSet::from_conditions(conditions).to_vector(names, self.crop_code(crop_name));
        let raw = dot(&regressor.weights, &features) + regressor.intercept;
        if !raw.is_finite() {
            return Err(CropwiseError::Predictor {
                backend: self.name.clone(),
                reason: format!("non-finite yield for {}", crop_name),
            });
        }
        Ok(Some(round_dp(raw.clamp(0.0, MAX_PREDICTED_YIELD), 2)))
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}
