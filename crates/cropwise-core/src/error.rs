use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CropwiseError {
    #[error("failed to load crop table from {path}: {reason}")]
    CropTableLoad { path: PathBuf, reason: String },

    #[error("invalid crop table: {0}")]
    CropTableInvalid(String),

    #[error("unknown crop '{0}'")]
    UnknownCrop(String),

    #[error("predictor '{backend}' failed: {reason}")]
    Predictor { backend: String, reason: String },

    #[error("predictor '{backend}' timed out after {timeout_ms} ms")]
    PredictorTimeout { backend: String, timeout_ms: u64 },

    #[error("predictor unavailable: {0}")]
    PredictorUnavailable(String),

    #[error("failed to load model artifact from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("invalid model artifact: {0}")]
    ModelInvalid(String),

    #[error("recommendation store error: {0}")]
    Store(String),

    #[error("failed to load engine options from {path}: {reason}")]
    OptionsLoad { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
