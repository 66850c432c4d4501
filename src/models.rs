use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of `POST /predict`. Keys other than `features` are ignored.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredictionRequest {
    pub features: Vec<f64>,
}

/// A feature vector that passed validation: every value is a finite `f64`.
///
/// Its length is not checked here; only the loaded model knows how many
/// features it was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<PredictionRequest> for FeatureVector {
    type Error = ApiError;

    fn try_from(req: PredictionRequest) -> Result<Self, Self::Error> {
        if let Some((i, v)) = req.features.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ApiError::BadRequest(format!(
                "features[{}] is not a finite number (value: {})",
                i, v
            )));
        }
        Ok(FeatureVector(req.features))
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        FeatureVector(values)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub prediction: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse { error: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelInfo {
    pub format: String,
    pub path: String,
    pub n_features: usize,
    pub classes: Option<Vec<i64>>,
}
