//! Model loading and the prediction capability shared by all requests.

mod onnx;
mod svm;

pub use onnx::OnnxClassifier;
pub use svm::{KernelType, SvmClassifier};

use std::path::{Path, PathBuf};

use log::info;

use crate::error::ModelError;
use crate::models::{FeatureVector, ModelInfo};

/// A pre-trained classifier. Implementations are immutable once loaded, so a
/// single instance is shared read-only across all worker threads.
pub trait Classifier: Send + Sync {
    /// Short name of the artifact format, reported by `/model-info`.
    fn format(&self) -> &'static str;

    /// Number of features the model was trained on.
    fn n_features(&self) -> usize;

    /// Known class labels, if the artifact lists them.
    fn classes(&self) -> Option<&[i64]> {
        None
    }

    /// Classify one sample. Callers pass exactly `n_features()` values;
    /// `ModelInference::predict` checks this before dispatching.
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError>;
}

/// The model artifact loaded at startup together with where it came from.
pub struct ModelInference {
    path: PathBuf,
    classifier: Box<dyn Classifier>,
}

impl ModelInference {
    /// Load an artifact, picking the backend from the file extension.
    ///
    /// `expected_features` is required for `.onnx` files and, when given,
    /// must agree with what a `.json` artifact declares.
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        expected_features: Option<usize>,
    ) -> Result<Self, ModelError> {
        let path = model_path.as_ref();
        std::fs::metadata(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let classifier: Box<dyn Classifier> = match extension.as_deref() {
            Some("json") => {
                let svm = SvmClassifier::from_path(path)?;
                if let Some(expected) = expected_features {
                    if expected != svm.n_features() {
                        return Err(ModelError::Invalid(format!(
                            "artifact declares {} features but MODEL_FEATURES is {}",
                            svm.n_features(),
                            expected
                        )));
                    }
                }
                Box::new(svm)
            }
            Some("onnx") => {
                let n_features = expected_features.ok_or_else(|| {
                    ModelError::Invalid("MODEL_FEATURES must be set for ONNX models".to_string())
                })?;
                Box::new(OnnxClassifier::load(path, n_features)?)
            }
            _ => return Err(ModelError::UnsupportedFormat(path.display().to_string())),
        };

        info!(
            "Loaded {} model from {} ({} features)",
            classifier.format(),
            path.display(),
            classifier.n_features()
        );
        Ok(Self::from_classifier(path, classifier))
    }

    pub fn from_classifier<P: Into<PathBuf>>(path: P, classifier: Box<dyn Classifier>) -> Self {
        Self { path: path.into(), classifier }
    }

    /// Check the vector width, then run the classifier on a single row.
    pub fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        let expected = self.classifier.n_features();
        if features.len() != expected {
            return Err(ModelError::DimensionMismatch { expected, actual: features.len() });
        }
        self.classifier.predict(features.as_slice())
    }

    pub fn get_model_info(&self) -> ModelInfo {
        ModelInfo {
            format: self.classifier.format().to_string(),
            path: self.path.display().to_string(),
            n_features: self.classifier.n_features(),
            classes: self.classifier.classes().map(|c| c.to_vec()),
        }
    }
}
