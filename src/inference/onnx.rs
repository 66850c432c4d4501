use std::path::Path;

use tract_onnx::prelude::*;

use super::Classifier;
use crate::error::ModelError;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX graph run with tract. Input 0 is pinned to `f32[1, n_features]`;
/// the first element of output 0 is the label, cast to `i64`.
pub struct OnnxClassifier {
    model: OnnxPlan,
    n_features: usize,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(model_path: P, n_features: usize) -> Result<Self, ModelError> {
        let model = Self::optimize(model_path.as_ref(), n_features)
            .map_err(|e| ModelError::Onnx(format!("{:#}", e)))?;
        Ok(Self { model, n_features })
    }

    fn optimize(model_path: &Path, n_features: usize) -> TractResult<OnnxPlan> {
        tract_onnx::onnx()
            .model_for_path(model_path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, n_features)),
            )?
            .into_optimized()?
            .into_runnable()
    }

    fn run(&self, features: &[f32]) -> TractResult<i64> {
        let input_tensor = Tensor::from_shape(&[1, self.n_features], features)?;
        let outputs = self.model.run(tvec!(input_tensor.into()))?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no outputs"))?;
        let labels = output.cast_to::<i64>()?;
        labels
            .as_slice::<i64>()?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("model produced an empty label tensor"))
    }
}

impl Classifier for OnnxClassifier {
    fn format(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let input = narrow(features)?;
        self.run(&input).map_err(|e| ModelError::Onnx(format!("{:#}", e)))
    }
}

/// The graph input is `f32`; values beyond its range cannot be represented.
fn narrow(features: &[f64]) -> Result<Vec<f32>, ModelError> {
    features
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let narrowed = value as f32;
            if narrowed.is_finite() {
                Ok(narrowed)
            } else {
                Err(ModelError::InputOutOfRange { index, value })
            }
        })
        .collect()
}
