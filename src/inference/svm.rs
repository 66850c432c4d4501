//! Support vector classifier loaded from a JSON artifact.
//!
//! The artifact holds one binary decision function per class pair
//! (one-vs-one). Each machine votes; the class with most votes wins.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::error::ModelError;

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelType {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = (γ * x · y + r)^d
    Poly {
        gamma: f64,
        #[serde(default)]
        coef0: f64,
        degree: i32,
    },
    /// K(x, y) = exp(-γ * ||x - y||²)
    Rbf { gamma: f64 },
    /// K(x, y) = tanh(γ * x · y + r)
    Sigmoid {
        gamma: f64,
        #[serde(default)]
        coef0: f64,
    },
}

impl KernelType {
    /// Kernel values between every support vector (row) and `x`.
    fn evaluate(&self, support_vectors: ArrayView2<f64>, x: ArrayView1<f64>) -> Array1<f64> {
        match *self {
            KernelType::Linear => support_vectors.dot(&x),
            KernelType::Poly { gamma, coef0, degree } => support_vectors
                .dot(&x)
                .mapv(|d| (gamma * d + coef0).powi(degree)),
            KernelType::Rbf { gamma } => support_vectors
                .rows()
                .into_iter()
                .map(|sv| {
                    let diff = &sv - &x;
                    (-gamma * diff.dot(&diff)).exp()
                })
                .collect(),
            KernelType::Sigmoid { gamma, coef0 } => support_vectors
                .dot(&x)
                .mapv(|d| (gamma * d + coef0).tanh()),
        }
    }

    fn params(&self) -> Vec<f64> {
        match *self {
            KernelType::Linear => vec![],
            KernelType::Poly { gamma, coef0, degree } => vec![gamma, coef0, degree as f64],
            KernelType::Rbf { gamma } => vec![gamma],
            KernelType::Sigmoid { gamma, coef0 } => vec![gamma, coef0],
        }
    }
}

/// On-disk layout of the artifact.
#[derive(Debug, Deserialize)]
struct SvmArtifact {
    n_features: usize,
    classes: Vec<i64>,
    kernel: KernelType,
    #[serde(default)]
    scaler: Option<ScalerArtifact>,
    machines: Vec<MachineArtifact>,
}

#[derive(Debug, Deserialize)]
struct ScalerArtifact {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct MachineArtifact {
    positive: i64,
    negative: i64,
    support_vectors: Vec<Vec<f64>>,
    coefficients: Vec<f64>,
    intercept: f64,
}

#[derive(Debug, Clone)]
struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

/// A binary decision function `f(x) = Σ αᵢ K(svᵢ, x) + b`.
#[derive(Debug, Clone)]
struct BinaryMachine {
    /// Index into `classes` of the label chosen when `f(x) > 0`.
    positive: usize,
    negative: usize,
    support_vectors: Array2<f64>,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl BinaryMachine {
    fn decision(&self, kernel: &KernelType, x: ArrayView1<f64>) -> f64 {
        kernel.evaluate(self.support_vectors.view(), x).dot(&self.coefficients) + self.intercept
    }
}

/// Support Vector Classifier
#[derive(Debug, Clone)]
pub struct SvmClassifier {
    n_features: usize,
    classes: Vec<i64>,
    kernel: KernelType,
    scaler: Option<StandardScaler>,
    machines: Vec<BinaryMachine>,
}

impl SvmClassifier {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let artifact: SvmArtifact = serde_json::from_str(raw)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: SvmArtifact) -> Result<Self, ModelError> {
        let n = artifact.n_features;
        if n == 0 {
            return invalid("n_features must be at least 1");
        }
        if artifact.classes.is_empty() {
            return invalid("classes must not be empty");
        }
        if artifact.machines.is_empty() {
            return invalid("at least one machine is required");
        }
        if artifact.kernel.params().iter().any(|p| !p.is_finite()) {
            return invalid("kernel parameters must be finite");
        }

        let scaler = match artifact.scaler {
            None => None,
            Some(s) => {
                if s.mean.len() != n || s.scale.len() != n {
                    return invalid(format!("scaler vectors must have {} entries", n));
                }
                if s.mean.iter().chain(&s.scale).any(|v| !v.is_finite()) {
                    return invalid("scaler values must be finite");
                }
                if s.scale.iter().any(|&v| v == 0.0) {
                    return invalid("scaler scale entries must be non-zero");
                }
                Some(StandardScaler {
                    mean: Array1::from(s.mean),
                    scale: Array1::from(s.scale),
                })
            }
        };

        let class_index = |label: i64, m: usize| {
            artifact
                .classes
                .iter()
                .position(|&c| c == label)
                .ok_or_else(|| {
                    ModelError::Invalid(format!("machine {} refers to unknown class {}", m, label))
                })
        };

        let mut machines = Vec::with_capacity(artifact.machines.len());
        for (m, machine) in artifact.machines.into_iter().enumerate() {
            let n_sv = machine.support_vectors.len();
            if n_sv == 0 {
                return invalid(format!("machine {} has no support vectors", m));
            }
            if machine.coefficients.len() != n_sv {
                return invalid(format!(
                    "machine {} has {} coefficients for {} support vectors",
                    m,
                    machine.coefficients.len(),
                    n_sv
                ));
            }
            if let Some(row) = machine.support_vectors.iter().position(|sv| sv.len() != n) {
                return invalid(format!(
                    "machine {} support vector {} does not have {} features",
                    m, row, n
                ));
            }

            let flat: Vec<f64> = machine.support_vectors.into_iter().flatten().collect();
            if flat
                .iter()
                .chain(&machine.coefficients)
                .chain(std::iter::once(&machine.intercept))
                .any(|v| !v.is_finite())
            {
                return invalid(format!("machine {} contains non-finite values", m));
            }
            let support_vectors = Array2::from_shape_vec((n_sv, n), flat)
                .map_err(|e| ModelError::Invalid(e.to_string()))?;

            machines.push(BinaryMachine {
                positive: class_index(machine.positive, m)?,
                negative: class_index(machine.negative, m)?,
                support_vectors,
                coefficients: Array1::from(machine.coefficients),
                intercept: machine.intercept,
            });
        }

        Ok(Self {
            n_features: n,
            classes: artifact.classes,
            kernel: artifact.kernel,
            scaler,
            machines,
        })
    }

    fn prepare(&self, features: &[f64]) -> Array1<f64> {
        let x = Array1::from(features.to_vec());
        match &self.scaler {
            Some(scaler) => (x - &scaler.mean) / &scaler.scale,
            None => x,
        }
    }

    /// Raw decision values, one per machine.
    fn decision_function(&self, features: &[f64]) -> Vec<f64> {
        let x = self.prepare(features);
        self.machines
            .iter()
            .map(|machine| machine.decision(&self.kernel, x.view()))
            .collect()
    }
}

impl Classifier for SvmClassifier {
    fn format(&self) -> &'static str {
        "svm"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> Option<&[i64]> {
        Some(&self.classes)
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let mut votes = vec![0usize; self.classes.len()];
        for (machine, value) in self.machines.iter().zip(self.decision_function(features)) {
            if !value.is_finite() {
                return Err(ModelError::Invalid(format!(
                    "decision function produced {}",
                    value
                )));
            }
            let winner = if value > 0.0 { machine.positive } else { machine.negative };
            votes[winner] += 1;
        }

        // strict comparison: ties go to the class listed first
        let mut best = 0;
        for (i, &count) in votes.iter().enumerate().skip(1) {
            if count > votes[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T, ModelError> {
    Err(ModelError::Invalid(msg.into()))
}
