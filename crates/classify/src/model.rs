use std::path::{Path, PathBuf};
use thiserror::Error;
use tract_onnx::prelude::tract_ndarray::Array4;
use tract_onnx::prelude::*;

use crate::prediction::Prediction;
use crate::tensor::INPUT_SHAPE;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Model not found at {}", .0.display())]
    ModelUnavailable(PathBuf),
    #[error("Failed to load model from {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },
    #[error("Invalid image format or corrupted file: {0}")]
    InvalidImage(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Model returned no class probabilities")]
    EmptyOutput,
}

/// A pre-trained image classifier.
///
/// Implementations are shared read-only across requests, so `predict` takes
/// `&self` and must be deterministic for a given input.
pub trait Classifier: Send + Sync {
    /// Class probabilities for a `(1, 128, 128, 3)` input batch.
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError>;

    fn classify(&self, input: &Array4<f32>) -> Result<Prediction, ClassifyError> {
        let probabilities = self.predict(input)?;
        Prediction::from_probabilities(&probabilities).ok_or(ClassifyError::EmptyOutput)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError> {
        (**self).predict(input)
    }
}

// ── ONNX backend ──────────────────────────────────────────────────────────────

/// Erases the concrete plan type, which differs across tract releases.
type Runner = Box<dyn Fn(TVec<TValue>) -> TractResult<TVec<TValue>> + Send + Sync>;

/// ONNX export of the trained classifier, optimized once at load time.
pub struct OnnxClassifier {
    run: Runner,
}

impl OnnxClassifier {
    /// Load and optimize the model. A missing artifact is reported separately
    /// from a malformed one so startup can say which.
    pub fn load(path: &Path) -> Result<Self, ClassifyError> {
        if !path.is_file() {
            return Err(ClassifyError::ModelUnavailable(path.to_path_buf()));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact(INPUT_SHAPE).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ClassifyError::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %path.display(), "Model loaded");
        Ok(Self { run: Box::new(move |inputs: TVec<TValue>| plan.run(inputs)) })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError> {
        let tensor: Tensor = input.clone().into();
        let outputs = (self.run)(tvec!(tensor.into()))
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let output = outputs.first().ok_or(ClassifyError::EmptyOutput)?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        Ok(view.iter().copied().collect())
    }
}
