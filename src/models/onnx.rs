//! ONNX-backed gradient-boosted tree classifier.
//!
//! The model is trained offline (XGBoost exported to ONNX) and loaded here
//! as an opaque artifact. Loading happens once at startup; inference runs
//! a session over a `[batch, features]` f32 tensor and reads the class
//! label output, falling back to arg-max over probabilities when the
//! export carries no label tensor.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::ValueType;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::models::Classifier;

#[derive(Debug)]
pub struct OnnxClassifier {
    /// Session::run takes &mut, so the session sits behind a mutex.
    session: Mutex<Session>,
    input_name: String,
    expected_features: Option<usize>,
}

impl OnnxClassifier {
    /// Load the classifier artifact from an ONNX file.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self, PipelineError> {
        let path = path.as_ref();

        ort::init()
            .commit()
            .map_err(|e| PipelineError::ArtifactLoad(format!("ONNX runtime init failed: {e}")))?;

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                PipelineError::ArtifactLoad(format!(
                    "failed to load classifier from {}: {e}",
                    path.display()
                ))
            })?;

        let input = session.inputs.first().ok_or_else(|| {
            PipelineError::ArtifactLoad(format!(
                "classifier {} declares no inputs",
                path.display()
            ))
        })?;
        let input_name = input.name.clone();
        let expected_features = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape
                .iter()
                .copied()
                .last()
                .filter(|dim| *dim > 0)
                .map(|dim| dim as usize),
            _ => None,
        };

        info!(
            path = %path.display(),
            input = %input_name,
            expected_features = ?expected_features,
            "Classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            expected_features,
        })
    }

    /// Pull integer class labels out of the session outputs.
    fn extract_labels(outputs: &ort::session::SessionOutputs, batch: usize) -> Result<Vec<i64>> {
        // Preferred: an integer label output.
        for (name, output) in outputs.iter() {
            if !name.contains("label") {
                continue;
            }
            if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                debug!(output = %name, "Extracted labels from tensor");
                return Ok(data.to_vec());
            }
        }

        // Fallback: arg-max over a probability tensor.
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                let classes = if dims.len() == 2 { dims[1] as usize } else { 1 };
                let labels = (0..batch)
                    .map(|row| {
                        if classes >= 2 {
                            let slice = &data[row * classes..(row + 1) * classes];
                            slice
                                .iter()
                                .enumerate()
                                .max_by(|a, b| a.1.total_cmp(b.1))
                                .map(|(idx, _)| idx as i64)
                                .unwrap_or(0)
                        } else {
                            (data[row] >= 0.5) as i64
                        }
                    })
                    .collect();
                debug!(output = %name, "Extracted labels via arg-max");
                return Ok(labels);
            }
        }

        anyhow::bail!("no usable label or probability output in classifier response")
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<i64>> {
        use ort::value::Tensor;

        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let width = rows[0].len();
        let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();

        let shape = vec![rows.len() as i64, width as i64];
        let input_tensor =
            Tensor::from_array((shape, flat)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {e}"))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let labels = Self::extract_labels(&outputs, rows.len())?;
        anyhow::ensure!(
            labels.len() == rows.len(),
            "classifier returned {} predictions for {} rows",
            labels.len(),
            rows.len()
        );
        Ok(labels)
    }

    fn expected_features(&self) -> Option<usize> {
        self.expected_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_fails_loudly() {
        let err = OnnxClassifier::load("/nonexistent/model.onnx", 1).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad(_)));
    }
}
