//! Classifier loading and inference.

pub mod onnx;

pub use onnx::OnnxClassifier;

use anyhow::Result;

use crate::error::PipelineError;

/// A fitted binary classifier over the transformed feature matrix.
///
/// Implementations are read-only after load and safe to share across
/// request handlers.
pub trait Classifier: Send + Sync {
    /// Predict the class (0 = legitimate, 1 = fraud) for each feature row.
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<i64>>;

    /// Input width the model was trained on, when the artifact declares it.
    fn expected_features(&self) -> Option<usize> {
        None
    }
}

/// Verify at startup that the classifier artifact was trained on the same
/// column set the pipeline produces. A mismatch would silently misalign
/// every feature, so it is fatal.
pub fn check_feature_arity(
    classifier: &dyn Classifier,
    pipeline_width: usize,
) -> Result<(), PipelineError> {
    match classifier.expected_features() {
        Some(expected) if expected != pipeline_width => Err(PipelineError::ArtifactLoad(format!(
            "classifier expects {expected} features but the pipeline produces {pipeline_width}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWidth(usize);

    impl Classifier for FixedWidth {
        fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<i64>> {
            Ok(vec![0; rows.len()])
        }

        fn expected_features(&self) -> Option<usize> {
            Some(self.0)
        }
    }

    #[test]
    fn test_arity_match_passes() {
        assert!(check_feature_arity(&FixedWidth(13), 13).is_ok());
    }

    #[test]
    fn test_arity_mismatch_is_fatal() {
        let err = check_feature_arity(&FixedWidth(13), 17).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad(_)));
    }
}
