//! Error types for the feature pipeline and artifact handling.

use thiserror::Error;

/// Errors raised by the feature pipeline, artifact I/O, and the training
/// entry point.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input is missing required columns, or the label column is absent
    /// during training.
    #[error("schema error: {0}")]
    Schema(String),

    /// A timestamp or numeric field could not be parsed.
    #[error("parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// The fitted pipeline or classifier artifact is missing, corrupt, or
    /// incompatible with the current schema.
    #[error("artifact error: {0}")]
    ArtifactLoad(String),

    /// `transform` was called before `fit` (or before loading an artifact).
    #[error("pipeline has not been fitted")]
    NotFitted,
}

impl PipelineError {
    pub fn parse(row: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            row,
            message: message.into(),
        }
    }

    /// True when the error should surface as a client error rather than a
    /// service failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::parse(3, "bad timestamp");
        assert_eq!(err.to_string(), "parse error at row 3: bad timestamp");
        assert!(err.is_client_error());
        assert!(!PipelineError::NotFitted.is_client_error());
    }
}
