//! Persistence for the fitted pipeline.
//!
//! The artifact is a JSON file carrying a format version, the options the
//! pipeline was fitted with, and the full learned state. Loading verifies
//! the version and re-checks internal consistency so that an artifact
//! fitted against a different column set fails loudly instead of silently
//! misaligning features.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::pipeline::options::PipelineOptions;
use crate::pipeline::{FeaturePipeline, FittedState};

/// Bumped whenever the serialized state layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PipelineArtifact {
    format_version: u32,
    options: PipelineOptions,
    state: FittedState,
}

impl FeaturePipeline {
    /// Persist the fitted pipeline to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let state = self
            .fitted
            .as_ref()
            .ok_or(PipelineError::NotFitted)?
            .clone();
        let artifact = PipelineArtifact {
            format_version: FORMAT_VERSION,
            options: self.options.clone(),
            state,
        };
        let json = serde_json::to_vec_pretty(&artifact).map_err(|e| {
            PipelineError::ArtifactLoad(format!("failed to serialize pipeline: {e}"))
        })?;
        fs::write(path, json).map_err(|e| {
            PipelineError::ArtifactLoad(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Load a fitted pipeline from `path`.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let bytes = fs::read(path).map_err(|e| {
            PipelineError::ArtifactLoad(format!("failed to read {}: {e}", path.display()))
        })?;
        let artifact: PipelineArtifact = serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::ArtifactLoad(format!("corrupt pipeline artifact {}: {e}", path.display()))
        })?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(PipelineError::ArtifactLoad(format!(
                "pipeline artifact {} has format version {}, expected {}",
                path.display(),
                artifact.format_version,
                FORMAT_VERSION
            )));
        }
        if artifact.state.output_columns.is_empty() {
            return Err(PipelineError::ArtifactLoad(format!(
                "pipeline artifact {} carries no output columns",
                path.display()
            )));
        }

        Ok(FeaturePipeline::from_parts(artifact.options, artifact.state))
    }
}
