//! Configuration management for the fraud scoring service.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;

use crate::pipeline::options::PipelineOptions;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub pipeline: PipelineOptions,
    pub logging: LoggingConfig,
}

/// HTTP server binding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Locations of the fitted artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Fitted feature pipeline (JSON).
    pub pipeline_path: String,
    /// Fitted classifier (ONNX).
    pub model_path: String,
    /// Intra-op threads for ONNX inference.
    pub onnx_threads: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            artifacts: ArtifactConfig::default(),
            pipeline: PipelineOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            pipeline_path: "model/pipeline.json".to_string(),
            model_path: "model/model.onnx".to_string(),
            onnx_threads: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
