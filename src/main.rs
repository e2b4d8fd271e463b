//! Fraud Scoring Service - Main Entry Point
//!
//! Loads the fitted pipeline and classifier artifacts once, then serves
//! predictions over HTTP. Any artifact failure is fatal before the socket
//! is bound; the service never starts half-initialized.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use fraud_scoring::{
    config::AppConfig,
    models::{check_feature_arity, OnnxClassifier},
    pipeline::FeaturePipeline,
    server::{self, AppState},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("No usable config file ({e:#}); falling back to defaults");
        AppConfig::default()
    });

    init_logging(&config)?;
    info!("Starting fraud scoring service");

    let pipeline = FeaturePipeline::load(Path::new(&config.artifacts.pipeline_path))
        .context("failed to load fitted pipeline artifact")?;
    let width = pipeline.output_columns()?.len();
    info!(
        columns = width,
        path = %config.artifacts.pipeline_path,
        "Fitted pipeline loaded"
    );

    let classifier = OnnxClassifier::load(
        &config.artifacts.model_path,
        config.artifacts.onnx_threads,
    )
    .context("failed to load classifier artifact")?;
    check_feature_arity(&classifier, width)?;

    let state = Arc::new(AppState::new(pipeline, Box::new(classifier)));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    server::serve(&addr, state).await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_scoring={}", config.logging.level).parse()?)
        .add_directive(format!("tower_http={}", config.logging.level).parse()?);

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
