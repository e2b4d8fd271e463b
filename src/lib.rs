//! Fraud Scoring Library
//!
//! Feature pipeline and serving components for transaction fraud scoring:
//! an offline fit/transform pipeline (datetime parts, optional customer
//! aggregates, per-group imputation/scaling/encoding) persisted as an
//! artifact, and an HTTP service that loads the artifact plus a
//! gradient-boosted tree classifier and scores single transactions.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod train;
pub mod types;

pub use config::AppConfig;
pub use error::PipelineError;
pub use feature_extractor::FeatureExtractor;
pub use models::{Classifier, OnnxClassifier};
pub use pipeline::{options::PipelineOptions, FeatureMatrix, FeaturePipeline};
pub use types::transaction::Transaction;
