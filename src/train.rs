//! Offline training entry point.
//!
//! Reads the raw transaction CSV (header included, label required on every
//! row), fits the feature pipeline, writes the transformed matrix plus
//! label to the output CSV, and persists the fitted pipeline artifact.
//! One-shot and non-resumable: a failure mid-fit means rerunning from the
//! raw data.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::error::PipelineError;
use crate::feature_extractor::DATETIME_COLUMNS;
use crate::pipeline::options::PipelineOptions;
use crate::pipeline::{FeatureMatrix, FeaturePipeline};
use crate::types::transaction::Transaction;

/// What a training run produced.
#[derive(Debug)]
pub struct TrainingSummary {
    pub rows: usize,
    pub output_columns: usize,
}

/// Read raw transactions from a CSV file with headers.
pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open training data {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<Transaction>().enumerate() {
        let tx = record.map_err(|e| {
            PipelineError::Schema(format!("training data row {idx} does not match schema: {e}"))
        })?;
        rows.push(tx);
    }
    Ok(rows)
}

/// Split the label column out of the raw rows; every row must carry one.
fn extract_labels(rows: &[Transaction]) -> Result<Vec<i64>, PipelineError> {
    rows.iter()
        .enumerate()
        .map(|(idx, tx)| {
            tx.fraud_result.ok_or_else(|| {
                PipelineError::Schema(format!("FraudResult label missing at row {idx}"))
            })
        })
        .collect()
}

/// Write the transformed matrix plus label to a CSV file. Datetime parts
/// are written as integers, everything else as floats.
fn write_matrix(path: &Path, matrix: &FeatureMatrix, labels: &[i64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;

    let mut header: Vec<&str> = matrix.columns.iter().map(String::as_str).collect();
    header.push("FraudResult");
    writer.write_record(&header)?;

    let datetime: Vec<bool> = matrix
        .columns
        .iter()
        .map(|c| DATETIME_COLUMNS.contains(&c.as_str()))
        .collect();

    for (row, label) in matrix.rows.iter().zip(labels) {
        let mut record: Vec<String> = row
            .iter()
            .zip(&datetime)
            .map(|(value, is_datetime)| {
                if *is_datetime {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            })
            .collect();
        record.push(label.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Fit the pipeline on `input`, write the transformed matrix to `output`,
/// and persist the fitted pipeline artifact to `pipeline_out`.
pub fn run_training(
    input: &Path,
    output: &Path,
    pipeline_out: &Path,
    options: PipelineOptions,
) -> Result<TrainingSummary> {
    let rows = read_transactions(input)?;
    info!(rows = rows.len(), input = %input.display(), "Training data loaded");

    let labels = extract_labels(&rows)?;

    let mut pipeline = FeaturePipeline::new(options);
    pipeline.fit(&rows)?;
    let matrix = pipeline.transform(&rows)?;

    write_matrix(output, &matrix, &labels)?;
    pipeline.save(pipeline_out)?;

    info!(
        rows = matrix.rows.len(),
        columns = matrix.columns.len(),
        output = %output.display(),
        pipeline = %pipeline_out.display(),
        "Training complete"
    );

    Ok(TrainingSummary {
        rows: matrix.rows.len(),
        output_columns: matrix.columns.len(),
    })
}
