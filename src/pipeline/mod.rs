//! The fit/transform feature pipeline.
//!
//! Composes the feature extractor with the column router: numeric columns
//! get KNN imputation then standard scaling, datetime parts get median
//! fill, categoricals get most-frequent fill then ordinal encoding. `fit`
//! learns every statistic from the training batch; `transform` is a pure
//! read of the learned state and produces the same column order and count
//! for any valid input.

pub mod artifact;
pub mod encode;
pub mod impute;
pub mod options;
pub mod scale;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::feature_extractor::{FeatureExtractor, FeatureFrame};
use crate::types::transaction::Transaction;

use encode::OrdinalEncoder;
use impute::{KnnImputer, MedianImputer, MostFrequentImputer};
use options::PipelineOptions;
use scale::StandardScaler;

/// Dense transformed output: one row per input transaction, columns in the
/// fixed fitted order (numeric block, datetime block, categorical block).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Rows as f32 vectors, the layout the classifier consumes.
    pub fn to_f32_rows(&self) -> Vec<Vec<f32>> {
        self.rows
            .iter()
            .map(|r| r.iter().map(|v| *v as f32).collect())
            .collect()
    }
}

/// Everything learned at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FittedState {
    pub(crate) numeric_imputer: KnnImputer,
    pub(crate) scaler: StandardScaler,
    pub(crate) datetime_imputer: MedianImputer,
    pub(crate) categorical_imputer: MostFrequentImputer,
    pub(crate) encoder: OrdinalEncoder,
    pub(crate) output_columns: Vec<String>,
}

/// The feature pipeline: derive, route, impute, scale, encode.
///
/// Fitted once offline, persisted as an artifact, then loaded read-only by
/// the prediction service. Never mutated after fitting; `transform` can run
/// concurrently from any number of request handlers.
#[derive(Debug)]
pub struct FeaturePipeline {
    options: PipelineOptions,
    extractor: FeatureExtractor,
    fitted: Option<FittedState>,
}

impl FeaturePipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            extractor: FeatureExtractor::new(options.clone()),
            options,
            fitted: None,
        }
    }

    pub(crate) fn from_parts(options: PipelineOptions, state: FittedState) -> Self {
        Self {
            extractor: FeatureExtractor::new(options.clone()),
            options,
            fitted: Some(state),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Output column names, in transform order. Errors before `fit`.
    pub fn output_columns(&self) -> Result<&[String], PipelineError> {
        self.fitted
            .as_ref()
            .map(|s| s.output_columns.as_slice())
            .ok_or(PipelineError::NotFitted)
    }

    /// Learn imputation statistics, scaling parameters, and category
    /// vocabularies from the training batch.
    ///
    /// Never called from inference paths; the service only ever loads an
    /// already-fitted artifact.
    pub fn fit(&mut self, rows: &[Transaction]) -> Result<(), PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::Schema("training set is empty".to_string()));
        }

        let frame = self.extractor.extract(rows)?;

        let numeric_imputer = KnnImputer::fit(&frame.numeric, self.options.knn_neighbors)?;
        let imputed_numeric = numeric_imputer.transform(&frame.numeric);
        let scaler = StandardScaler::fit(&imputed_numeric);

        let datetime_imputer = MedianImputer::fit(&frame.datetime)?;

        let categorical_imputer = MostFrequentImputer::fit(&frame.categorical)?;
        let imputed_categorical = categorical_imputer.transform(&frame.categorical);
        let encoder = OrdinalEncoder::fit(&imputed_categorical, self.options.unseen_category_policy);

        let output_columns = self.build_output_columns(&frame);

        self.fitted = Some(FittedState {
            numeric_imputer,
            scaler,
            datetime_imputer,
            categorical_imputer,
            encoder,
            output_columns,
        });
        Ok(())
    }

    /// Apply the fitted transforms to a batch (training or inference).
    ///
    /// Deterministic for a fixed fit: identical input yields bit-identical
    /// output, and the column order and count never depend on which values
    /// happen to appear in the batch.
    pub fn transform(&self, rows: &[Transaction]) -> Result<FeatureMatrix, PipelineError> {
        let state = self.fitted.as_ref().ok_or(PipelineError::NotFitted)?;

        let frame = self.extractor.extract(rows)?;

        let numeric_missing: Vec<Vec<f64>> = frame
            .numeric
            .iter()
            .map(|col| col.iter().map(|v| if v.is_none() { 1.0 } else { 0.0 }).collect())
            .collect();
        let categorical_missing: Vec<Vec<f64>> = frame
            .categorical
            .iter()
            .map(|col| col.iter().map(|v| if v.is_none() { 1.0 } else { 0.0 }).collect())
            .collect();

        let imputed_numeric = state.numeric_imputer.transform(&frame.numeric);
        let scaled_numeric = state.scaler.transform(&imputed_numeric);

        let datetime = state.datetime_imputer.transform(&frame.datetime);

        let imputed_categorical = state.categorical_imputer.transform(&frame.categorical);
        let encoded_categorical = state
            .encoder
            .transform(&imputed_categorical, &frame.categorical_names)?;

        let indicators = self.options.include_missing_indicators;
        let mut out_rows = Vec::with_capacity(frame.row_count);
        for row in 0..frame.row_count {
            let mut values =
                Vec::with_capacity(state.output_columns.len());
            for (col, scaled) in scaled_numeric.iter().enumerate() {
                values.push(scaled[row]);
                if indicators {
                    values.push(numeric_missing[col][row]);
                }
            }
            for col in &datetime {
                values.push(col[row]);
            }
            for (col, encoded) in encoded_categorical.iter().enumerate() {
                values.push(encoded[row]);
                if indicators {
                    values.push(categorical_missing[col][row]);
                }
            }
            out_rows.push(values);
        }

        Ok(FeatureMatrix {
            columns: state.output_columns.clone(),
            rows: out_rows,
        })
    }

    /// Fixed output ordering: numeric block, datetime block, categorical
    /// block, with each indicator immediately after its source column when
    /// indicators are enabled.
    fn build_output_columns(&self, frame: &FeatureFrame) -> Vec<String> {
        let indicators = self.options.include_missing_indicators;
        let mut columns = Vec::new();
        for name in &frame.numeric_names {
            columns.push(name.clone());
            if indicators {
                columns.push(format!("{name}_missing"));
            }
        }
        columns.extend(frame.datetime_names.iter().cloned());
        for name in &frame.categorical_names {
            columns.push(name.clone());
            if indicators {
                columns.push(format!("{name}_missing"));
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::{CATEGORICAL_COLUMNS, DATETIME_COLUMNS, NUMERIC_COLUMNS};

    fn training_rows() -> Vec<Transaction> {
        vec![
            Transaction::new("TransactionId_1", "CustomerId_a", 2200.0, "2018-11-15T05:54:12Z"),
            Transaction::new("TransactionId_2", "CustomerId_a", -50.0, "2018-11-15T06:10:00Z"),
            Transaction::new("TransactionId_3", "CustomerId_b", 500.0, "2018-11-16T22:01:30Z"),
            Transaction::new("TransactionId_4", "CustomerId_c", 75.0, "2018-12-01T11:30:00Z"),
        ]
    }

    #[test]
    fn test_fit_then_transform_column_contract() {
        let mut pipeline = FeaturePipeline::new(PipelineOptions::default());
        let rows = training_rows();
        pipeline.fit(&rows).unwrap();

        let matrix = pipeline.transform(&rows).unwrap();
        assert_eq!(matrix.rows.len(), rows.len());
        assert_eq!(
            matrix.columns.len(),
            NUMERIC_COLUMNS.len() + DATETIME_COLUMNS.len() + CATEGORICAL_COLUMNS.len()
        );
        for row in &matrix.rows {
            assert_eq!(row.len(), matrix.columns.len());
        }

        // Column order is numeric, then datetime, then categorical.
        assert_eq!(matrix.columns[0], "CountryCode");
        assert_eq!(matrix.columns[4], "TransactionHour");
        assert_eq!(matrix.columns[8], "CurrencyCode");
    }

    #[test]
    fn test_transform_is_idempotent() {
        let mut pipeline = FeaturePipeline::new(PipelineOptions::default());
        let rows = training_rows();
        pipeline.fit(&rows).unwrap();

        let first = pipeline.transform(&rows).unwrap();
        let second = pipeline.transform(&rows).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let pipeline = FeaturePipeline::new(PipelineOptions::default());
        let err = pipeline.transform(&training_rows()).unwrap_err();
        assert!(matches!(err, PipelineError::NotFitted));
    }

    #[test]
    fn test_single_row_inference_matches_column_contract() {
        let mut pipeline = FeaturePipeline::new(PipelineOptions::default());
        pipeline.fit(&training_rows()).unwrap();
        let fitted_width = pipeline.output_columns().unwrap().len();

        // A single-row batch with a category never seen at fit time.
        let mut tx = Transaction::new("TransactionId_9", "CustomerId_z", 10.0, "2019-01-01T00:00:00Z");
        tx.product_category = Some("totally_new_category".to_string());

        let matrix = pipeline.transform(&[tx]).unwrap();
        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.rows[0].len(), fitted_width);

        let cat_idx = matrix
            .columns
            .iter()
            .position(|c| c == "ProductCategory")
            .unwrap();
        assert_eq!(matrix.rows[0][cat_idx], encode::UNSEEN_SENTINEL);
    }

    #[test]
    fn test_missing_numeric_value_is_imputed() {
        let mut pipeline = FeaturePipeline::new(PipelineOptions::default());
        pipeline.fit(&training_rows()).unwrap();

        let mut tx = Transaction::new("TransactionId_9", "CustomerId_a", 0.0, "2018-11-15T05:54:12Z");
        tx.amount = None;

        let matrix = pipeline.transform(&[tx]).unwrap();
        let amount_idx = matrix.columns.iter().position(|c| c == "Amount").unwrap();
        assert!(matrix.rows[0][amount_idx].is_finite());
    }

    #[test]
    fn test_missing_indicators_adjacent_to_source_columns() {
        let options = PipelineOptions {
            include_missing_indicators: true,
            ..PipelineOptions::default()
        };
        let mut pipeline = FeaturePipeline::new(options);
        pipeline.fit(&training_rows()).unwrap();

        let columns = pipeline.output_columns().unwrap();
        let amount_idx = columns.iter().position(|c| c == "Amount").unwrap();
        assert_eq!(columns[amount_idx + 1], "Amount_missing");
        let channel_idx = columns.iter().position(|c| c == "ChannelId").unwrap();
        assert_eq!(columns[channel_idx + 1], "ChannelId_missing");
        // Datetime parts carry no indicators.
        assert!(!columns.iter().any(|c| c == "TransactionHour_missing"));

        let mut tx = Transaction::new("TransactionId_9", "CustomerId_a", 0.0, "2018-11-15T05:54:12Z");
        tx.amount = None;
        let matrix = pipeline.transform(&[tx]).unwrap();
        assert_eq!(matrix.rows[0][amount_idx + 1], 1.0);
    }

    #[test]
    fn test_aggregate_variant_widens_numeric_block() {
        let options = PipelineOptions {
            include_aggregates: true,
            ..PipelineOptions::default()
        };
        let mut pipeline = FeaturePipeline::new(options);
        pipeline.fit(&training_rows()).unwrap();

        let columns = pipeline.output_columns().unwrap();
        assert!(columns.iter().any(|c| c == "CustomerAmountStd"));
        assert_eq!(
            columns.len(),
            NUMERIC_COLUMNS.len() + 4 + DATETIME_COLUMNS.len() + CATEGORICAL_COLUMNS.len()
        );
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let mut pipeline = FeaturePipeline::new(PipelineOptions::default());
        assert!(matches!(
            pipeline.fit(&[]),
            Err(PipelineError::Schema(_))
        ));
    }
}
