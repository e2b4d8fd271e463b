//! Feature derivation from raw transaction records.
//!
//! Turns a batch of [`Transaction`]s into the derived feature frame the
//! column router consumes: datetime parts extracted from the transaction
//! timestamp, optional per-customer amount aggregates, identifier and
//! timestamp columns dropped. The label never enters the frame.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::error::PipelineError;
use crate::pipeline::options::{PipelineOptions, TimestampPolicy};
use crate::types::transaction::Transaction;

/// Numeric feature columns taken directly from the raw record.
pub const NUMERIC_COLUMNS: [&str; 4] = ["CountryCode", "Amount", "Value", "PricingStrategy"];

/// Per-customer aggregate columns, emitted only when aggregates are enabled.
pub const AGGREGATE_COLUMNS: [&str; 4] = [
    "CustomerAmountSum",
    "CustomerAmountMean",
    "CustomerTransactionCount",
    "CustomerAmountStd",
];

/// Integer datetime parts derived from the transaction timestamp.
pub const DATETIME_COLUMNS: [&str; 4] = [
    "TransactionHour",
    "TransactionDay",
    "TransactionMonth",
    "TransactionYear",
];

/// String-valued categorical columns.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "CurrencyCode",
    "ProviderId",
    "ProductId",
    "ProductCategory",
    "ChannelId",
];

/// Derived features for a batch of transactions, column-major, grouped the
/// way the column router consumes them. `None` marks a missing value.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub row_count: usize,
    pub numeric_names: Vec<String>,
    pub numeric: Vec<Vec<Option<f64>>>,
    pub datetime_names: Vec<String>,
    pub datetime: Vec<Vec<Option<f64>>>,
    pub categorical_names: Vec<String>,
    pub categorical: Vec<Vec<Option<String>>>,
}

/// Derives model features from raw transactions.
///
/// Pure with respect to its input batch: no state is learned here, so the
/// same extractor runs at fit and at transform time.
#[derive(Debug)]
pub struct FeatureExtractor {
    options: PipelineOptions,
}

impl FeatureExtractor {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Derive the feature frame for a batch of transactions.
    ///
    /// Fails with [`PipelineError::Parse`] on a missing or malformed
    /// timestamp under the strict policy; under forward-fill a missing
    /// timestamp is taken from the previous row (order-dependent, and the
    /// first row must still carry one).
    pub fn extract(&self, rows: &[Transaction]) -> Result<FeatureFrame, PipelineError> {
        let n = rows.len();

        let mut numeric_names: Vec<String> =
            NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect();
        let mut numeric: Vec<Vec<Option<f64>>> = vec![
            rows.iter().map(|t| t.country_code).collect(),
            rows.iter().map(|t| t.amount).collect(),
            rows.iter().map(|t| t.value).collect(),
            rows.iter().map(|t| t.pricing_strategy).collect(),
        ];

        if self.options.include_aggregates {
            let aggregates = self.customer_aggregates(rows);
            numeric_names.extend(AGGREGATE_COLUMNS.iter().map(|s| s.to_string()));
            numeric.extend(aggregates);
        }

        let datetime = self.datetime_parts(rows)?;

        let categorical: Vec<Vec<Option<String>>> = vec![
            rows.iter().map(|t| t.currency_code.clone()).collect(),
            rows.iter().map(|t| t.provider_id.clone()).collect(),
            rows.iter().map(|t| t.product_id.clone()).collect(),
            rows.iter().map(|t| t.product_category.clone()).collect(),
            rows.iter().map(|t| t.channel_id.clone()).collect(),
        ];

        Ok(FeatureFrame {
            row_count: n,
            numeric_names,
            numeric,
            datetime_names: DATETIME_COLUMNS.iter().map(|s| s.to_string()).collect(),
            datetime,
            categorical_names: CATEGORICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
            categorical,
        })
    }

    /// Extract hour/day/month/year columns from the transaction timestamps.
    fn datetime_parts(
        &self,
        rows: &[Transaction],
    ) -> Result<Vec<Vec<Option<f64>>>, PipelineError> {
        let mut hour = Vec::with_capacity(rows.len());
        let mut day = Vec::with_capacity(rows.len());
        let mut month = Vec::with_capacity(rows.len());
        let mut year = Vec::with_capacity(rows.len());

        let mut previous: Option<DateTime<FixedOffset>> = None;

        for (row, tx) in rows.iter().enumerate() {
            let parsed = match &tx.transaction_start_time {
                Some(raw) => DateTime::parse_from_rfc3339(raw).map_err(|e| {
                    PipelineError::parse(row, format!("invalid TransactionStartTime {raw:?}: {e}"))
                })?,
                None => match self.options.timestamp_policy {
                    TimestampPolicy::Strict => {
                        return Err(PipelineError::parse(row, "missing TransactionStartTime"));
                    }
                    // Order-dependent by construction; the first row has no
                    // predecessor to fill from.
                    TimestampPolicy::ForwardFill => previous.ok_or_else(|| {
                        PipelineError::parse(
                            row,
                            "missing TransactionStartTime with no previous row to fill from",
                        )
                    })?,
                },
            };

            previous = Some(parsed);
            hour.push(Some(parsed.hour() as f64));
            day.push(Some(parsed.day() as f64));
            month.push(Some(parsed.month() as f64));
            year.push(Some(parsed.year() as f64));
        }

        Ok(vec![hour, day, month, year])
    }

    /// Compute per-customer sum/mean/count/std of the amount over this
    /// batch and join them back onto every row of that customer.
    ///
    /// A customer with a single non-null amount gets a std of 0.0, never a
    /// missing value. Rows with a null amount do not contribute to the
    /// statistics but still receive their customer's values.
    fn customer_aggregates(&self, rows: &[Transaction]) -> Vec<Vec<Option<f64>>> {
        let mut amounts: HashMap<&str, Vec<f64>> = HashMap::new();
        for tx in rows {
            let entry = amounts.entry(tx.customer_id.as_str()).or_default();
            if let Some(a) = tx.amount {
                entry.push(a);
            }
        }

        let mut stats: HashMap<&str, (Option<f64>, Option<f64>, f64, Option<f64>)> =
            HashMap::with_capacity(amounts.len());
        for (customer, values) in &amounts {
            let count = values.len();
            if count == 0 {
                stats.insert(*customer, (Some(0.0), None, 0.0, None));
                continue;
            }
            let sum: f64 = values.iter().sum();
            let mean = sum / count as f64;
            let std = if count < 2 {
                0.0
            } else {
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (count as f64 - 1.0);
                var.sqrt()
            };
            stats.insert(*customer, (Some(sum), Some(mean), count as f64, Some(std)));
        }

        let mut sum_col = Vec::with_capacity(rows.len());
        let mut mean_col = Vec::with_capacity(rows.len());
        let mut count_col = Vec::with_capacity(rows.len());
        let mut std_col = Vec::with_capacity(rows.len());
        for tx in rows {
            let (sum, mean, count, std) = stats[tx.customer_id.as_str()];
            sum_col.push(sum);
            mean_col.push(mean);
            count_col.push(Some(count));
            std_col.push(std);
        }

        vec![sum_col, mean_col, count_col, std_col]
    }
}
