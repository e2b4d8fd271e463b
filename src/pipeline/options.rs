//! Pipeline configuration options.
//!
//! The upstream system shipped several near-duplicate pipeline variants
//! (with/without customer aggregates, with/without missing indicators).
//! Here they are a single pipeline with explicit options, recorded in the
//! fitted artifact so a loaded pipeline always transforms the way it was
//! fitted.

use serde::{Deserialize, Serialize};

/// How a missing transaction timestamp is handled during derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampPolicy {
    /// Reject the batch with a parse error (default).
    #[default]
    Strict,
    /// Fill from the previous row in input order. Order-dependent: only
    /// sound when the input carries a stable per-customer time sort.
    ForwardFill,
}

/// How a category value unseen at fit time is encoded at transform time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UnseenCategoryPolicy {
    /// Encode as the -1 sentinel (default, open vocabulary).
    #[default]
    Sentinel,
    /// Fail the transform.
    Error,
}

/// Feature pipeline options, fixed at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Emit per-customer amount aggregates (sum/mean/count/std).
    pub include_aggregates: bool,
    /// Emit a `<column>_missing` 0/1 companion column next to every
    /// numeric and categorical column.
    pub include_missing_indicators: bool,
    /// Neighbor count for numeric KNN imputation.
    pub knn_neighbors: usize,
    pub timestamp_policy: TimestampPolicy,
    pub unseen_category_policy: UnseenCategoryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include_aggregates: false,
            include_missing_indicators: false,
            knn_neighbors: 3,
            timestamp_policy: TimestampPolicy::default(),
            unseen_category_policy: UnseenCategoryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = PipelineOptions::default();
        assert!(!opts.include_aggregates);
        assert!(!opts.include_missing_indicators);
        assert_eq!(opts.knn_neighbors, 3);
        assert_eq!(opts.timestamp_policy, TimestampPolicy::Strict);
        assert_eq!(opts.unseen_category_policy, UnseenCategoryPolicy::Sentinel);
    }

    #[test]
    fn test_kebab_case_policies() {
        let opts: PipelineOptions = serde_json::from_str(
            r#"{"timestamp_policy": "forward-fill", "unseen_category_policy": "error"}"#,
        )
        .unwrap();
        assert_eq!(opts.timestamp_policy, TimestampPolicy::ForwardFill);
        assert_eq!(opts.unseen_category_policy, UnseenCategoryPolicy::Error);
    }
}
