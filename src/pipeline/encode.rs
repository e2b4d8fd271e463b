//! Ordinal encoding of categorical columns with an open vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::pipeline::options::UnseenCategoryPolicy;

/// Integer a category unseen at fit time encodes to under the sentinel
/// policy.
pub const UNSEEN_SENTINEL: f64 = -1.0;

/// Per-column category-to-integer encoder.
///
/// The vocabulary is learned at fit time over the imputed categorical
/// columns, sorted lexicographically so codes are stable across fits on
/// the same data. Unseen values at transform time follow the configured
/// policy: the -1 sentinel (default) or a hard error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    vocabularies: Vec<BTreeMap<String, i64>>,
    policy: UnseenCategoryPolicy,
}

impl OrdinalEncoder {
    pub fn fit(columns: &[Vec<String>], policy: UnseenCategoryPolicy) -> Self {
        let vocabularies = columns
            .iter()
            .map(|col| {
                let mut sorted: Vec<&String> = col.iter().collect();
                sorted.sort();
                sorted.dedup();
                sorted
                    .into_iter()
                    .enumerate()
                    .map(|(code, value)| (value.clone(), code as i64))
                    .collect()
            })
            .collect();
        Self {
            vocabularies,
            policy,
        }
    }

    pub fn transform(
        &self,
        columns: &[Vec<String>],
        names: &[String],
    ) -> Result<Vec<Vec<f64>>, PipelineError> {
        columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let vocab = &self.vocabularies[idx];
                col.iter()
                    .map(|value| match vocab.get(value) {
                        Some(code) => Ok(*code as f64),
                        None => match self.policy {
                            UnseenCategoryPolicy::Sentinel => Ok(UNSEEN_SENTINEL),
                            UnseenCategoryPolicy::Error => Err(PipelineError::Schema(format!(
                                "unseen category {value:?} in column {}",
                                names.get(idx).map(String::as_str).unwrap_or("?")
                            ))),
                        },
                    })
                    .collect()
            })
            .collect()
    }

    /// Number of categories learned for each column.
    pub fn vocabulary_sizes(&self) -> Vec<usize> {
        self.vocabularies.iter().map(|v| v.len()).collect()
    }
}
