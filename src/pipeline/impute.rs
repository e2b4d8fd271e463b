//! Missing-value imputation, fitted on training data only.
//!
//! Three strategies, one per column group: distance-weighted KNN for the
//! numeric group, per-column median for the datetime parts, per-column
//! most-frequent value for categoricals. All learned state is serde
//! serializable so it travels inside the pipeline artifact.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Distance-weighted K-nearest-neighbor imputer over the numeric group.
///
/// `fit` stores the training rows; `transform` fills each missing value
/// from the k nearest training rows (NaN-aware Euclidean distance over the
/// columns observed in both rows, weighted by inverse distance). Falls
/// back to the fit-time column mean when no donor row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnImputer {
    neighbors: usize,
    /// Training rows, row-major; `None` marks a missing value.
    reference: Vec<Vec<Option<f64>>>,
    /// Fit-time mean of the observed values per column.
    column_means: Vec<f64>,
}

impl KnnImputer {
    /// Fit on training columns (column-major, as produced by the deriver).
    pub fn fit(columns: &[Vec<Option<f64>>], neighbors: usize) -> Result<Self, PipelineError> {
        let rows = to_rows(columns);
        let mut column_means = Vec::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            let observed: Vec<f64> = col.iter().flatten().copied().collect();
            if observed.is_empty() {
                return Err(PipelineError::Schema(format!(
                    "numeric column {idx} has no observed values to fit on"
                )));
            }
            column_means.push(observed.iter().sum::<f64>() / observed.len() as f64);
        }
        Ok(Self {
            neighbors,
            reference: rows,
            column_means,
        })
    }

    /// Fill missing values; returns columns of the same shape, fully dense.
    pub fn transform(&self, columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
        let queries = to_rows(columns);
        let mut out: Vec<Vec<f64>> = columns
            .iter()
            .map(|c| c.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();

        for (row_idx, query) in queries.iter().enumerate() {
            for col_idx in 0..columns.len() {
                if query[col_idx].is_none() {
                    out[col_idx][row_idx] = self.impute_one(query, col_idx);
                }
            }
        }
        out
    }

    /// Impute a single missing value from the k nearest donor rows.
    fn impute_one(&self, query: &[Option<f64>], target: usize) -> f64 {
        let mut donors: Vec<(f64, f64)> = Vec::new();
        for candidate in &self.reference {
            let value = match candidate[target] {
                Some(v) => v,
                None => continue,
            };
            if let Some(dist) = nan_euclidean(query, candidate, target) {
                donors.push((dist, value));
            }
        }

        if donors.is_empty() {
            return self.column_means[target];
        }

        donors.sort_by(|a, b| a.0.total_cmp(&b.0));
        donors.truncate(self.neighbors.max(1));

        // Exact matches dominate: average them with equal weight instead of
        // dividing by zero.
        let exact: Vec<f64> = donors
            .iter()
            .filter(|(d, _)| *d == 0.0)
            .map(|(_, v)| *v)
            .collect();
        if !exact.is_empty() {
            return exact.iter().sum::<f64>() / exact.len() as f64;
        }

        let mut weighted = 0.0;
        let mut total = 0.0;
        for (dist, value) in &donors {
            let w = 1.0 / dist;
            weighted += w * value;
            total += w;
        }
        weighted / total
    }

    pub fn neighbors(&self) -> usize {
        self.neighbors
    }
}

/// NaN-aware Euclidean distance over the coordinates observed in both rows,
/// excluding the target column. Scaled up by the ratio of total to shared
/// coordinates so sparser overlaps read as farther apart.
fn nan_euclidean(a: &[Option<f64>], b: &[Option<f64>], skip: usize) -> Option<f64> {
    let mut sum = 0.0;
    let mut shared = 0usize;
    let mut considered = 0usize;
    for idx in 0..a.len() {
        if idx == skip {
            continue;
        }
        considered += 1;
        if let (Some(x), Some(y)) = (a[idx], b[idx]) {
            sum += (x - y).powi(2);
            shared += 1;
        }
    }
    if shared == 0 {
        return None;
    }
    Some((sum * considered as f64 / shared as f64).sqrt())
}

fn to_rows(columns: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
    let n = columns.first().map(|c| c.len()).unwrap_or(0);
    (0..n)
        .map(|row| columns.iter().map(|col| col[row]).collect())
        .collect()
}

/// Per-column median fill for the datetime group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Vec<f64>,
}

impl MedianImputer {
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Result<Self, PipelineError> {
        let mut medians = Vec::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            let mut observed: Vec<f64> = col.iter().flatten().copied().collect();
            if observed.is_empty() {
                return Err(PipelineError::Schema(format!(
                    "datetime column {idx} has no observed values to fit on"
                )));
            }
            observed.sort_by(f64::total_cmp);
            let mid = observed.len() / 2;
            let median = if observed.len() % 2 == 0 {
                (observed[mid - 1] + observed[mid]) / 2.0
            } else {
                observed[mid]
            };
            medians.push(median);
        }
        Ok(Self { medians })
    }

    pub fn transform(&self, columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
        columns
            .iter()
            .zip(&self.medians)
            .map(|(col, median)| col.iter().map(|v| v.unwrap_or(*median)).collect())
            .collect()
    }
}

/// Per-column most-frequent fill for the categorical group. Ties break to
/// the lexicographically smallest value so fits are deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostFrequentImputer {
    modes: Vec<String>,
}

impl MostFrequentImputer {
    pub fn fit(columns: &[Vec<Option<String>>]) -> Result<Self, PipelineError> {
        let mut modes = Vec::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            let mut counts: std::collections::BTreeMap<&str, usize> = Default::default();
            for value in col.iter().flatten() {
                *counts.entry(value.as_str()).or_insert(0) += 1;
            }
            let mode = counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(value, _)| value.to_string())
                .ok_or_else(|| {
                    PipelineError::Schema(format!(
                        "categorical column {idx} has no observed values to fit on"
                    ))
                })?;
            modes.push(mode);
        }
        Ok(Self { modes })
    }

    pub fn transform(&self, columns: &[Vec<Option<String>>]) -> Vec<Vec<String>> {
        columns
            .iter()
            .zip(&self.modes)
            .map(|(col, mode)| {
                col.iter()
                    .map(|v| v.clone().unwrap_or_else(|| mode.clone()))
                    .collect()
            })
            .collect()
    }

    pub fn modes(&self) -> &[String] {
        &self.modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knn_imputes_from_nearest_rows() {
        // Three complete reference rows; the query matches the first two on
        // the observed column, so the imputed value stays near their values.
        let columns = vec![
            vec![Some(1.0), Some(1.1), Some(10.0)],
            vec![Some(100.0), Some(102.0), Some(500.0)],
        ];
        let imputer = KnnImputer::fit(&columns, 2).unwrap();

        let query = vec![vec![Some(1.05)], vec![None]];
        let out = imputer.transform(&query);

        let imputed = out[1][0];
        assert!(imputed > 99.0 && imputed < 103.0, "imputed = {imputed}");
    }

    #[test]
    fn test_knn_exact_match_uses_donor_value() {
        let columns = vec![
            vec![Some(1.0), Some(5.0)],
            vec![Some(10.0), Some(50.0)],
        ];
        let imputer = KnnImputer::fit(&columns, 3).unwrap();

        let query = vec![vec![Some(1.0)], vec![None]];
        let out = imputer.transform(&query);
        assert_eq!(out[1][0], 10.0);
    }

    #[test]
    fn test_knn_falls_back_to_column_mean() {
        let columns = vec![
            vec![Some(1.0), Some(3.0)],
            vec![Some(10.0), Some(20.0)],
        ];
        let imputer = KnnImputer::fit(&columns, 3).unwrap();

        // Both coordinates missing: no shared coordinate with any donor.
        let query = vec![vec![None], vec![None]];
        let out = imputer.transform(&query);
        assert_eq!(out[0][0], 2.0);
        assert_eq!(out[1][0], 15.0);
    }

    #[test]
    fn test_knn_rejects_empty_column() {
        let columns = vec![vec![None, None]];
        assert!(matches!(
            KnnImputer::fit(&columns, 3),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_median_imputer() {
        let columns = vec![vec![Some(1.0), None, Some(3.0), Some(7.0)]];
        let imputer = MedianImputer::fit(&columns).unwrap();
        let out = imputer.transform(&columns);
        assert_eq!(out[0][1], 3.0);
    }

    #[test]
    fn test_median_even_count() {
        let columns = vec![vec![Some(1.0), Some(3.0), None]];
        let imputer = MedianImputer::fit(&columns).unwrap();
        assert_eq!(imputer.transform(&columns)[0][2], 2.0);
    }

    #[test]
    fn test_most_frequent_imputer() {
        let columns = vec![vec![
            Some("a".to_string()),
            Some("b".to_string()),
            Some("b".to_string()),
            None,
        ]];
        let imputer = MostFrequentImputer::fit(&columns).unwrap();
        let out = imputer.transform(&columns);
        assert_eq!(out[0][3], "b");
    }

    #[test]
    fn test_most_frequent_tie_breaks_lexicographically() {
        let columns = vec![vec![
            Some("b".to_string()),
            Some("a".to_string()),
            None,
        ]];
        let imputer = MostFrequentImputer::fit(&columns).unwrap();
        assert_eq!(imputer.modes()[0], "a");
    }
}
