//! Zero-mean/unit-variance scaling for the numeric group.

use serde::{Deserialize, Serialize};

/// Standard scaler fitted on the imputed numeric columns.
///
/// Population variance, matching the usual tabular-ML convention; a
/// constant column scales by 1.0 instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for col in columns {
            let n = col.len().max(1) as f64;
            let mean = col.iter().sum::<f64>() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            means.push(mean);
            scales.push(if std == 0.0 { 1.0 } else { std });
        }
        Self { means, scales }
    }

    pub fn transform(&self, columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
        columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                col.iter()
                    .map(|v| (v - self.means[idx]) / self.scales[idx])
                    .collect()
            })
            .collect()
    }
}
