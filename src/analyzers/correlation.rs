use crate::models::{LocationTable, Metric};
use crate::utils::stats::pearson;

/// Pairwise Pearson correlations between metric columns
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    /// Row-major; `None` where a pair has fewer than two complete rows or
    /// a constant column
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn compute(table: &LocationTable, metrics: &[Metric]) -> Self {
        let columns: Vec<Vec<Option<f64>>> = metrics.iter().map(|m| table.column(*m)).collect();
        let n = metrics.len();

        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Self {
            metrics: metrics.to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == a)?;
        let j = self.metrics.iter().position(|m| *m == b)?;
        self.values[i][j]
    }
}
