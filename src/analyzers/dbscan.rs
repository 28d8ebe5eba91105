//! Density-based clustering with a noise label.
//!
//! A point is a core point when at least `min_samples` points, itself
//! included, lie within `eps` of it (Euclidean, inclusive). Clusters grow
//! outward from core points in row order; non-core points inside a core
//! point's neighbourhood join that cluster. Everything else is noise.

use crate::error::{ProcessingError, Result};
use crate::models::{ClusterLabel, NOISE_LABEL};
use crate::utils::constants::{DEFAULT_EPS, DEFAULT_MIN_SAMPLES};
use nalgebra::DMatrix;
use tracing::debug;

const UNVISITED: ClusterLabel = -2;

#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Result<Self> {
        if !(eps > 0.0 && eps.is_finite()) {
            return Err(ProcessingError::Config(format!(
                "eps must be a positive finite number, got {}",
                eps
            )));
        }
        if min_samples == 0 {
            return Err(ProcessingError::Config(
                "min_samples must be at least 1".to_string(),
            ));
        }
        Ok(Self { eps, min_samples })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Label every row of `x`; rows are points, columns are features
    pub fn fit_predict(&self, x: &DMatrix<f64>) -> Vec<ClusterLabel> {
        let n = x.nrows();
        let neighborhoods: Vec<Vec<usize>> = (0..n).map(|i| self.region_query(x, i)).collect();
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels = vec![UNVISITED; n];
        let mut next_cluster: ClusterLabel = 0;

        for seed in 0..n {
            if labels[seed] != UNVISITED || !is_core[seed] {
                continue;
            }

            let mut stack = vec![seed];
            labels[seed] = next_cluster;
            while let Some(point) = stack.pop() {
                if !is_core[point] {
                    continue;
                }
                for &neighbor in &neighborhoods[point] {
                    if labels[neighbor] == UNVISITED {
                        labels[neighbor] = next_cluster;
                        stack.push(neighbor);
                    }
                }
            }
            next_cluster += 1;
        }

        for label in labels.iter_mut().filter(|l| **l == UNVISITED) {
            *label = NOISE_LABEL;
        }

        debug!(
            "DBSCAN(eps={}, min_samples={}): {} clusters, {} noise points over {} rows",
            self.eps,
            self.min_samples,
            next_cluster,
            labels.iter().filter(|l| **l == NOISE_LABEL).count(),
            n
        );

        labels
    }

    fn region_query(&self, x: &DMatrix<f64>, i: usize) -> Vec<usize> {
        (0..x.nrows())
            .filter(|&j| euclidean_distance(x, i, j) <= self.eps)
            .collect()
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

pub fn euclidean_distance(x: &DMatrix<f64>, i: usize, j: usize) -> f64 {
    x.row(i)
        .iter()
        .zip(x.row(j).iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}
