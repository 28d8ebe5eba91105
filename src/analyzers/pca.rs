use crate::error::{ProcessingError, Result};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use std::cmp::Ordering;

/// Principal component projection fitted on the sample covariance.
///
/// Component signs are fixed so each component's largest-magnitude
/// loading is positive, making projections reproducible run to run.
#[derive(Debug, Clone)]
pub struct Pca {
    n_components: usize,
    mean: Option<DVector<f64>>,
    components: Option<DMatrix<f64>>,
    explained_variance: Option<Vec<f64>>,
    explained_variance_ratio: Option<Vec<f64>>,
}

impl Pca {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            mean: None,
            components: None,
            explained_variance: None,
            explained_variance_ratio: None,
        }
    }

    /// Components actually kept after the last fit
    pub fn n_components(&self) -> usize {
        self.components.as_ref().map_or(0, |c| c.nrows())
    }

    pub fn explained_variance(&self) -> Option<&[f64]> {
        self.explained_variance.as_deref()
    }

    pub fn explained_variance_ratio(&self) -> Option<&[f64]> {
        self.explained_variance_ratio.as_deref()
    }

    /// Sum of the kept components' variance ratios
    pub fn cumulative_explained_variance(&self) -> Option<f64> {
        self.explained_variance_ratio().map(|r| r.iter().sum())
    }

    /// Fit on `x` (rows are samples). Keeps at most `n_components`, never
    /// more than the feature count.
    pub fn fit(&mut self, x: &DMatrix<f64>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples < 2 {
            return Err(ProcessingError::NoData(format!(
                "PCA needs at least 2 samples, got {}",
                n_samples
            )));
        }
        if n_features == 0 || self.n_components == 0 {
            return Err(ProcessingError::NoFeatures);
        }
        let keep = self.n_components.min(n_features);

        let mean = DVector::from_iterator(
            n_features,
            x.column_iter().map(|c| c.sum() / n_samples as f64),
        );
        let centered = DMatrix::from_fn(n_samples, n_features, |i, j| x[(i, j)] - mean[j]);
        let cov = (centered.transpose() * &centered) / (n_samples - 1) as f64;

        let eigen = SymmetricEigen::new(cov);
        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(Ordering::Equal)
        });

        let mut components = DMatrix::zeros(keep, n_features);
        let mut explained_variance = Vec::with_capacity(keep);
        for (row, &idx) in order.iter().take(keep).enumerate() {
            let vector = eigen.eigenvectors.column(idx);
            let pivot = vector
                .iter()
                .copied()
                .max_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap_or(Ordering::Equal))
                .unwrap_or(1.0);
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            for j in 0..n_features {
                components[(row, j)] = sign * vector[j];
            }
            explained_variance.push(eigen.eigenvalues[idx].max(0.0));
        }

        let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        let explained_variance_ratio = explained_variance
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        self.mean = Some(mean);
        self.components = Some(components);
        self.explained_variance = Some(explained_variance);
        self.explained_variance_ratio = Some(explained_variance_ratio);
        Ok(())
    }

    /// Project rows of `x` onto the fitted components
    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (Some(mean), Some(components)) = (&self.mean, &self.components) else {
            return Err(ProcessingError::Config("PCA is not fitted".to_string()));
        };
        if x.ncols() != mean.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "expected {} feature columns, got {}",
                mean.len(),
                x.ncols()
            )));
        }
        let centered = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - mean[j]);
        Ok(centered * components.transpose())
    }

    pub fn fit_transform(&mut self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}
