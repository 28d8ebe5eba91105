use crate::error::{ProcessingError, Result};
use crate::models::{LocationTable, Metric};
use crate::utils::stats::{median, quantile_sorted, sorted_finite};
use nalgebra::DMatrix;
use tracing::{debug, warn};

/// Median / interquartile-range standardisation, fitted per column.
///
/// Columns with zero IQR keep a scale of 1 so they are only centred.
#[derive(Debug, Clone, Default)]
pub struct RobustScaler {
    center: Vec<f64>,
    scale: Vec<f64>,
}

impl RobustScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn is_fitted(&self) -> bool {
        !self.center.is_empty()
    }

    pub fn fit(&mut self, x: &DMatrix<f64>) -> Result<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ProcessingError::NoData(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        self.center.clear();
        self.scale.clear();
        for column in x.column_iter() {
            let sorted = sorted_finite(column.iter().map(|v| Some(*v)));
            let q1 = quantile_sorted(&sorted, 0.25).unwrap_or(0.0);
            let q2 = quantile_sorted(&sorted, 0.5).unwrap_or(0.0);
            let q3 = quantile_sorted(&sorted, 0.75).unwrap_or(0.0);
            let iqr = q3 - q1;

            self.center.push(q2);
            self.scale.push(if iqr == 0.0 { 1.0 } else { iqr });
        }
        Ok(())
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if !self.is_fitted() {
            return Err(ProcessingError::Config("scaler is not fitted".to_string()));
        }
        if x.ncols() != self.center.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "expected {} feature columns, got {}",
                self.center.len(),
                x.ncols()
            )));
        }
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.center[j]) / self.scale[j]
        }))
    }

    pub fn fit_transform(&mut self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Clustering input: the imputed and scaled pollutant matrix
#[derive(Debug, Clone)]
pub struct ScaledFeatures {
    /// Column order of `matrix`
    pub features: Vec<Metric>,
    /// Medians used to fill missing means, aligned with `features`
    pub fill_values: Vec<f64>,
    pub matrix: DMatrix<f64>,
    pub scaler: RobustScaler,
}

impl ScaledFeatures {
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Builds the scaled pollutant matrix from an aggregated table
pub struct FeatureScaler {
    candidates: Vec<Metric>,
}

impl FeatureScaler {
    pub fn new() -> Self {
        Self {
            candidates: Metric::POLLUTANTS.to_vec(),
        }
    }

    /// Pollutant columns of `table` (candidate order), median-imputed and
    /// robust-scaled. A column with no values at all cannot be imputed and
    /// is dropped.
    pub fn scale(&self, table: &LocationTable) -> Result<ScaledFeatures> {
        let mut features = Vec::new();
        let mut fill_values = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for metric in self.candidates.iter().filter(|m| table.has_metric(**m)) {
            let raw = table.column(*metric);
            let Some(fill) = median(raw.iter().copied()) else {
                warn!("Dropping feature '{}': no values after aggregation", metric);
                continue;
            };

            let missing = raw.iter().filter(|v| v.is_none()).count();
            if missing > 0 {
                debug!("Imputed {} missing '{}' values with median {:.3}", missing, metric, fill);
            }

            features.push(*metric);
            fill_values.push(fill);
            columns.push(
                raw.into_iter()
                    .map(|v| v.filter(|x| x.is_finite()).unwrap_or(fill))
                    .collect(),
            );
        }

        if features.is_empty() {
            return Err(ProcessingError::NoFeatures);
        }
        if table.is_empty() {
            return Err(ProcessingError::NoData("no locations to scale".to_string()));
        }

        let nrows = table.len();
        let matrix = DMatrix::from_fn(nrows, features.len(), |i, j| columns[j][i]);

        let mut scaler = RobustScaler::new();
        let scaled = scaler.fit_transform(&matrix)?;

        Ok(ScaledFeatures {
            features,
            fill_values,
            matrix: scaled,
            scaler,
        })
    }
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self::new()
    }
}
