use serde::{Deserialize, Serialize};

use super::metric::{Metric, METRIC_COUNT};

/// DBSCAN label; negative values never denote a cluster
pub type ClusterLabel = i32;

/// Label assigned to points no dense neighbourhood reaches
pub const NOISE_LABEL: ClusterLabel = -1;

/// Per-location means over the seasonal subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub city: String,
    pub location_id: String,
    pub means: [Option<f64>; METRIC_COUNT],
    pub cluster: Option<ClusterLabel>,
}

impl LocationSummary {
    pub fn new(city: String, location_id: String) -> Self {
        Self {
            city,
            location_id,
            means: [None; METRIC_COUNT],
            cluster: None,
        }
    }

    pub fn with_mean(mut self, metric: Metric, value: f64) -> Self {
        self.means[metric.index()] = Some(value);
        self
    }

    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means[metric.index()]
    }

    pub fn set_mean(&mut self, metric: Metric, value: Option<f64>) {
        self.means[metric.index()] = value;
    }

    pub fn aqi(&self) -> Option<f64> {
        self.mean(Metric::Aqi)
    }

    pub fn is_hotspot(&self) -> bool {
        self.cluster == Some(NOISE_LABEL)
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.city, &self.location_id)
    }
}

/// Aggregated locations together with the metric columns they carry
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    pub locations: Vec<LocationSummary>,
    pub available: Vec<Metric>,
}

impl LocationTable {
    pub fn new(locations: Vec<LocationSummary>, mut available: Vec<Metric>) -> Self {
        available.sort();
        available.dedup();
        Self {
            locations,
            available,
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn has_metric(&self, metric: Metric) -> bool {
        self.available.contains(&metric)
    }

    /// Pollutant columns present, in canonical order
    pub fn pollutants(&self) -> Vec<Metric> {
        self.available
            .iter()
            .copied()
            .filter(Metric::is_pollutant)
            .collect()
    }

    /// Column values in row order; `None` where the mean is missing
    pub fn column(&self, metric: Metric) -> Vec<Option<f64>> {
        self.locations.iter().map(|l| l.mean(metric)).collect()
    }

    /// Attach labels by position. Lengths must match.
    pub fn assign_clusters(&mut self, labels: &[ClusterLabel]) {
        debug_assert_eq!(labels.len(), self.locations.len());
        for (location, &label) in self.locations.iter_mut().zip(labels) {
            location.cluster = Some(label);
        }
    }

    pub fn labels(&self) -> Vec<Option<ClusterLabel>> {
        self.locations.iter().map(|l| l.cluster).collect()
    }

    /// Distinct non-noise cluster ids, ascending
    pub fn cluster_ids(&self) -> Vec<ClusterLabel> {
        let mut ids: Vec<ClusterLabel> = self
            .locations
            .iter()
            .filter_map(|l| l.cluster)
            .filter(|&c| c != NOISE_LABEL)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
