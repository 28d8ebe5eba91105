use crate::analyzers::{Dbscan, HotspotReport};
use crate::config::DetectionConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{LocationTable, MeasurementTable};
use crate::processors::{FeatureScaler, LocationAggregator, ScaledFeatures, SeasonFilter};
use crate::readers::MeasurementReader;
use crate::utils::progress::ProgressReporter;
use std::path::Path;
use tracing::info;

/// Result of one detection run, ready for reporting and export
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub total_rows: usize,
    pub seasonal_rows: usize,
    /// One row per location with its cluster label assigned
    pub locations: LocationTable,
    pub features: ScaledFeatures,
    pub report: HotspotReport,
}

/// Load, filter, aggregate, scale and cluster
pub struct HotspotPipeline {
    filter: SeasonFilter,
    aggregator: LocationAggregator,
    scaler: FeatureScaler,
    dbscan: Dbscan,
    top_n: usize,
    delimiter: u8,
}

impl HotspotPipeline {
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            filter: SeasonFilter::new(&config.months),
            aggregator: LocationAggregator::new(),
            scaler: FeatureScaler::new(),
            dbscan: Dbscan::new(config.eps, config.min_samples)?,
            top_n: config.top_n,
            delimiter: config.delimiter_byte(),
        })
    }

    pub fn run_path(&self, path: &Path, progress: Option<&ProgressReporter>) -> Result<PipelineOutcome> {
        if let Some(p) = progress {
            p.set_message("Reading measurements...");
        }
        let table = MeasurementReader::new()
            .with_delimiter(self.delimiter)
            .read_path(path)?;
        self.run(&table, progress)
    }

    /// Everything after loading; `table` is left untouched
    pub fn run(&self, table: &MeasurementTable, progress: Option<&ProgressReporter>) -> Result<PipelineOutcome> {
        if let Some(p) = progress {
            p.set_message("Filtering season...");
        }
        let seasonal = self.filter.apply(table);
        if seasonal.is_empty() {
            return Err(ProcessingError::NoData(format!(
                "no rows fall in months {:?}",
                self.filter.months()
            )));
        }

        if let Some(p) = progress {
            p.set_message("Aggregating locations...");
        }
        let mut locations = self.aggregator.aggregate(&seasonal);

        if let Some(p) = progress {
            p.set_message("Scaling features...");
        }
        let features = self.scaler.scale(&locations)?;

        if let Some(p) = progress {
            p.set_message("Clustering...");
        }
        let labels = self.dbscan.fit_predict(&features.matrix);
        locations.assign_clusters(&labels);

        let report = HotspotReport::from_table(&locations, self.top_n);
        info!(
            "Clustered {} locations on {} features: {} clusters, {} hotspots",
            locations.len(),
            features.features.len(),
            locations.cluster_ids().len(),
            report.hotspot_count()
        );

        if let Some(p) = progress {
            p.finish_with_message("Detection complete");
        }

        Ok(PipelineOutcome {
            total_rows: table.len(),
            seasonal_rows: seasonal.len(),
            locations,
            features,
            report,
        })
    }
}
