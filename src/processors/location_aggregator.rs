use crate::models::{LocationSummary, LocationTable, MeasurementTable, Metric, METRIC_COUNT};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Sort key for a location id: integer ids order by value and come before
/// any non-numeric id, which order as text
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LocationOrder {
    Numeric(i64, String),
    Text(String),
}

impl LocationOrder {
    fn new(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) => LocationOrder::Numeric(n, id.to_string()),
            Err(_) => LocationOrder::Text(id.to_string()),
        }
    }

    fn into_id(self) -> String {
        match self {
            LocationOrder::Numeric(_, id) | LocationOrder::Text(id) => id,
        }
    }
}

/// Groups measurements by (city, location_id) and averages each metric
pub struct LocationAggregator {
    candidates: Vec<Metric>,
}

impl LocationAggregator {
    pub fn new() -> Self {
        Self {
            candidates: Metric::ALL.to_vec(),
        }
    }

    /// One output row per distinct key, ordered by city then location id.
    /// Rows with a blank city or location id belong to no group and are
    /// skipped.
    pub fn aggregate(&self, table: &MeasurementTable) -> LocationTable {
        let metrics: Vec<Metric> = self
            .candidates
            .iter()
            .copied()
            .filter(|m| {
                let present = table.has_metric(*m);
                if !present {
                    debug!("Skipping '{}': column not in dataset", m);
                }
                present
            })
            .collect();

        let mut groups: BTreeMap<(String, LocationOrder), [RunningMean; METRIC_COUNT]> =
            BTreeMap::new();
        let mut skipped = 0usize;
        for record in &table.records {
            if record.city.trim().is_empty() || record.location_id.trim().is_empty() {
                skipped += 1;
                continue;
            }
            let key = (record.city.clone(), LocationOrder::new(&record.location_id));
            let acc = groups.entry(key).or_insert([RunningMean::default(); METRIC_COUNT]);
            for metric in &metrics {
                if let Some(value) = record.reading(*metric) {
                    acc[metric.index()].push(value);
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {} rows with a blank city or location_id", skipped);
        }

        let locations: Vec<LocationSummary> = groups
            .into_iter()
            .map(|((city, order), acc)| {
                let mut summary = LocationSummary::new(city, order.into_id());
                for metric in &metrics {
                    summary.set_mean(*metric, acc[metric.index()].value());
                }
                summary
            })
            .collect();

        info!(
            "Aggregated {} rows into {} locations over {} metrics",
            table.len(),
            locations.len(),
            metrics.len()
        );

        LocationTable::new(locations, metrics)
    }
}

impl Default for LocationAggregator {
    fn default() -> Self {
        Self::new()
    }
}
