use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::metric::{Metric, METRIC_COUNT};

/// A single timestamped reading for one monitoring location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub city: String,
    pub location_id: String,
    pub readings: [Option<f64>; METRIC_COUNT],
}

impl Measurement {
    pub fn new(timestamp: NaiveDateTime, city: String, location_id: String) -> Self {
        Self {
            timestamp,
            city,
            location_id,
            readings: [None; METRIC_COUNT],
        }
    }

    pub fn with_reading(mut self, metric: Metric, value: f64) -> Self {
        self.readings[metric.index()] = Some(value);
        self
    }

    pub fn reading(&self, metric: Metric) -> Option<f64> {
        self.readings[metric.index()]
    }

    pub fn set_reading(&mut self, metric: Metric, value: Option<f64>) {
        self.readings[metric.index()] = value;
    }

    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn location_key(&self) -> (&str, &str) {
        (&self.city, &self.location_id)
    }
}

/// Loaded measurements plus the metric columns the source file carried.
///
/// `available` preserves the canonical metric order regardless of the
/// column order in the input header.
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    pub records: Vec<Measurement>,
    pub available: Vec<Metric>,
}

impl MeasurementTable {
    pub fn new(records: Vec<Measurement>, mut available: Vec<Metric>) -> Self {
        available.sort();
        available.dedup();
        Self { records, available }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_metric(&self, metric: Metric) -> bool {
        self.available.contains(&metric)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.date();
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            let d = r.date();
            (lo.min(d), hi.max(d))
        }))
    }

    /// Count of missing cells for a column present in the source
    pub fn missing_count(&self, metric: Metric) -> usize {
        self.records
            .iter()
            .filter(|r| r.reading(metric).is_none())
            .count()
    }

    /// Keep rows matching `predicate`, preserving order and schema
    pub fn retain_rows<F>(&self, predicate: F) -> MeasurementTable
    where
        F: Fn(&Measurement) -> bool,
    {
        MeasurementTable {
            records: self
                .records
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
            available: self.available.clone(),
        }
    }
}
