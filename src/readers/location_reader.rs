use crate::error::{ProcessingError, Result};
use crate::models::{LocationSummary, LocationTable, Metric};
use crate::readers::measurement_reader::parse_reading;
use crate::utils::constants::{CITY_COLUMN, CLUSTER_COLUMN, LOCATION_COLUMN};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads a previously exported location table back into memory
pub struct LocationReader {
    delimiter: u8,
}

impl LocationReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read_path(&self, path: &Path) -> Result<LocationTable> {
        let file = File::open(path)?;
        self.read_from(file)
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<LocationTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let city_idx = position(CITY_COLUMN)
            .ok_or_else(|| ProcessingError::MissingColumn(CITY_COLUMN.to_string()))?;
        let location_idx = position(LOCATION_COLUMN)
            .ok_or_else(|| ProcessingError::MissingColumn(LOCATION_COLUMN.to_string()))?;
        let cluster_idx = position(CLUSTER_COLUMN);

        let metrics: Vec<(Metric, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| Metric::from_column_name(h).map(|m| (m, i)))
            .collect();

        let mut locations = Vec::new();
        for result in reader.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let cell = |idx: usize| row.get(idx).unwrap_or("");

            let mut location =
                LocationSummary::new(cell(city_idx).to_string(), cell(location_idx).to_string());

            for &(metric, idx) in &metrics {
                let value = parse_reading(cell(idx)).map_err(|e| {
                    ProcessingError::InvalidFormat(format!("row {}, column '{}': {}", line, metric, e))
                })?;
                location.set_mean(metric, value);
            }

            if let Some(idx) = cluster_idx {
                let raw = cell(idx);
                if !raw.is_empty() {
                    location.cluster = Some(raw.parse::<i32>().map_err(|_| {
                        ProcessingError::InvalidFormat(format!(
                            "row {}: invalid cluster label '{}'",
                            line, raw
                        ))
                    })?);
                }
            }

            locations.push(location);
        }

        Ok(LocationTable::new(
            locations,
            metrics.into_iter().map(|(m, _)| m).collect(),
        ))
    }
}

impl Default for LocationReader {
    fn default() -> Self {
        Self::new()
    }
}
