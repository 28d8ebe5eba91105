use crate::error::{ProcessingError, Result};
use crate::models::{Measurement, MeasurementTable, Metric};
use crate::utils::constants::{CITY_COLUMN, LOCATION_COLUMN, NULL_TOKENS, TIMESTAMP_COLUMN};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse the timestamp shapes found in exported monitoring data.
///
/// Offsets are dropped after parsing: the wall-clock time at the station
/// decides the month.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a numeric cell; recognised null tokens become `None`
pub fn parse_reading(value: &str) -> std::result::Result<Option<f64>, String> {
    let value = value.trim();
    if NULL_TOKENS.contains(&value) {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(format!("'{}' is not a number", value)),
    }
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct HeaderLayout {
    timestamp: usize,
    city: usize,
    location: usize,
    metrics: Vec<(Metric, usize)>,
}

impl HeaderLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ProcessingError::MissingColumn(name.to_string()))
        };

        let timestamp = find(TIMESTAMP_COLUMN)?;
        let city = find(CITY_COLUMN)?;
        let location = find(LOCATION_COLUMN)?;

        let mut metrics: Vec<(Metric, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| Metric::from_column_name(h).map(|m| (m, i)))
            .collect();
        metrics.sort_by_key(|(m, _)| *m);
        metrics.dedup_by_key(|(m, _)| *m);

        Ok(Self {
            timestamp,
            city,
            location,
            metrics,
        })
    }
}

/// Reads raw measurement rows from a delimited file
pub struct MeasurementReader {
    delimiter: u8,
}

impl MeasurementReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load every row of the file at `path`
    pub fn read_path(&self, path: &Path) -> Result<MeasurementTable> {
        let file = File::open(path)?;
        let table = self.read_from(file)?;
        info!(
            "Loaded {} rows from {} ({} metric columns)",
            table.len(),
            path.display(),
            table.available.len()
        );
        Ok(table)
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<MeasurementTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(false)
            .from_reader(source);

        let layout = HeaderLayout::from_headers(reader.headers()?)?;

        let present: Vec<Metric> = layout.metrics.iter().map(|(m, _)| *m).collect();
        for metric in Metric::ALL.iter().filter(|m| !present.contains(m)) {
            debug!("Column '{}' not present in input, skipping", metric);
        }

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
            records.push(self.parse_row(&row, &layout, line)?);
        }

        Ok(MeasurementTable::new(records, present))
    }

    fn parse_row(&self, row: &StringRecord, layout: &HeaderLayout, line: usize) -> Result<Measurement> {
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let raw_ts = cell(layout.timestamp);
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| ProcessingError::TimestampParse {
            row: line,
            value: raw_ts.to_string(),
        })?;

        let mut measurement = Measurement::new(
            timestamp,
            cell(layout.city).to_string(),
            cell(layout.location).to_string(),
        );

        for &(metric, idx) in &layout.metrics {
            let value = parse_reading(cell(idx)).map_err(|e| {
                ProcessingError::InvalidFormat(format!("row {}, column '{}': {}", line, metric, e))
            })?;
            measurement.set_reading(metric, value);
        }

        Ok(measurement)
    }
}

impl Default for MeasurementReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2023-01-15 08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-15T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-15T08:30:00+05:30"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-15 08:30:00+05:30"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-15 08:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2023-01-15"),
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("15/01/2023"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_reading() {
        assert_eq!(parse_reading("42.5"), Ok(Some(42.5)));
        assert_eq!(parse_reading(""), Ok(None));
        assert_eq!(parse_reading("NaN"), Ok(None));
        assert_eq!(parse_reading("null"), Ok(None));
        assert!(parse_reading("high").is_err());
    }

    #[test]
    fn test_read_csv_with_partial_schema() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "event_timestamp,city,location_id,pm25,aqi,humidity")?;
        writeln!(file, "2023-01-01 00:00:00,Delhi,L1,210.5,380,71")?;
        writeln!(file, "2023-06-01 00:00:00,Delhi,L2,,95,")?;

        let table = MeasurementReader::new().read_path(file.path())?;

        assert_eq!(table.len(), 2);
        assert_eq!(table.available, vec![Metric::Pm25, Metric::Aqi, Metric::Humidity]);
        assert_eq!(table.records[0].reading(Metric::Pm25), Some(210.5));
        assert_eq!(table.records[1].reading(Metric::Pm25), None);
        assert_eq!(table.records[1].reading(Metric::Humidity), None);
        assert_eq!(table.records[1].reading(Metric::Co), None);
        Ok(())
    }

    #[test]
    fn test_missing_required_column() {
        let data = "timestamp,city,location_id,pm25\n2023-01-01,Delhi,L1,1\n";
        let err = MeasurementReader::new().read_from(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ProcessingError::MissingColumn(c) if c == "event_timestamp"));
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let data = "event_timestamp,city,location_id\nyesterday,Delhi,L1\n";
        let err = MeasurementReader::new().read_from(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ProcessingError::TimestampParse { row: 2, .. }));
    }

    #[test]
    fn test_custom_delimiter() -> Result<()> {
        let data = "event_timestamp;city;location_id;pm10\n2022-12-24 10:00:00;Delhi;L9;150\n";
        let table = MeasurementReader::new()
            .with_delimiter(b';')
            .read_from(data.as_bytes())?;
        assert_eq!(table.records[0].reading(Metric::Pm10), Some(150.0));
        assert_eq!(table.records[0].month(), 12);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = MeasurementReader::new()
            .read_path(Path::new("/nonexistent/air_quality.csv"))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Io(_)));
    }
}
