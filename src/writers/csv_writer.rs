use crate::error::Result;
use crate::models::LocationTable;
use crate::utils::constants::{CITY_COLUMN, CLUSTER_COLUMN, LOCATION_COLUMN};
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Writes location tables as delimited text with no index column
pub struct LocationCsvWriter {
    delimiter: u8,
}

impl LocationCsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn header(&self, table: &LocationTable) -> Vec<String> {
        let mut header = vec![CITY_COLUMN.to_string(), LOCATION_COLUMN.to_string()];
        header.extend(table.available.iter().map(|m| m.column_name().to_string()));
        header.push(CLUSTER_COLUMN.to_string());
        header
    }

    pub fn write_to<W: Write>(&self, table: &LocationTable, sink: W) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);

        writer.write_record(self.header(table))?;

        for location in &table.locations {
            let mut row = vec![location.city.clone(), location.location_id.clone()];
            row.extend(
                table
                    .available
                    .iter()
                    .map(|m| location.mean(*m).map(|v| v.to_string()).unwrap_or_default()),
            );
            row.push(location.cluster.map(|c| c.to_string()).unwrap_or_default());
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write to `path` through a sibling temp file so readers never see a
    /// partially written table
    pub fn write_path(&self, table: &LocationTable, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        self.write_to(table, staged.as_file_mut())?;
        staged.persist(path).map_err(|e| e.error)?;

        info!("Wrote {} locations to {}", table.len(), path.display());
        Ok(())
    }
}

impl Default for LocationCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationSummary, Metric};
    use crate::readers::LocationReader;
    use tempfile::TempDir;

    fn sample() -> LocationTable {
        let mut a = LocationSummary::new("Delhi".into(), "Anand Vihar".into())
            .with_mean(Metric::Pm25, 245.125)
            .with_mean(Metric::Temperature, 11.5);
        a.cluster = Some(-1);
        let mut b = LocationSummary::new("Delhi".into(), "Lodhi Road".into())
            .with_mean(Metric::Aqi, 180.0);
        b.cluster = Some(0);
        LocationTable::new(vec![a, b], vec![Metric::Pm25, Metric::Aqi, Metric::Temperature])
    }

    #[test]
    fn test_header_and_empty_cells() -> Result<()> {
        let mut buf = Vec::new();
        LocationCsvWriter::new().write_to(&sample(), &mut buf)?;
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "city,location_id,pm25,aqi,temperature,cluster");
        assert_eq!(lines[1], "Delhi,Anand Vihar,245.125,,11.5,-1");
        assert_eq!(lines[2], "Delhi,Lodhi Road,,180,,0");
        Ok(())
    }

    #[test]
    fn test_write_path_creates_directories() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out").join("clusters.csv");
        LocationCsvWriter::new().write_path(&sample(), &path)?;

        let back = LocationReader::new().read_path(&path)?;
        assert_eq!(back.len(), 2);
        assert_eq!(back.locations[0].mean(Metric::Pm25), Some(245.125));
        assert_eq!(back.locations[1].cluster, Some(0));
        Ok(())
    }
}
