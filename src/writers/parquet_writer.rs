use crate::error::{ProcessingError, Result};
use crate::models::{LocationSummary, LocationTable, Metric};
use crate::utils::constants::{
    CITY_COLUMN, CLUSTER_COLUMN, COMPRESSION_GZIP, COMPRESSION_NONE, COMPRESSION_SNAPPY,
    COMPRESSION_ZSTD, LOCATION_COLUMN,
};
use arrow::array::{Array, ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Columnar export of the aggregated location table
pub struct ParquetWriter {
    compression: Compression,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    /// Same column layout as the CSV export: keys, available means, cluster
    fn create_schema(&self, metrics: &[Metric]) -> Arc<Schema> {
        let mut fields = vec![
            Field::new(CITY_COLUMN, DataType::Utf8, false),
            Field::new(LOCATION_COLUMN, DataType::Utf8, false),
        ];
        fields.extend(
            metrics
                .iter()
                .map(|m| Field::new(m.column_name(), DataType::Float64, true)),
        );
        fields.push(Field::new(CLUSTER_COLUMN, DataType::Int32, true));

        Arc::new(Schema::new(fields))
    }

    fn table_to_batch(&self, table: &LocationTable, schema: Arc<Schema>) -> Result<RecordBatch> {
        let cities: Vec<String> = table.locations.iter().map(|l| l.city.clone()).collect();
        let ids: Vec<String> = table
            .locations
            .iter()
            .map(|l| l.location_id.clone())
            .collect();
        let clusters: Vec<Option<i32>> = table.locations.iter().map(|l| l.cluster).collect();

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(cities)),
            Arc::new(StringArray::from(ids)),
        ];
        for metric in &table.available {
            columns.push(Arc::new(Float64Array::from(table.column(*metric))));
        }
        columns.push(Arc::new(Int32Array::from(clusters)));

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    pub fn write_locations(&self, table: &LocationTable, path: &Path) -> Result<()> {
        let schema = self.create_schema(&table.available);
        let batch = self.table_to_batch(table, schema.clone())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        info!("Wrote {} locations to {}", table.len(), path.display());
        Ok(())
    }

    /// Read a location table written by [`ParquetWriter::write_locations`]
    pub fn read_locations(&self, path: &Path) -> Result<LocationTable> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut locations = Vec::new();
        let mut available: Vec<Metric> = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let strings = |name: &str| -> Result<StringArray> {
                batch
                    .column_by_name(name)
                    .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                    .cloned()
                    .ok_or_else(|| ProcessingError::MissingColumn(name.to_string()))
            };
            let cities = strings(CITY_COLUMN)?;
            let ids = strings(LOCATION_COLUMN)?;
            let clusters = batch
                .column_by_name(CLUSTER_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .cloned();

            let metric_columns: Vec<(Metric, Float64Array)> = batch
                .schema()
                .fields()
                .iter()
                .enumerate()
                .filter_map(|(i, f)| {
                    let metric = Metric::from_column_name(f.name())?;
                    let array = batch.column(i).as_any().downcast_ref::<Float64Array>()?;
                    Some((metric, array.clone()))
                })
                .collect();
            available = metric_columns.iter().map(|(m, _)| *m).collect();

            for row in 0..batch.num_rows() {
                let mut location =
                    LocationSummary::new(cities.value(row).to_string(), ids.value(row).to_string());
                for (metric, array) in &metric_columns {
                    let value = (!array.is_null(row)).then(|| array.value(row));
                    location.set_mean(*metric, value);
                }
                location.cluster = clusters
                    .as_ref()
                    .filter(|c| !c.is_null(row))
                    .map(|c| c.value(row));
                locations.push(location);
            }
        }

        Ok(LocationTable::new(locations, available))
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: metadata.num_row_groups() as i32,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}
