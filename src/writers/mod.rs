pub mod chart_writer;
pub mod csv_writer;
pub mod parquet_writer;

pub use chart_writer::{ChartData, ChartWriter};
pub use csv_writer::LocationCsvWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
