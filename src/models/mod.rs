pub mod location;
pub mod measurement;
pub mod metric;

pub use location::{ClusterLabel, LocationSummary, LocationTable, NOISE_LABEL};
pub use measurement::{Measurement, MeasurementTable};
pub use metric::{Metric, METRIC_COUNT};
