/// Required input columns
pub const TIMESTAMP_COLUMN: &str = "event_timestamp";
pub const CITY_COLUMN: &str = "city";
pub const LOCATION_COLUMN: &str = "location_id";
pub const CLUSTER_COLUMN: &str = "cluster";

/// Default file names
pub const DEFAULT_INPUT_FILE: &str = "delhi_air_quality_processed.csv";
pub const DEFAULT_CLUSTERS_FILE: &str = "DELHI_WINTER_CLUSTERS.csv";
pub const DEFAULT_HOTSPOTS_FILE: &str = "DELHI_WINTER_HOTSPOTS.csv";
pub const DEFAULT_CHART_FILE: &str = "DELHI_WINTER_HOTSPOTS.svg";

/// Winter months (Dec, Jan, Feb)
pub const WINTER_MONTHS: [u32; 3] = [12, 1, 2];

/// DBSCAN defaults
pub const DEFAULT_EPS: f64 = 1.2;
pub const DEFAULT_MIN_SAMPLES: usize = 2;

/// Reporting defaults
pub const DEFAULT_TOP_N: usize = 10;
pub const PCA_COMPONENTS: usize = 2;

/// Cell values treated as missing
pub const NULL_TOKENS: [&str; 7] = ["", "nan", "NaN", "NA", "N/A", "null", "None"];

/// Chart canvas (15x10 inches at 100 dpi)
pub const CHART_WIDTH: u32 = 1500;
pub const CHART_HEIGHT: u32 = 1000;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "AQ_HOTSPOTS";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
