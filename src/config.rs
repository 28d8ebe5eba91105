use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_CHART_FILE, DEFAULT_CLUSTERS_FILE, DEFAULT_EPS, DEFAULT_HOTSPOTS_FILE,
    DEFAULT_INPUT_FILE, DEFAULT_MIN_SAMPLES, DEFAULT_TOP_N, ENV_PREFIX, WINTER_MONTHS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Every tunable of a detection run.
///
/// Values are layered: defaults, then an optional TOML file, then
/// `AQ_HOTSPOTS_*` environment variables. CLI options are applied on top
/// by the caller before [`DetectionConfig::check`] runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DetectionConfig {
    pub input: PathBuf,
    pub clusters_out: PathBuf,
    pub hotspots_out: PathBuf,
    pub chart_out: Option<PathBuf>,
    pub parquet_out: Option<PathBuf>,

    #[validate(range(exclusive_min = 0.0))]
    pub eps: f64,

    #[validate(range(min = 1))]
    pub min_samples: usize,

    #[validate(length(min = 1))]
    pub months: Vec<u32>,

    #[validate(range(min = 1))]
    pub top_n: usize,

    pub delimiter: char,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_FILE),
            clusters_out: PathBuf::from(DEFAULT_CLUSTERS_FILE),
            hotspots_out: PathBuf::from(DEFAULT_HOTSPOTS_FILE),
            chart_out: Some(PathBuf::from(DEFAULT_CHART_FILE)),
            parquet_out: None,
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
            months: WINTER_MONTHS.to_vec(),
            top_n: DEFAULT_TOP_N,
            delimiter: ',',
        }
    }
}

impl DetectionConfig {
    /// Merge defaults, an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = file {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("months"),
        );

        let merged: DetectionConfig = builder.build()?.try_deserialize()?;
        Ok(merged)
    }

    /// Field checks plus the month set and delimiter
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if let Some(bad) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ProcessingError::Config(format!("Invalid month: {}", bad)));
        }
        if !self.delimiter.is_ascii() {
            return Err(ProcessingError::Config(format!(
                "Delimiter must be ASCII, got '{}'",
                self.delimiter
            )));
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = DetectionConfig::default();
        assert_eq!(cfg.eps, 1.2);
        assert_eq!(cfg.min_samples, 2);
        assert_eq!(cfg.months, vec![12, 1, 2]);
        assert_eq!(cfg.top_n, 10);
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut cfg = DetectionConfig {
            eps: 0.0,
            ..Default::default()
        };
        assert!(cfg.check().is_err());

        cfg.eps = 1.0;
        cfg.months = vec![13];
        assert!(cfg.check().is_err());

        cfg.months = vec![];
        assert!(cfg.check().is_err());

        cfg.months = vec![1];
        cfg.min_samples = 0;
        assert!(cfg.check().is_err());
    }

    #[test]
    fn test_load_from_toml_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "eps = 0.8")?;
        writeln!(file, "min_samples = 3")?;
        writeln!(file, "months = [11, 12]")?;

        let cfg = DetectionConfig::load(Some(file.path()))?;
        assert_eq!(cfg.eps, 0.8);
        assert_eq!(cfg.min_samples, 3);
        assert_eq!(cfg.months, vec![11, 12]);
        assert_eq!(cfg.top_n, DEFAULT_TOP_N);
        Ok(())
    }

    #[test]
    fn test_missing_config_file() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("missing.toml");
        assert!(matches!(
            DetectionConfig::load(Some(&path)),
            Err(ProcessingError::Config(_))
        ));
    }
}
