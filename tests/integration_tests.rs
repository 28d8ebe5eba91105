use aq_hotspots::cli::{run, Cli, Commands};
use aq_hotspots::config::DetectionConfig;
use aq_hotspots::models::{Metric, NOISE_LABEL};
use aq_hotspots::processors::HotspotPipeline;
use aq_hotspots::readers::LocationReader;
use aq_hotspots::writers::LocationCsvWriter;
use aq_hotspots::ProcessingError;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

const HEADER: &str = "event_timestamp,city,location_id,pm25,pm10,aqi,temperature";

/// Four similar stations and one extreme one, each seen in December and
/// February, plus a July spike that must not count
fn measurement_csv() -> String {
    let stations = [
        ("L1", 100.0, 180.0, 200.0),
        ("L2", 102.0, 182.0, 204.0),
        ("L3", 99.0, 179.0, 198.0),
        ("L4", 101.0, 181.0, 202.0),
        ("L5", 420.0, 600.0, 490.0),
    ];

    let mut lines = vec![HEADER.to_string()];
    for (id, pm25, pm10, aqi) in stations {
        for ts in ["2023-12-05 08:00:00", "2024-02-10T17:30:00+05:30"] {
            lines.push(format!("{ts},Delhi,{id},{pm25},{pm10},{aqi},12.5"));
        }
    }
    lines.push("2023-07-01 12:00:00,Delhi,L1,950,990,500,35".to_string());
    lines.join("\n")
}

fn write_input(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write input");
    file
}

fn config_for(input: &Path, dir: &Path) -> DetectionConfig {
    DetectionConfig {
        input: input.to_path_buf(),
        clusters_out: dir.join("clusters.csv"),
        hotspots_out: dir.join("hotspots.csv"),
        chart_out: None,
        ..DetectionConfig::default()
    }
}

#[test]
fn test_end_to_end_single_extreme_location() -> aq_hotspots::Result<()> {
    let input = write_input(&measurement_csv());
    let dir = TempDir::new()?;
    let config = config_for(input.path(), dir.path());

    let outcome = HotspotPipeline::new(&config)?.run_path(&config.input, None)?;

    assert_eq!(outcome.total_rows, 11);
    assert_eq!(outcome.seasonal_rows, 10);
    assert_eq!(
        outcome.features.features,
        vec![Metric::Pm25, Metric::Pm10, Metric::Aqi]
    );

    let labels: Vec<(String, Option<i32>)> = outcome
        .locations
        .locations
        .iter()
        .map(|l| (l.location_id.clone(), l.cluster))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("L1".to_string(), Some(0)),
            ("L2".to_string(), Some(0)),
            ("L3".to_string(), Some(0)),
            ("L4".to_string(), Some(0)),
            ("L5".to_string(), Some(NOISE_LABEL)),
        ]
    );

    let top = outcome.report.top_entries();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].location_id, "L5");
    assert_eq!(top[0].aqi, Some(490.0));
    Ok(())
}

#[test]
fn test_clusters_csv_round_trip() -> aq_hotspots::Result<()> {
    let input = write_input(&measurement_csv());
    let dir = TempDir::new()?;
    let config = config_for(input.path(), dir.path());

    let outcome = HotspotPipeline::new(&config)?.run_path(&config.input, None)?;
    LocationCsvWriter::new().write_path(&outcome.locations, &config.clusters_out)?;

    let back = LocationReader::new().read_path(&config.clusters_out)?;
    let triples = |table: &aq_hotspots::models::LocationTable| -> Vec<(String, String, Option<i32>)> {
        table
            .locations
            .iter()
            .map(|l| (l.city.clone(), l.location_id.clone(), l.cluster))
            .collect()
    };

    assert_eq!(back.len(), outcome.locations.len());
    assert_eq!(triples(&back), triples(&outcome.locations));
    assert_eq!(back.available, outcome.locations.available);
    Ok(())
}

#[test]
fn test_absent_pollutant_column_is_skipped() -> aq_hotspots::Result<()> {
    // no pm10 and no temperature
    let csv = "event_timestamp,city,location_id,pm25,aqi\n\
               2024-01-03 09:00:00,Delhi,A,120,210\n\
               2024-01-03 09:00:00,Delhi,B,125,215\n\
               2024-01-04 09:00:00,Delhi,A,,205\n";
    let input = write_input(csv);
    let dir = TempDir::new()?;
    let config = config_for(input.path(), dir.path());

    let outcome = HotspotPipeline::new(&config)?.run_path(&config.input, None)?;
    assert_eq!(outcome.locations.available, vec![Metric::Pm25, Metric::Aqi]);
    assert_eq!(outcome.features.features, vec![Metric::Pm25, Metric::Aqi]);
    assert_eq!(outcome.locations.locations[0].mean(Metric::Pm25), Some(120.0));
    assert_eq!(outcome.locations.locations[0].aqi(), Some(207.5));
    Ok(())
}

#[test]
fn test_single_location_is_hotspot() -> aq_hotspots::Result<()> {
    let csv = format!("{HEADER}\n2024-02-01 10:00:00,Delhi,Solo,80,120,150,9\n");
    let input = write_input(&csv);
    let dir = TempDir::new()?;
    let config = config_for(input.path(), dir.path());

    let outcome = HotspotPipeline::new(&config)?.run_path(&config.input, None)?;
    assert_eq!(outcome.locations.labels(), vec![Some(NOISE_LABEL)]);
    assert_eq!(outcome.report.hotspot_count(), 1);
    Ok(())
}

#[test]
fn test_no_winter_rows_fails() -> aq_hotspots::Result<()> {
    let csv = format!("{HEADER}\n2024-05-01 10:00:00,Delhi,A,80,120,150,30\n");
    let input = write_input(&csv);
    let dir = TempDir::new()?;
    let config = config_for(input.path(), dir.path());

    let result = HotspotPipeline::new(&config)?.run_path(&config.input, None);
    assert!(matches!(result, Err(ProcessingError::NoData(_))));
    Ok(())
}

#[test]
fn test_missing_input_file_fails() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("absent.csv");
    let config = config_for(&missing, dir.path());

    let result = HotspotPipeline::new(&config).and_then(|p| p.run_path(&missing, None));
    assert!(matches!(result, Err(ProcessingError::Io(_))));
}

fn detect_command(input: PathBuf, dir: &Path) -> Cli {
    Cli {
        command: Commands::Detect {
            input: Some(input),
            clusters_out: Some(dir.join("out").join("clusters.csv")),
            hotspots_out: Some(dir.join("out").join("hotspots.csv")),
            chart_out: None,
            no_chart: true,
            parquet_out: Some(dir.join("out").join("clusters.parquet")),
            compression: "zstd".to_string(),
            eps: None,
            min_samples: None,
            delimiter: None,
            top: None,
        },
        verbose: false,
        log_file: None,
        config: None,
    }
}

#[test]
fn test_detect_command_writes_outputs() -> aq_hotspots::Result<()> {
    let input = write_input(&measurement_csv());
    let dir = TempDir::new()?;

    run(detect_command(input.path().to_path_buf(), dir.path()))?;

    let clusters = dir.path().join("out").join("clusters.csv");
    let hotspots = dir.path().join("out").join("hotspots.csv");
    assert!(clusters.exists());
    assert!(dir.path().join("out").join("clusters.parquet").exists());

    let hot = LocationReader::new().read_path(&hotspots)?;
    assert_eq!(hot.len(), 1);
    assert_eq!(hot.locations[0].location_id, "L5");
    assert_eq!(hot.locations[0].cluster, Some(NOISE_LABEL));

    run(Cli {
        command: Commands::Report {
            file: clusters,
            json: true,
            top: 5,
        },
        verbose: false,
        log_file: None,
        config: None,
    })?;
    Ok(())
}

#[test]
fn test_no_hotspot_file_when_all_clustered() -> aq_hotspots::Result<()> {
    let csv = format!(
        "{HEADER}\n\
         2024-01-01 10:00:00,Delhi,A,100,180,200,10\n\
         2024-01-01 10:00:00,Delhi,B,100,180,200,10\n"
    );
    let input = write_input(&csv);
    let dir = TempDir::new()?;

    run(detect_command(input.path().to_path_buf(), dir.path()))?;

    assert!(dir.path().join("out").join("clusters.csv").exists());
    assert!(!dir.path().join("out").join("hotspots.csv").exists());
    Ok(())
}

#[test]
fn test_report_rejects_non_ascii_delimiter() -> aq_hotspots::Result<()> {
    let dir = TempDir::new()?;
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "delimiter = \"é\"\n")?;
    let clusters = dir.path().join("clusters.csv");
    std::fs::write(&clusters, "city,location_id,aqi,cluster\nDelhi,A,200,-1\n")?;

    let result = run(Cli {
        command: Commands::Report {
            file: clusters,
            json: false,
            top: 10,
        },
        verbose: false,
        log_file: None,
        config: Some(settings),
    });

    assert!(matches!(result, Err(ProcessingError::Config(_))));
    Ok(())
}
