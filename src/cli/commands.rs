use crate::analyzers::HotspotReport;
use crate::cli::args::{Cli, Commands};
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::models::Metric;
use crate::processors::{HotspotPipeline, SeasonFilter};
use crate::readers::{LocationReader, MeasurementReader};
use crate::utils::progress::ProgressReporter;
use crate::writers::{ChartData, ChartWriter, LocationCsvWriter, ParquetWriter};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub fn run(cli: Cli) -> Result<()> {
    let config = DetectionConfig::load(cli.config.as_deref())?;
    debug!("Base configuration: {:?}", config);

    match cli.command {
        Commands::Detect {
            input,
            clusters_out,
            hotspots_out,
            chart_out,
            no_chart,
            parquet_out,
            compression,
            eps,
            min_samples,
            delimiter,
            top,
        } => {
            let mut config = config;
            if let Some(v) = input {
                config.input = v;
            }
            if let Some(v) = clusters_out {
                config.clusters_out = v;
            }
            if let Some(v) = hotspots_out {
                config.hotspots_out = v;
            }
            if chart_out.is_some() {
                config.chart_out = chart_out;
            }
            if no_chart {
                config.chart_out = None;
            }
            if parquet_out.is_some() {
                config.parquet_out = parquet_out;
            }
            if let Some(v) = eps {
                config.eps = v;
            }
            if let Some(v) = min_samples {
                config.min_samples = v;
            }
            if let Some(v) = delimiter {
                config.delimiter = v;
            }
            if let Some(v) = top {
                config.top_n = v;
            }

            detect(&config, &compression)
        }

        Commands::Inspect { input, delimiter } => {
            let mut config = config;
            if let Some(v) = input {
                config.input = v;
            }
            if let Some(v) = delimiter {
                config.delimiter = v;
            }
            config.check()?;

            inspect(&config)
        }

        Commands::Report { file, json, top } => {
            config.check()?;
            let table = LocationReader::new()
                .with_delimiter(config.delimiter_byte())
                .read_path(&file)?;
            let report = HotspotReport::from_table(&table, top);

            if json {
                println!("{}", serde_json::to_string_pretty(&report.to_summary())?);
            } else {
                println!("Analyzing clusters file: {}", file.display());
                println!("\n{}", report.detailed_summary());
            }
            Ok(())
        }
    }
}

fn detect(config: &DetectionConfig, compression: &str) -> Result<()> {
    let pipeline = HotspotPipeline::new(config)?;
    let parquet_writer = ParquetWriter::new().with_compression(compression)?;

    println!("Detecting winter pollution hotspots...");
    println!("Input file: {}", config.input.display());
    println!("eps: {}, min_samples: {}", config.eps, config.min_samples);

    let progress = ProgressReporter::new_spinner("Running detection...", false);
    let outcome = pipeline.run_path(&config.input, Some(&progress))?;

    println!("Loaded {} records", outcome.total_rows);
    println!("Winter records: {}", outcome.seasonal_rows);
    println!("Locations: {}", outcome.locations.len());
    let names: Vec<&str> = outcome.features.features.iter().map(|m| m.column_name()).collect();
    println!("Clustering features: {}", names.join(", "));

    println!("\n{}", outcome.report.detailed_summary());

    let csv_writer = LocationCsvWriter::new().with_delimiter(config.delimiter_byte());
    csv_writer.write_path(&outcome.locations, &config.clusters_out)?;
    println!("\nSaved: {}", config.clusters_out.display());

    if outcome.report.hotspot_count() > 0 {
        let hotspots = outcome.report.to_table(&outcome.locations);
        csv_writer.write_path(&hotspots, &config.hotspots_out)?;
        println!("Saved: {}", config.hotspots_out.display());
    } else {
        info!("No hotspots; {} not written", config.hotspots_out.display());
    }

    if let Some(path) = &config.chart_out {
        let data = ChartData::build(&outcome.locations, &outcome.features);
        ChartWriter::new().write(&data, path)?;
        println!("Saved: {}", path.display());
    }

    if let Some(path) = &config.parquet_out {
        parquet_writer.write_locations(&outcome.locations, path)?;
        println!("Saved: {}", path.display());
        println!("\n{}", parquet_writer.get_file_info(path)?.summary());
    }

    Ok(())
}

fn inspect(config: &DetectionConfig) -> Result<()> {
    println!("Inspecting measurement file: {}", config.input.display());

    let table = MeasurementReader::new()
        .with_delimiter(config.delimiter_byte())
        .read_path(&config.input)?;
    let seasonal = SeasonFilter::new(&config.months).apply(&table);
    let locations: BTreeSet<(&str, &str)> = table.records.iter().map(|r| r.location_key()).collect();

    println!("Total rows: {}", table.len());
    println!("Seasonal rows (months {:?}): {}", config.months, seasonal.len());
    println!("Distinct locations: {}", locations.len());
    match table.date_range() {
        Some((first, last)) => println!("Date range: {} to {}", first, last),
        None => println!("Date range: -"),
    }

    println!("\nColumns:");
    for metric in Metric::ALL {
        if table.has_metric(metric) {
            println!(
                "  {:<16} present, {} missing",
                metric.column_name(),
                table.missing_count(metric)
            );
        } else {
            println!("  {:<16} absent", metric.column_name());
        }
    }

    Ok(())
}
