use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aq-hotspots")]
#[command(about = "Winter air-quality hotspot detection with DBSCAN")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster locations and export hotspots
    Detect {
        #[arg(short, long, help = "Measurement CSV [default: delhi_air_quality_processed.csv]")]
        input: Option<PathBuf>,

        #[arg(long, help = "Per-location clusters CSV [default: DELHI_WINTER_CLUSTERS.csv]")]
        clusters_out: Option<PathBuf>,

        #[arg(long, help = "Hotspots CSV [default: DELHI_WINTER_HOTSPOTS.csv]")]
        hotspots_out: Option<PathBuf>,

        #[arg(long, help = "Dashboard image, .png or .svg [default: DELHI_WINTER_HOTSPOTS.svg]")]
        chart_out: Option<PathBuf>,

        #[arg(long, help = "Skip the dashboard")]
        no_chart: bool,

        #[arg(long, help = "Also write the clustered table as Parquet")]
        parquet_out: Option<PathBuf>,

        #[arg(long, default_value = "snappy", help = "Parquet compression: snappy, gzip, zstd or none")]
        compression: String,

        #[arg(long, help = "Neighbourhood radius in scaled units [default: 1.2]")]
        eps: Option<f64>,

        #[arg(long, help = "Neighbours (self included) needed for a core point [default: 2]")]
        min_samples: Option<usize>,

        #[arg(short, long, help = "CSV field delimiter [default: ,]")]
        delimiter: Option<char>,

        #[arg(long, help = "Hotspots listed in the report [default: 10]")]
        top: Option<usize>,
    },

    /// Describe a measurement file without clustering
    Inspect {
        #[arg(short, long, help = "Measurement CSV [default: delhi_air_quality_processed.csv]")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "CSV field delimiter [default: ,]")]
        delimiter: Option<char>,
    },

    /// Summarise a previously written clusters CSV
    Report {
        #[arg(help = "Clusters CSV produced by detect")]
        file: PathBuf,

        #[arg(long, help = "Print the summary as JSON")]
        json: bool,

        #[arg(long, default_value = "10")]
        top: usize,
    },
}
