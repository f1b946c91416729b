//! CLI entry point for the airport-trip pipeline.
//!
//! Provides one subcommand per pipeline stage plus `run` for the whole
//! sequence. A stage that finds its output artifact already present logs
//! the skip and exits successfully.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use taxi_airport_pipeline::pipeline::{self, PipelineConfig, StageReport};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "taxi_airport_pipeline")]
#[command(
    about = "Batch pipeline turning the NYC taxi log into an airport-trip modeling dataset",
    long_about = None
)]
struct Cli {
    /// JSON log file location
    #[arg(long, default_value = "logs/taxi_airport_pipeline.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract trips ending at an NYC airport from the raw transaction log
    Extract {
        /// Raw transaction log (CSV, gzipped by extension)
        #[arg(short, long, default_value = "nyc-2017-yellow-taxi-trips.csv.gz")]
        input: PathBuf,

        /// Airport-only artifact to write
        #[arg(
            short,
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport.csv.gz"
        )]
        output: PathBuf,

        /// Rows per ingestion chunk
        #[arg(long, default_value_t = 100_000)]
        chunk_size: usize,
    },
    /// Drop invalid rows and normalize pickup location ids
    Clean {
        /// Airport-only artifact from the extract stage
        #[arg(
            short,
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport.csv.gz"
        )]
        input: PathBuf,

        /// Cleaned artifact to write
        #[arg(
            short,
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport-cleaned.csv.gz"
        )]
        output: PathBuf,

        /// Rows per ingestion chunk
        #[arg(long, default_value_t = 100_000)]
        chunk_size: usize,
    },
    /// Derive features and one-hot encode the final modeling dataset
    Transform {
        /// Cleaned artifact from the clean stage
        #[arg(
            short,
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport-cleaned.csv.gz"
        )]
        input: PathBuf,

        /// Modeling dataset to write
        #[arg(
            short,
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport-transformed.csv.gz"
        )]
        output: PathBuf,

        /// TLC zone lookup table
        #[arg(long, default_value = "nyc-taxi-zone-lookup.csv")]
        zone_lookup: PathBuf,

        /// Rows per ingestion chunk
        #[arg(long, default_value_t = 100_000)]
        chunk_size: usize,
    },
    /// Run all stages in order, skipping already completed ones
    Run {
        /// Raw transaction log
        #[arg(long, default_value = "nyc-2017-yellow-taxi-trips.csv.gz")]
        raw_trips: PathBuf,

        /// Airport-only artifact
        #[arg(long, default_value = "nyc-2017-yellow-taxi-trips-to-airport.csv.gz")]
        airport_trips: PathBuf,

        /// Cleaned artifact
        #[arg(
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport-cleaned.csv.gz"
        )]
        cleaned_trips: PathBuf,

        /// Final modeling dataset
        #[arg(
            long,
            default_value = "nyc-2017-yellow-taxi-trips-to-airport-transformed.csv.gz"
        )]
        model_dataset: PathBuf,

        /// TLC zone lookup table
        #[arg(long, default_value = "nyc-taxi-zone-lookup.csv")]
        zone_lookup: PathBuf,

        /// Rows per ingestion chunk
        #[arg(long, default_value_t = 100_000)]
        chunk_size: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = cli.log_file.parent().unwrap_or(Path::new("logs"));
    let log_file_name = cli
        .log_file
        .file_name()
        .unwrap_or(OsStr::new("taxi_airport_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    match cli.command {
        Commands::Extract {
            input,
            output,
            chunk_size,
        } => {
            let config = PipelineConfig {
                raw_trips: input,
                airport_trips: output,
                chunk_size,
                ..PipelineConfig::default_layout()
            };
            log_report(&pipeline::run_extract(&config)?);
        }
        Commands::Clean {
            input,
            output,
            chunk_size,
        } => {
            let config = PipelineConfig {
                airport_trips: input,
                cleaned_trips: output,
                chunk_size,
                ..PipelineConfig::default_layout()
            };
            log_report(&pipeline::run_clean(&config)?);
        }
        Commands::Transform {
            input,
            output,
            zone_lookup,
            chunk_size,
        } => {
            let config = PipelineConfig {
                cleaned_trips: input,
                model_dataset: output,
                zone_lookup,
                chunk_size,
                ..PipelineConfig::default_layout()
            };
            log_report(&pipeline::run_transform(&config)?);
        }
        Commands::Run {
            raw_trips,
            airport_trips,
            cleaned_trips,
            model_dataset,
            zone_lookup,
            chunk_size,
        } => {
            let config = PipelineConfig {
                raw_trips,
                airport_trips,
                cleaned_trips,
                model_dataset,
                zone_lookup,
                chunk_size,
            };
            for report in pipeline::run_all(&config)? {
                log_report(&report);
            }
        }
    }

    info!("done");
    Ok(())
}

fn log_report(report: &StageReport) {
    info!(
        stage = report.stage,
        status = ?report.status,
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        "stage finished"
    );
}
