//! Stage sequencing and checkpointing.
//!
//! Each stage reads the previous stage's artifact and publishes a new one.
//! A stage whose output artifact already exists is skipped without
//! recomputation; the artifact is the checkpoint.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::clean::{AirportFilter, TripCleaner};
use crate::dataset;
use crate::features::derive::FeatureDeriver;
use crate::features::encode::{default_columns, one_hot_encode};
use crate::zones::ZoneLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageStatus {
    Skipped,
    Completed,
}

/// Outcome of one stage run, logged as JSON at debug level.
#[derive(Debug, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub status: StageStatus,
    pub rows_in: usize,
    pub rows_out: usize,
}

impl StageReport {
    fn skipped(stage: &'static str) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            rows_in: 0,
            rows_out: 0,
        }
    }

    fn completed(stage: &'static str, rows_in: usize, rows_out: usize) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
            rows_in,
            rows_out,
        }
    }
}

/// Every file path the pipeline touches, passed in explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub raw_trips: PathBuf,
    pub airport_trips: PathBuf,
    pub cleaned_trips: PathBuf,
    pub model_dataset: PathBuf,
    pub zone_lookup: PathBuf,
    pub chunk_size: usize,
}

impl PipelineConfig {
    /// Artifact layout of the NYC 2017 yellow-taxi dataset drop.
    pub fn default_layout() -> Self {
        Self {
            raw_trips: PathBuf::from("nyc-2017-yellow-taxi-trips.csv.gz"),
            airport_trips: PathBuf::from("nyc-2017-yellow-taxi-trips-to-airport.csv.gz"),
            cleaned_trips: PathBuf::from("nyc-2017-yellow-taxi-trips-to-airport-cleaned.csv.gz"),
            model_dataset: PathBuf::from(
                "nyc-2017-yellow-taxi-trips-to-airport-transformed.csv.gz",
            ),
            zone_lookup: PathBuf::from("nyc-taxi-zone-lookup.csv"),
            chunk_size: 100_000,
        }
    }
}

fn checkpoint(stage: &'static str, output: &Path) -> Option<StageReport> {
    if output.exists() {
        info!(stage, output = %output.display(), "output file exists, skipping");
        Some(StageReport::skipped(stage))
    } else {
        None
    }
}

/// Stage 1: extract airport-bound trips from the raw transaction log.
pub fn run_extract(config: &PipelineConfig) -> Result<StageReport> {
    if let Some(report) = checkpoint("extract", &config.airport_trips) {
        return Ok(report);
    }
    info!("=== nyc taxi to airport - extract airport trips");

    let filter = AirportFilter::nyc();
    let outcome =
        dataset::load_trips_where(&config.raw_trips, config.chunk_size, |t| filter.matches(t))?;
    dataset::write_trips(&outcome.trips, &config.airport_trips)?;

    Ok(StageReport::completed(
        "extract",
        outcome.rows_read as usize,
        outcome.trips.len(),
    ))
}

/// Stage 2: drop structurally invalid rows and normalize pickup ids.
pub fn run_clean(config: &PipelineConfig) -> Result<StageReport> {
    if let Some(report) = checkpoint("clean", &config.cleaned_trips) {
        return Ok(report);
    }
    info!("=== nyc taxi to airport - clean data");

    let trips = dataset::load_trips(&config.airport_trips, config.chunk_size)?;
    let rows_in = trips.len();

    let outcome = TripCleaner::nyc().clean(trips);
    info!(
        dropped_bad_location = outcome.dropped_bad_location,
        dropped_non_causal = outcome.dropped_non_causal,
        normalized_pickups = outcome.normalized_pickups,
        rows_out = outcome.trips.len(),
        "clean complete"
    );

    dataset::write_trips(&outcome.trips, &config.cleaned_trips)?;

    Ok(StageReport::completed("clean", rows_in, outcome.trips.len()))
}

/// Stage 3: derive features and one-hot encode the categorical columns.
pub fn run_transform(config: &PipelineConfig) -> Result<StageReport> {
    if let Some(report) = checkpoint("transform", &config.model_dataset) {
        return Ok(report);
    }
    info!("=== nyc taxi to airport - transform");

    let zones = ZoneLookup::from_csv(&config.zone_lookup)?;
    let trips = dataset::load_trips(&config.cleaned_trips, config.chunk_size)?;

    info!("translate location ids to zones, expand datetimes");
    let deriver = FeatureDeriver::new(&zones);
    let enriched = deriver.derive_all(&trips)?;

    info!("one hot encoding");
    let columns = default_columns();
    let encoding = one_hot_encode(&enriched, &columns);
    info!(
        indicator_columns = encoding.columns.len(),
        "one hot encoding complete"
    );

    dataset::write_encoded(&enriched, &encoding, &config.model_dataset)?;

    Ok(StageReport::completed(
        "transform",
        trips.len(),
        enriched.len(),
    ))
}

/// Runs the full pipeline in order, honoring per-stage checkpoints.
pub fn run_all(config: &PipelineConfig) -> Result<Vec<StageReport>> {
    let reports = vec![
        run_extract(config)?,
        run_clean(config)?,
        run_transform(config)?,
    ];

    for report in &reports {
        debug!(report = %serde_json::to_string(report)?, "stage report");
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_existing_output_skips_without_reading_input() {
        let dir = env::temp_dir().join("taxi_airport_pipeline_checkpoint");
        fs::create_dir_all(&dir).unwrap();

        let mut config = PipelineConfig::default_layout();
        // input deliberately absent: a skip must not touch it
        config.raw_trips = dir.join("missing-input.csv.gz");
        config.airport_trips = dir.join("existing-output.csv");
        fs::write(&config.airport_trips, "sentinel").unwrap();

        let report = run_extract(&config).unwrap();

        assert_eq!(report.status, StageStatus::Skipped);
        let content = fs::read_to_string(&config.airport_trips).unwrap();
        assert_eq!(content, "sentinel");

        fs::remove_file(&config.airport_trips).unwrap();
    }
}
