//! File-backed dataset artifacts: chunked CSV reads with progress
//! reporting and atomically published CSV writes.
//!
//! Gzip compression is chosen by file extension on both ends. Writes go to
//! a `.tmp` sibling first and are renamed into place, so a failed stage
//! never publishes a partial artifact.

use anyhow::{Context, Result, ensure};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::features::encode::OneHotEncoding;
use crate::records::{EnrichedTrip, TripRecord};

/// Row-count accumulator owned by the ingestion loop.
#[derive(Debug)]
pub struct Progress {
    started: Instant,
    rows_read: u64,
}

impl Progress {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            rows_read: 0,
        }
    }

    pub fn advance(&mut self, count: u64) {
        self.rows_read += count;
    }

    /// Total rows consumed so far; monotonically increasing.
    pub fn rows(&self) -> u64 {
        self.rows_read
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Rows kept from a load plus the total row count consumed from the file.
#[derive(Debug)]
pub struct LoadOutcome {
    pub trips: Vec<TripRecord>,
    pub rows_read: u64,
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("opening input file {}", path.display()))?;

    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Loads every trip from a CSV artifact.
pub fn load_trips(path: &Path, chunk_size: usize) -> Result<Vec<TripRecord>> {
    Ok(load_trips_where(path, chunk_size, |_| true)?.trips)
}

/// Streams a trip log in chunks, keeping rows matching `keep`.
///
/// Chunking only bounds peak logging granularity and lets progress surface
/// while a large file is consumed; the result is identical to reading the
/// whole input in one pass.
pub fn load_trips_where(
    path: &Path,
    chunk_size: usize,
    keep: impl Fn(&TripRecord) -> bool,
) -> Result<LoadOutcome> {
    info!(path = %path.display(), "loading file");

    let mut reader = csv::Reader::from_reader(open_reader(path)?);
    let mut progress = Progress::start();
    let mut trips = Vec::new();
    let mut pending = 0u64;

    for result in reader.deserialize() {
        let trip: TripRecord =
            result.with_context(|| format!("reading trip row from {}", path.display()))?;
        if keep(&trip) {
            trips.push(trip);
        }

        pending += 1;
        if pending == chunk_size as u64 {
            progress.advance(pending);
            pending = 0;
            info!(
                rows_read = progress.rows(),
                rows_kept = trips.len(),
                elapsed_secs = progress.elapsed().as_secs(),
                "chunk ingested"
            );
        }
    }
    progress.advance(pending);

    info!(
        rows_read = progress.rows(),
        rows_kept = trips.len(),
        elapsed_secs = progress.elapsed().as_secs(),
        "load complete"
    );

    Ok(LoadOutcome {
        trips,
        rows_read: progress.rows(),
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes through a `.tmp` sibling and renames into place on success. The
/// rename is the last action, so consumers either see the complete artifact
/// or none at all.
fn publish(path: &Path, write: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
    let tmp = tmp_path(path);

    let result = (|| -> Result<()> {
        let file = File::create(&tmp)
            .with_context(|| format!("creating output file {}", tmp.display()))?;

        if is_gzip(path) {
            let mut encoder = GzEncoder::new(file, Compression::default());
            write(&mut encoder)?;
            encoder.finish().context("finishing gzip stream")?;
        } else {
            let mut file = file;
            write(&mut file)?;
            file.flush()?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => fs::rename(&tmp, path)
            .with_context(|| format!("publishing artifact {}", path.display())),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Saves a trip batch as a CSV artifact.
pub fn write_trips(trips: &[TripRecord], path: &Path) -> Result<()> {
    info!(path = %path.display(), rows = trips.len(), "saving file");

    publish(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        for trip in trips {
            writer.serialize(trip)?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Saves the final modeling dataset: enriched columns followed by the
/// one-hot indicator columns, one row per trip.
pub fn write_encoded(
    trips: &[EnrichedTrip],
    encoding: &OneHotEncoding,
    path: &Path,
) -> Result<()> {
    ensure!(
        trips.len() == encoding.rows.len(),
        "encoding has {} rows for {} trips",
        encoding.rows.len(),
        trips.len()
    );

    info!(
        path = %path.display(),
        rows = trips.len(),
        indicator_columns = encoding.columns.len(),
        "saving file"
    );

    publish(path, |out| {
        let mut writer = csv::Writer::from_writer(out);

        let mut header: Vec<&str> = EnrichedTrip::csv_header().to_vec();
        header.extend(encoding.columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (trip, indicators) in trips.iter().zip(&encoding.rows) {
            let mut record = trip.csv_fields();
            record.extend(indicators.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("taxi_airport_pipeline_{}", name))
    }

    fn trip(pickup_id: i32, dropoff_id: i32) -> TripRecord {
        TripRecord {
            pickup_datetime: NaiveDate::from_ymd_opt(2017, 6, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            dropoff_datetime: NaiveDate::from_ymd_opt(2017, 6, 1)
                .unwrap()
                .and_hms_opt(8, 20, 0)
                .unwrap(),
            pickup_location_id: pickup_id,
            dropoff_location_id: dropoff_id,
            trip_distance: 12.0,
        }
    }

    #[test]
    fn test_write_read_round_trip_plain() {
        let path = temp_path("round_trip.csv");
        let _ = fs::remove_file(&path);

        let trips = vec![trip(1, 132), trip(50, 138)];
        write_trips(&trips, &path).unwrap();
        let loaded = load_trips(&path, 100).unwrap();

        assert_eq!(loaded, trips);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_read_round_trip_gzip() {
        let path = temp_path("round_trip.csv.gz");
        let _ = fs::remove_file(&path);

        let trips = vec![trip(1, 132), trip(50, 138)];
        write_trips(&trips, &path).unwrap();

        // the artifact really is gzip, not plain text
        let raw = fs::read(&path).unwrap();
        assert_eq!(raw[0], 0x1f);
        assert_eq!(raw[1], 0x8b);

        let loaded = load_trips(&path, 100).unwrap();
        assert_eq!(loaded, trips);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let path = temp_path("publish.csv");
        let _ = fs::remove_file(&path);

        write_trips(&[trip(1, 132)], &path).unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_chunked_read_equals_single_pass() {
        let path = temp_path("chunked.csv");
        let _ = fs::remove_file(&path);

        let trips: Vec<_> = (1..=7).map(|i| trip(i, 132)).collect();
        write_trips(&trips, &path).unwrap();

        let chunked = load_trips(&path, 2).unwrap();
        let single = load_trips(&path, 1_000).unwrap();

        assert_eq!(chunked, single);
        assert_eq!(chunked, trips);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_filtered_load_reports_total_rows_read() {
        let path = temp_path("filtered.csv");
        let _ = fs::remove_file(&path);

        let trips = vec![trip(1, 132), trip(1, 50), trip(1, 138)];
        write_trips(&trips, &path).unwrap();

        let outcome = load_trips_where(&path, 100, |t| t.dropoff_location_id == 132).unwrap();

        assert_eq!(outcome.rows_read, 3);
        assert_eq!(outcome.trips.len(), 1);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut progress = Progress::start();

        let mut seen = Vec::new();
        for count in [5, 0, 12, 3] {
            progress.advance(count);
            seen.push(progress.rows());
        }

        assert_eq!(seen, vec![5, 5, 17, 20]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let result = load_trips(&temp_path("does_not_exist.csv"), 100);
        assert!(result.is_err());
    }
}
