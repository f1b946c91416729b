//! Zone reference table: location id -> borough / zone / service zone.
//!
//! Loaded once per stage from the TLC zone lookup CSV and treated as
//! immutable for the rest of the run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Highest valid location id in the TLC zone map. The raw lookup table has
/// administrative rows beyond this bound; they are excluded at load time.
pub const MAX_LOCATION_ID: i32 = 263;

/// Category substituted when a location id has no entry in the reference
/// table. Must stay distinct from every real borough, zone and service-zone
/// value in the table.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Geographic names for a single location id.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneEntry {
    pub borough: String,
    pub zone: String,
    pub service_zone: String,
}

#[derive(Debug, Deserialize)]
struct ZoneRow {
    #[serde(rename = "LocationID")]
    location_id: i32,
    #[serde(rename = "Borough")]
    borough: String,
    #[serde(rename = "Zone")]
    zone: String,
    service_zone: String,
}

/// Immutable mapping from location id to [`ZoneEntry`], restricted to ids
/// in 1..=[`MAX_LOCATION_ID`].
#[derive(Debug, Default)]
pub struct ZoneLookup {
    entries: HashMap<i32, ZoneEntry>,
}

impl ZoneLookup {
    /// Loads the reference table from the TLC zone lookup CSV.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening zone lookup {}", path.display()))?;
        let lookup = Self::from_reader(file)
            .with_context(|| format!("reading zone lookup {}", path.display()))?;

        info!(
            entries = lookup.len(),
            path = %path.display(),
            "zone lookup loaded"
        );

        Ok(lookup)
    }

    /// Parses the reference table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut entries = HashMap::new();

        for result in rdr.deserialize() {
            let row: ZoneRow = result?;
            if row.location_id < 1 || row.location_id > MAX_LOCATION_ID {
                continue;
            }
            entries.insert(
                row.location_id,
                ZoneEntry {
                    borough: row.borough,
                    zone: row.zone,
                    service_zone: row.service_zone,
                },
            );
        }

        Ok(Self { entries })
    }

    /// Pure lookup. Out-of-range or unmapped ids return `None`; the caller
    /// decides how to surface the missing entry.
    pub fn resolve(&self, location_id: i32) -> Option<&ZoneEntry> {
        self.entries.get(&location_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All loaded entries, in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&i32, &ZoneEntry)> {
        self.entries.iter()
    }
}
