//! Trip record types shared across the pipeline stages.
//!
//! `TripRecord` is the typed row flowing through extraction and cleaning;
//! `EnrichedTrip` is the feature-expanded row produced ahead of encoding.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wire format of the timestamps in the raw transaction log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde adapter for [`TIMESTAMP_FORMAT`] timestamps in CSV artifacts.
pub mod trip_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A single trip from the transaction log.
///
/// The raw log carries more columns (vendor, fares, surcharges); only the
/// modeling-relevant subset is deserialized, the rest is ignored. Location
/// ids are valid in 1..=263 after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    #[serde(rename = "tpep_pickup_datetime", with = "trip_datetime")]
    pub pickup_datetime: NaiveDateTime,

    #[serde(rename = "tpep_dropoff_datetime", with = "trip_datetime")]
    pub dropoff_datetime: NaiveDateTime,

    #[serde(rename = "PULocationID")]
    pub pickup_location_id: i32,

    #[serde(rename = "DOLocationID")]
    pub dropoff_location_id: i32,

    pub trip_distance: f64,
}

/// A cleaned trip expanded with zone, calendar, duration and velocity
/// features. Raw location id columns do not survive into this type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTrip {
    pub pickup_datetime: NaiveDateTime,
    pub dropoff_datetime: NaiveDateTime,
    pub trip_distance: f64,

    // zone categories
    pub pickup_borough: String,
    pub pickup_zone: String,
    pub pickup_service_zone: String,
    pub dropoff_zone: String,

    // calendar categories from the dropoff timestamp
    pub dropoff_month: u32,
    pub dropoff_week_of_year: u32,
    pub dropoff_day_of_year: u32,
    pub dropoff_day_of_month: u32,
    pub dropoff_weekday: u32,
    pub dropoff_is_weekend: bool,
    pub dropoff_hour: u32,

    // duration and velocity
    pub trip_duration_minutes: f64,
    pub trip_duration_hours: f64,
    pub trip_velocity: f64,
}

impl EnrichedTrip {
    /// Column names for the CSV representation, in field order.
    pub fn csv_header() -> &'static [&'static str] {
        &[
            "pickup_datetime",
            "dropoff_datetime",
            "trip_distance",
            "pickup_borough",
            "pickup_zone",
            "pickup_service_zone",
            "dropoff_zone",
            "dropoff_month",
            "dropoff_week_of_year",
            "dropoff_day_of_year",
            "dropoff_day_of_month",
            "dropoff_weekday",
            "dropoff_is_weekend",
            "dropoff_hour",
            "trip_duration_minutes",
            "trip_duration_hours",
            "trip_velocity",
        ]
    }

    /// CSV cell values matching [`EnrichedTrip::csv_header`].
    pub fn csv_fields(&self) -> Vec<String> {
        vec![
            self.pickup_datetime.format(TIMESTAMP_FORMAT).to_string(),
            self.dropoff_datetime.format(TIMESTAMP_FORMAT).to_string(),
            self.trip_distance.to_string(),
            self.pickup_borough.clone(),
            self.pickup_zone.clone(),
            self.pickup_service_zone.clone(),
            self.dropoff_zone.clone(),
            self.dropoff_month.to_string(),
            self.dropoff_week_of_year.to_string(),
            self.dropoff_day_of_year.to_string(),
            self.dropoff_day_of_month.to_string(),
            self.dropoff_weekday.to_string(),
            self.dropoff_is_weekend.to_string(),
            self.dropoff_hour.to_string(),
            self.trip_duration_minutes.to_string(),
            self.trip_duration_hours.to_string(),
            self.trip_velocity.to_string(),
        ]
    }
}
