//! Derives zone, calendar, duration and velocity features from cleaned
//! trips.

use chrono::{Datelike, Timelike};

use crate::features::FeatureError;
use crate::records::{EnrichedTrip, TripRecord};
use crate::zones::{UNKNOWN_CATEGORY, ZoneLookup};

/// Expands a [`TripRecord`] into an [`EnrichedTrip`], resolving zone names
/// through the reference table.
pub struct FeatureDeriver<'a> {
    zones: &'a ZoneLookup,
}

impl<'a> FeatureDeriver<'a> {
    pub fn new(zones: &'a ZoneLookup) -> Self {
        Self { zones }
    }

    /// Derives all features for one cleaned trip.
    ///
    /// Location ids without a reference entry map to [`UNKNOWN_CATEGORY`]
    /// rather than failing; the id columns themselves do not survive into
    /// the output.
    ///
    /// # Errors
    ///
    /// [`FeatureError::NonPositiveDuration`] if the trip duration is not
    /// strictly positive, which the cleaner is expected to have ruled out.
    pub fn derive(&self, trip: &TripRecord) -> Result<EnrichedTrip, FeatureError> {
        let pickup = self.zones.resolve(trip.pickup_location_id);
        let dropoff = self.zones.resolve(trip.dropoff_location_id);

        let category = |value: Option<&String>| {
            value
                .map(String::clone)
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
        };

        let dropoff_datetime = trip.dropoff_datetime;
        let weekday = dropoff_datetime.weekday().num_days_from_monday();

        let trip_duration_minutes =
            (dropoff_datetime - trip.pickup_datetime).num_seconds() as f64 / 60.0;
        if trip_duration_minutes <= 0.0 {
            return Err(FeatureError::NonPositiveDuration {
                minutes: trip_duration_minutes,
            });
        }
        let trip_duration_hours = trip_duration_minutes / 60.0;
        let trip_velocity = trip.trip_distance / trip_duration_hours;

        Ok(EnrichedTrip {
            pickup_datetime: trip.pickup_datetime,
            dropoff_datetime,
            trip_distance: trip.trip_distance,

            pickup_borough: category(pickup.map(|e| &e.borough)),
            pickup_zone: category(pickup.map(|e| &e.zone)),
            pickup_service_zone: category(pickup.map(|e| &e.service_zone)),
            dropoff_zone: category(dropoff.map(|e| &e.zone)),

            dropoff_month: dropoff_datetime.month(),
            dropoff_week_of_year: dropoff_datetime.iso_week().week(),
            dropoff_day_of_year: dropoff_datetime.ordinal(),
            dropoff_day_of_month: dropoff_datetime.day(),
            dropoff_weekday: weekday,
            dropoff_is_weekend: weekday >= 5,
            dropoff_hour: dropoff_datetime.hour(),

            trip_duration_minutes,
            trip_duration_hours,
            trip_velocity,
        })
    }

    /// Derives features for a whole batch, preserving row order.
    pub fn derive_all(&self, trips: &[TripRecord]) -> Result<Vec<EnrichedTrip>, FeatureError> {
        trips.iter().map(|trip| self.derive(trip)).collect()
    }
}
