//! Row-level filtering and cleanup ahead of feature derivation.

use crate::records::TripRecord;
use crate::zones::MAX_LOCATION_ID;

/// Dropoff location ids of the three NYC airports.
pub const NEWARK: i32 = 1;
pub const JFK: i32 = 132;
pub const LAGUARDIA: i32 = 138;

/// Retains trips ending at one of a configured set of dropoff locations.
/// Used by the ingestion stage only.
#[derive(Debug, Clone)]
pub struct AirportFilter {
    dropoff_ids: Vec<i32>,
}

impl AirportFilter {
    pub fn new(dropoff_ids: Vec<i32>) -> Self {
        Self { dropoff_ids }
    }

    /// The NYC airport set: Newark, JFK and LaGuardia.
    pub fn nyc() -> Self {
        Self::new(vec![NEWARK, JFK, LAGUARDIA])
    }

    pub fn matches(&self, trip: &TripRecord) -> bool {
        self.dropoff_ids.contains(&trip.dropoff_location_id)
    }
}

/// Surviving rows plus counters for what the cleaner did.
#[derive(Debug, Default)]
pub struct CleanOutcome {
    pub trips: Vec<TripRecord>,
    pub dropped_bad_location: usize,
    pub dropped_non_causal: usize,
    pub normalized_pickups: usize,
}

/// Drops structurally invalid rows and folds aliased pickup ids into their
/// canonical id.
#[derive(Debug, Clone)]
pub struct TripCleaner {
    max_location_id: i32,
    pickup_aliases: Vec<(i32, i32)>,
}

impl TripCleaner {
    pub fn new(max_location_id: i32, pickup_aliases: Vec<(i32, i32)>) -> Self {
        Self {
            max_location_id,
            pickup_aliases,
        }
    }

    /// The NYC configuration: ids valid in 1..=263, pickup ids 104 and 105
    /// folded into 103. Dropoff ids are left as-is; the asymmetry matches
    /// the upstream dataset conventions this pipeline reproduces.
    pub fn nyc() -> Self {
        Self::new(MAX_LOCATION_ID, vec![(104, 103), (105, 103)])
    }

    fn location_id_valid(&self, id: i32) -> bool {
        (1..=self.max_location_id).contains(&id)
    }

    /// Cleans a batch. Deterministic and order-preserving for surviving
    /// rows; after it returns, every trip has both location ids in range
    /// and a strictly positive duration.
    pub fn clean(&self, trips: Vec<TripRecord>) -> CleanOutcome {
        let mut outcome = CleanOutcome::default();

        for mut trip in trips {
            if !self.location_id_valid(trip.pickup_location_id)
                || !self.location_id_valid(trip.dropoff_location_id)
            {
                outcome.dropped_bad_location += 1;
                continue;
            }

            if trip.dropoff_datetime <= trip.pickup_datetime {
                outcome.dropped_non_causal += 1;
                continue;
            }

            let canonical = self
                .pickup_aliases
                .iter()
                .find(|(alias, _)| *alias == trip.pickup_location_id)
                .map(|(_, canonical)| *canonical);
            if let Some(canonical) = canonical {
                trip.pickup_location_id = canonical;
                outcome.normalized_pickups += 1;
            }

            outcome.trips.push(trip);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn trip(pickup_id: i32, dropoff_id: i32) -> TripRecord {
        TripRecord {
            pickup_datetime: at(8, 0),
            dropoff_datetime: at(8, 20),
            pickup_location_id: pickup_id,
            dropoff_location_id: dropoff_id,
            trip_distance: 12.0,
        }
    }

    #[test]
    fn test_airport_filter_is_exact() {
        let filter = AirportFilter::nyc();
        let input = vec![
            trip(10, NEWARK),
            trip(10, 50),
            trip(10, JFK),
            trip(10, 131),
            trip(10, LAGUARDIA),
        ];

        let kept: Vec<_> = input.iter().filter(|t| filter.matches(t)).collect();

        assert_eq!(kept.len(), 3);
        assert!(
            kept.iter()
                .all(|t| [NEWARK, JFK, LAGUARDIA].contains(&t.dropoff_location_id))
        );
    }

    #[test]
    fn test_out_of_range_ids_dropped() {
        let cleaner = TripCleaner::nyc();
        let outcome = cleaner.clean(vec![
            trip(500, 132),
            trip(1, 264),
            trip(0, 132),
            trip(-3, 132),
            trip(1, 0),
            trip(1, 132),
        ]);

        assert_eq!(outcome.trips.len(), 1);
        assert_eq!(outcome.dropped_bad_location, 5);
        assert_eq!(outcome.trips[0], trip(1, 132));
    }

    #[test]
    fn test_non_causal_timestamps_dropped() {
        let cleaner = TripCleaner::nyc();

        let backwards = TripRecord {
            pickup_datetime: at(9, 0),
            dropoff_datetime: at(8, 0),
            ..trip(1, 132)
        };
        let zero_duration = TripRecord {
            pickup_datetime: at(8, 0),
            dropoff_datetime: at(8, 0),
            ..trip(1, 132)
        };

        let outcome = cleaner.clean(vec![backwards, zero_duration, trip(1, 132)]);

        assert_eq!(outcome.trips.len(), 1);
        assert_eq!(outcome.dropped_non_causal, 2);
    }

    #[test]
    fn test_surviving_rows_satisfy_invariants() {
        let cleaner = TripCleaner::nyc();
        let outcome = cleaner.clean(vec![
            trip(104, 132),
            trip(263, 1),
            trip(264, 1),
            trip(50, 138),
        ]);

        for t in &outcome.trips {
            assert!((1..=263).contains(&t.pickup_location_id));
            assert!((1..=263).contains(&t.dropoff_location_id));
            assert!(t.dropoff_datetime > t.pickup_datetime);
        }
    }

    #[test]
    fn test_pickup_alias_normalization() {
        let cleaner = TripCleaner::nyc();
        let outcome = cleaner.clean(vec![trip(104, 132), trip(105, 132), trip(103, 132)]);

        assert!(outcome.trips.iter().all(|t| t.pickup_location_id == 103));
        assert_eq!(outcome.normalized_pickups, 2);
    }

    #[test]
    fn test_dropoff_alias_left_unnormalized() {
        // Regression guard: only pickup ids are folded. A dropoff of 104
        // must come out unchanged.
        let cleaner = TripCleaner::nyc();
        let outcome = cleaner.clean(vec![trip(50, 104)]);

        assert_eq!(outcome.trips[0].dropoff_location_id, 104);
        assert_eq!(outcome.normalized_pickups, 0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let cleaner = TripCleaner::nyc();
        let once = cleaner.clean(vec![trip(104, 132), trip(105, 138), trip(7, 1)]);
        let twice = cleaner.clean(once.trips.clone());

        assert_eq!(once.trips, twice.trips);
        assert_eq!(twice.normalized_pickups, 0);
    }

    #[test]
    fn test_order_preserved() {
        let cleaner = TripCleaner::nyc();
        let outcome = cleaner.clean(vec![
            trip(3, 132),
            trip(500, 132),
            trip(1, 138),
            trip(2, 1),
        ]);

        let pickups: Vec<_> = outcome
            .trips
            .iter()
            .map(|t| t.pickup_location_id)
            .collect();
        assert_eq!(pickups, vec![3, 1, 2]);
    }
}
