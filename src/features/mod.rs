//! Feature derivation and categorical encoding for cleaned trips.
//!
//! This module expands location ids into zone categories, derives calendar
//! and duration/velocity variables from the trip timestamps, and one-hot
//! encodes the categorical columns into the final modeling dataset.

pub mod derive;
pub mod encode;

use thiserror::Error;

/// Domain errors raised during feature derivation.
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    /// A non-positive duration reached the deriver. The cleaner guarantees
    /// strictly increasing timestamps, so this signals that a stage ran out
    /// of order or on unclean input.
    #[error("trip duration is {minutes} minutes; velocity requires a positive duration")]
    NonPositiveDuration { minutes: f64 },
}
