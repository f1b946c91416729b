pub mod clean;
pub mod dataset;
pub mod features;
pub mod pipeline;
pub mod records;
pub mod zones;
