//! Data layer for the bikeshare explorer.
//!
//! Loads a city's trip file into a filtered [`bikeshare_core::models::Dataset`]
//! and computes the time, station, duration, user and raw-row reports over it.

pub mod aggregator;
pub mod reader;
pub mod reports;

pub use bikeshare_core as core;
