//! Core types for the bikeshare explorer.
//!
//! Holds the selection catalog, trip and dataset models, the error type,
//! timestamp helpers, number formatting and CLI settings shared by the data
//! and binary crates.

pub mod catalog;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{BikeshareError, Result};
