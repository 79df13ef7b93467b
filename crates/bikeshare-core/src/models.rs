use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{BikeshareError, Result};
use crate::time_utils;

/// Label used for trips whose gender value is missing.
pub const UNKNOWN_GENDER: &str = "Unknown";

/// A single bike trip read from a city's trip file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// When the trip started (timezone-naive local time).
    pub start_time: NaiveDateTime,
    /// When the trip ended.
    pub end_time: NaiveDateTime,
    /// Trip length in seconds.
    pub trip_duration: f64,
    pub start_station: String,
    pub end_station: String,
    /// Rider category, e.g. `"Subscriber"` or `"Customer"`. May be empty.
    pub user_type: String,
    /// Rider gender; `None` when the cell was empty.
    #[serde(default)]
    pub gender: Option<String>,
    /// Rider birth year; `None` when the cell was empty or not numeric.
    #[serde(default)]
    pub birth_year: Option<i32>,
    /// Month of `start_time`, 1–12.
    pub month: u32,
    /// Full weekday name of `start_time`, e.g. `"Monday"`.
    pub day_of_week: String,
    /// Hour of `start_time`, 0–23.
    pub hour: u32,
}

impl TripRecord {
    /// Build a record and derive its calendar fields from `start_time`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        trip_duration: f64,
        start_station: impl Into<String>,
        end_station: impl Into<String>,
        user_type: impl Into<String>,
        gender: Option<String>,
        birth_year: Option<i32>,
    ) -> Self {
        Self {
            month: start_time.month(),
            day_of_week: time_utils::day_of_week(&start_time).to_string(),
            hour: start_time.hour(),
            start_time,
            end_time,
            trip_duration,
            start_station: start_station.into(),
            end_station: end_station.into(),
            user_type: user_type.into(),
            gender,
            birth_year,
        }
    }
}

/// Which optional columns the source file carried.
///
/// Presence is a property of the whole dataset, never of a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub gender: bool,
    pub birth_year: bool,
}

/// The (city, month, weekday) triple a dataset was loaded for, as canonical
/// catalog keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub city: String,
    pub month: String,
    pub weekday: String,
}

impl Selection {
    pub fn new(
        city: impl Into<String>,
        month: impl Into<String>,
        weekday: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            month: month.into(),
            weekday: weekday.into(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.city, self.month, self.weekday)
    }
}

/// Row counters collected while loading a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Data rows read from the source (header excluded).
    pub rows_read: usize,
    /// Rows excluded because a required field could not be parsed.
    pub malformed_rows: usize,
    /// Rows left after the month/weekday filter.
    pub rows_retained: usize,
}

/// The sorted, filtered, field-enriched trip records for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub selection: Selection,
    pub columns: ColumnSet,
    pub stats: LoadStats,
    records: Vec<TripRecord>,
}

impl Dataset {
    /// Build a dataset, sorting `records` by start time.
    ///
    /// The sort is stable: trips with equal start times keep source order.
    pub fn new(
        selection: Selection,
        columns: ColumnSet,
        mut records: Vec<TripRecord>,
        stats: LoadStats,
    ) -> Self {
        records.sort_by_key(|r| r.start_time);
        Self {
            selection,
            columns,
            stats,
            records,
        }
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return `self`, or [`BikeshareError::EmptyResult`] when no trips
    /// survived the filter.
    pub fn ensure_not_empty(&self) -> Result<&Self> {
        if self.is_empty() {
            return Err(BikeshareError::EmptyResult {
                selection: self.selection.to_string(),
            });
        }
        Ok(self)
    }
}

// ── Report result wrappers ────────────────────────────────────────────────────

/// Result of a report over a dataset that may be empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The dataset had no trips to aggregate.
    NoData,
    Computed(T),
}

impl<T> Outcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Outcome::NoData)
    }

    /// The computed value, if any.
    pub fn computed(self) -> Option<T> {
        match self {
            Outcome::NoData => None,
            Outcome::Computed(value) => Some(value),
        }
    }
}

/// Result of a statistic that depends on an optional column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Availability<T> {
    /// The column is absent, or holds no usable value in scope.
    NotAvailable,
    Available(T),
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn available(self) -> Option<T> {
        match self {
            Availability::NotAvailable => None,
            Availability::Available(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Availability<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Availability::NotAvailable, Availability::Available)
    }
}
