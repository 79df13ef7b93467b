//! Trip file loading for the bikeshare explorer.
//!
//! Reads one city's trip CSV, parses and enriches every row into a
//! [`TripRecord`], applies the month/weekday filter and returns a sorted
//! [`Dataset`].

use std::fs::File;
use std::path::{Path, PathBuf};

use bikeshare_core::catalog::{Catalog, Category, ALL};
use bikeshare_core::error::{BikeshareError, Result};
use bikeshare_core::models::{ColumnSet, Dataset, LoadStats, Selection, TripRecord};
use bikeshare_core::time_utils::parse_timestamp;
use tracing::{debug, warn};

// ── Column names ──────────────────────────────────────────────────────────────

pub const START_TIME: &str = "Start Time";
pub const END_TIME: &str = "End Time";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

/// Malformed rows logged individually before switching to a summary.
const MAX_ROW_WARNINGS: usize = 5;

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the trips of `city` from `data_dir`, filtered by `month` and
/// `weekday`.
///
/// All three selections go through the catalog, so keys, display numbers
/// and aliases are accepted; `"all"` disables the month or weekday filter.
/// Records come back sorted by start time.
pub fn load(
    catalog: &Catalog,
    data_dir: &Path,
    city: &str,
    month: &str,
    weekday: &str,
) -> Result<Dataset> {
    let city_key = catalog.resolve(Category::City, city)?.to_string();
    let month_key = selection_key(catalog, Category::Month, month)?;
    let weekday_key = selection_key(catalog, Category::Weekday, weekday)?;

    let filter = TripFilter {
        month: catalog.month_code(&month_key)?,
        weekday: catalog.weekday_key(&weekday_key)?.map(str::to_string),
    };
    let path = data_dir.join(catalog.city_filename(&city_key)?);
    let selection = Selection::new(city_key, month_key, weekday_key);

    debug!("Loading {} from {}", selection, path.display());
    let file = read_trip_file(&path)?;

    let records: Vec<TripRecord> = file
        .records
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect();

    let stats = LoadStats {
        rows_read: file.rows_read,
        malformed_rows: file.malformed_rows,
        rows_retained: records.len(),
    };
    debug!(
        "Read {} rows from {} ({} malformed, {} retained)",
        stats.rows_read,
        path.display(),
        stats.malformed_rows,
        stats.rows_retained
    );

    Ok(Dataset::new(selection, file.columns, records, stats))
}

/// The parsed content of one trip file, before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct TripFile {
    pub path: PathBuf,
    pub columns: ColumnSet,
    pub records: Vec<TripRecord>,
    pub rows_read: usize,
    pub malformed_rows: usize,
}

/// Read and parse every row of a trip CSV.
///
/// Rows that cannot be parsed are skipped and counted. The file is an
/// error only when it has data rows and none of them parse.
pub fn read_trip_file(path: &Path) -> Result<TripFile> {
    let handle = File::open(path).map_err(|source| BikeshareError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(handle);

    let headers = reader
        .headers()
        .map_err(|e| BikeshareError::SourceUnavailable {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?
        .clone();
    let layout = ColumnLayout::from_headers(&headers, path)?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut malformed_rows = 0usize;

    for (idx, result) in reader.records().enumerate() {
        rows_read += 1;
        // Header is line 1.
        let line = idx + 2;

        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|row| parse_record(&layout, &row));

        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => {
                malformed_rows += 1;
                if malformed_rows <= MAX_ROW_WARNINGS {
                    warn!("Skipping {}:{line}: {reason}", path.display());
                }
            }
        }
    }

    if malformed_rows > MAX_ROW_WARNINGS {
        warn!(
            "Skipped {} malformed rows in {} ({} shown)",
            malformed_rows,
            path.display(),
            MAX_ROW_WARNINGS
        );
    }

    if rows_read > 0 && records.is_empty() {
        return Err(BikeshareError::MalformedRecord {
            path: path.to_path_buf(),
            rows: malformed_rows,
        });
    }

    Ok(TripFile {
        path: path.to_path_buf(),
        columns: layout.column_set(),
        records,
        rows_read,
        malformed_rows,
    })
}

/// Coerce a birth-year cell; anything non-numeric, non-finite or outside the
/// `i32` range is unknown.
///
/// Accepts float spellings such as `"1985.0"`.
pub fn parse_birth_year(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value
        .parse::<f64>()
        .ok()
        .map(f64::trunc)
        .filter(|year| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(year))
        .map(|year| year as i32)
}

// ── Filtering ─────────────────────────────────────────────────────────────────

/// Month/weekday predicate applied after parsing. `None` keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripFilter {
    pub month: Option<u32>,
    /// Canonical weekday key, e.g. `"monday"`.
    pub weekday: Option<String>,
}

impl TripFilter {
    pub fn matches(&self, record: &TripRecord) -> bool {
        self.month.map_or(true, |m| record.month == m)
            && self
                .weekday
                .as_deref()
                .map_or(true, |day| record.day_of_week.eq_ignore_ascii_case(day))
    }
}

// ── Internals ─────────────────────────────────────────────────────────────────

/// Canonical key for a month/weekday selection, keeping the `"all"`
/// sentinel even when a custom catalog table does not list it.
fn selection_key(catalog: &Catalog, category: Category, candidate: &str) -> Result<String> {
    if candidate.trim().eq_ignore_ascii_case(ALL) {
        return Ok(ALL.to_string());
    }
    catalog.resolve(category, candidate).map(str::to_string)
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    start_time: usize,
    end_time: usize,
    trip_duration: usize,
    start_station: usize,
    end_station: usize,
    user_type: usize,
    gender: Option<usize>,
    birth_year: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord, path: &Path) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| BikeshareError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
        };

        Ok(Self {
            start_time: require(START_TIME)?,
            end_time: require(END_TIME)?,
            trip_duration: require(TRIP_DURATION)?,
            start_station: require(START_STATION)?,
            end_station: require(END_STATION)?,
            user_type: require(USER_TYPE)?,
            gender: find(GENDER),
            birth_year: find(BIRTH_YEAR),
        })
    }

    fn column_set(&self) -> ColumnSet {
        ColumnSet {
            gender: self.gender.is_some(),
            birth_year: self.birth_year.is_some(),
        }
    }
}

fn parse_record(
    layout: &ColumnLayout,
    row: &csv::StringRecord,
) -> std::result::Result<TripRecord, String> {
    let field = |idx: usize| row.get(idx).unwrap_or("").trim();

    let start_time = parse_timestamp(field(layout.start_time))
        .ok_or_else(|| format!("invalid {START_TIME} \"{}\"", field(layout.start_time)))?;
    let end_time = parse_timestamp(field(layout.end_time))
        .ok_or_else(|| format!("invalid {END_TIME} \"{}\"", field(layout.end_time)))?;
    let trip_duration = field(layout.trip_duration)
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| {
            format!(
                "invalid {TRIP_DURATION} \"{}\"",
                field(layout.trip_duration)
            )
        })?;

    let gender = layout
        .gender
        .map(field)
        .filter(|g| !g.is_empty())
        .map(str::to_string);
    let birth_year = layout.birth_year.map(field).and_then(parse_birth_year);

    Ok(TripRecord::new(
        start_time,
        end_time,
        trip_duration,
        field(layout.start_station),
        field(layout.end_station),
        field(layout.user_type),
        gender,
        birth_year,
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
