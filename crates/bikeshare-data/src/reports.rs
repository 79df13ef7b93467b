//! The five reports run over a loaded [`Dataset`].
//!
//! Every report is a pure function of the dataset. Empty datasets give
//! [`Outcome::NoData`] (or [`Page::EndOfData`]) instead of an error, and
//! statistics over optional columns are wrapped in [`Availability`].

use std::fmt;
use std::str::FromStr;

use bikeshare_core::error::{BikeshareError, Result};
use bikeshare_core::formatting::round_to;
use bikeshare_core::models::{Availability, Dataset, Outcome, TripRecord, UNKNOWN_GENDER};
use serde::Serialize;

use crate::aggregator::{CategoryCount, GroupCounts, Popular};

/// Rows returned per raw-data page.
pub const PAGE_SIZE: usize = 5;

// ── Result types ──────────────────────────────────────────────────────────────

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeStats {
    /// Month number, 1–12.
    pub month: Popular<u32>,
    /// Full weekday name.
    pub day_of_week: Popular<String>,
    /// Hour of day, 0–23.
    pub hour: Popular<u32>,
}

/// A directed start → end station combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StationPair {
    pub start: String,
    pub end: String,
}

impl fmt::Display for StationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub start_station: Popular<String>,
    pub end_station: Popular<String>,
    pub trip: Popular<StationPair>,
}

/// Trip duration totals in seconds, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: Popular<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: Vec<CategoryCount>,
    pub gender: Availability<Vec<CategoryCount>>,
    pub birth_year: Availability<BirthYearStats>,
}

// ── Statistics reports ────────────────────────────────────────────────────────

/// Most common month, weekday and start hour.
///
/// Ties go to the lowest month, the alphabetically first weekday name and
/// the lowest hour.
pub fn report_time(dataset: &Dataset) -> Outcome<TimeStats> {
    let records = dataset.records();
    let months: GroupCounts<u32> = records.iter().map(|r| r.month).collect();
    let days: GroupCounts<&str> = records.iter().map(|r| r.day_of_week.as_str()).collect();
    let hours: GroupCounts<u32> = records.iter().map(|r| r.hour).collect();

    match (months.mode_by_key(), days.mode_by_key(), hours.mode_by_key()) {
        (Some(month), Some(day), Some(hour)) => Outcome::Computed(TimeStats {
            month,
            day_of_week: Popular {
                value: day.value.to_string(),
                count: day.count,
            },
            hour,
        }),
        _ => Outcome::NoData,
    }
}

/// Most used start station, end station and start/end combination.
///
/// Single stations tie-break on the first one seen in start-time order;
/// combinations tie-break on the smallest (start, end) pair. Blank station
/// names are not counted, and a pair needs both ends named.
pub fn report_stations(dataset: &Dataset) -> Outcome<StationStats> {
    let records = dataset.records();
    let named = |s: &&str| !s.is_empty();
    let starts: GroupCounts<&str> = records
        .iter()
        .map(|r| r.start_station.as_str())
        .filter(named)
        .collect();
    let ends: GroupCounts<&str> = records
        .iter()
        .map(|r| r.end_station.as_str())
        .filter(named)
        .collect();
    let pairs: GroupCounts<(&str, &str)> = records
        .iter()
        .map(|r| (r.start_station.as_str(), r.end_station.as_str()))
        .filter(|(start, end)| !start.is_empty() && !end.is_empty())
        .collect();

    match (
        starts.mode_by_first_seen(),
        ends.mode_by_first_seen(),
        pairs.mode_by_key(),
    ) {
        (Some(start), Some(end), Some(pair)) => Outcome::Computed(StationStats {
            start_station: owned(start),
            end_station: owned(end),
            trip: Popular {
                value: StationPair {
                    start: pair.value.0.to_string(),
                    end: pair.value.1.to_string(),
                },
                count: pair.count,
            },
        }),
        _ => Outcome::NoData,
    }
}

/// Total and mean trip duration.
pub fn report_duration(dataset: &Dataset) -> Outcome<DurationStats> {
    if dataset.is_empty() {
        return Outcome::NoData;
    }
    let total: f64 = dataset.records().iter().map(|r| r.trip_duration).sum();
    let mean = total / dataset.len() as f64;

    Outcome::Computed(DurationStats {
        trips: dataset.len(),
        total_seconds: round_to(total, 2),
        mean_seconds: round_to(mean, 2),
    })
}

/// Rider breakdown by user type, gender and birth year.
///
/// Empty user types are left out of the counts. Missing genders are counted
/// under [`UNKNOWN_GENDER`]. Birth-year figures only use valid years.
pub fn report_users(dataset: &Dataset) -> Outcome<UserStats> {
    if dataset.is_empty() {
        return Outcome::NoData;
    }
    let records = dataset.records();

    let user_types: GroupCounts<&str> = records
        .iter()
        .map(|r| r.user_type.as_str())
        .filter(|t| !t.is_empty())
        .collect();

    let gender = if dataset.columns.gender {
        Availability::Available(gender_counts(records).value_counts())
    } else {
        Availability::NotAvailable
    };

    let birth_year = if dataset.columns.birth_year {
        birth_year_stats(records).into()
    } else {
        Availability::NotAvailable
    };

    Outcome::Computed(UserStats {
        user_types: user_types.value_counts(),
        gender,
        birth_year,
    })
}

fn gender_counts(records: &[TripRecord]) -> GroupCounts<&str> {
    records
        .iter()
        .map(|r| r.gender.as_deref().unwrap_or(UNKNOWN_GENDER))
        .collect()
}

fn birth_year_stats(records: &[TripRecord]) -> Option<BirthYearStats> {
    let valid = || records.iter().filter_map(|r| r.birth_year);
    let most_common = valid().collect::<GroupCounts<i32>>().mode_by_key()?;
    let earliest = valid().min()?;
    let most_recent = valid().max()?;

    Some(BirthYearStats {
        earliest,
        most_recent,
        most_common,
    })
}

fn owned(popular: Popular<&str>) -> Popular<String> {
    Popular {
        value: popular.value.to_string(),
        count: popular.count,
    }
}

// ── Raw data pages ────────────────────────────────────────────────────────────

/// One window of raw trip records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Page<'a> {
    Rows {
        offset: usize,
        total: usize,
        rows: &'a [TripRecord],
    },
    /// `offset` is at or past the last record.
    EndOfData { total: usize },
}

impl<'a> Page<'a> {
    /// Offset of the following page, `None` when nothing follows.
    pub fn next_offset(&self) -> Option<usize> {
        match self {
            Page::Rows {
                offset,
                total,
                rows,
            } => {
                let next = offset + rows.len();
                (next < *total).then_some(next)
            }
            Page::EndOfData { .. } => None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_offset().is_some()
    }

    pub fn rows(&self) -> &'a [TripRecord] {
        match self {
            Page::Rows { rows, .. } => *rows,
            Page::EndOfData { .. } => &[],
        }
    }
}

/// Records `[offset, offset + PAGE_SIZE)` of the sorted dataset.
pub fn page(dataset: &Dataset, offset: usize) -> Page<'_> {
    let records = dataset.records();
    let total = records.len();
    if offset >= total {
        return Page::EndOfData { total };
    }
    let end = (offset + PAGE_SIZE).min(total);
    Page::Rows {
        offset,
        total,
        rows: &records[offset..end],
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// The reports a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Time,
    Stations,
    Duration,
    Users,
    Raw,
}

impl ReportKind {
    /// Every report in menu order.
    pub const ALL: [ReportKind; 5] = [
        ReportKind::Time,
        ReportKind::Stations,
        ReportKind::Duration,
        ReportKind::Users,
        ReportKind::Raw,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ReportKind::Time => "time",
            ReportKind::Stations => "stations",
            ReportKind::Duration => "duration",
            ReportKind::Users => "users",
            ReportKind::Raw => "raw",
        }
    }

    /// Menu number, starting at 1.
    pub fn number(&self) -> u32 {
        match self {
            ReportKind::Time => 1,
            ReportKind::Stations => 2,
            ReportKind::Duration => 3,
            ReportKind::Users => 4,
            ReportKind::Raw => 5,
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ReportKind::Time => &["time_stats", "times"],
            ReportKind::Stations => &["station_stats", "station"],
            ReportKind::Duration => &["trip_duration_stats", "trip duration"],
            ReportKind::Users => &["user_stats", "user"],
            ReportKind::Raw => &["raw_input", "raw data", "rows"],
        }
    }

    /// Banner shown above the report output.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Time => "The Most Frequent Times of Travel",
            ReportKind::Stations => "The Most Popular Stations and Trip",
            ReportKind::Duration => "Trip Duration",
            ReportKind::Users => "User Stats",
            ReportKind::Raw => "Raw Trip Data",
        }
    }

    fn matches(&self, folded: &str) -> bool {
        self.key() == folded
            || self.number().to_string() == folded
            || self.aliases().contains(&folded)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReportKind {
    type Err = BikeshareError;

    /// Case-insensitive; accepts the key, the menu number or an alias.
    fn from_str(value: &str) -> Result<Self> {
        let folded = value.trim().to_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.matches(&folded))
            .ok_or_else(|| BikeshareError::unknown_selection("report", value.trim()))
    }
}

/// The output of one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", content = "result", rename_all = "lowercase")]
pub enum Report<'a> {
    Time(Outcome<TimeStats>),
    Stations(Outcome<StationStats>),
    Duration(Outcome<DurationStats>),
    Users(Outcome<UserStats>),
    /// The first page of raw rows.
    Raw(Page<'a>),
}

impl Report<'_> {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Time(_) => ReportKind::Time,
            Report::Stations(_) => ReportKind::Stations,
            Report::Duration(_) => ReportKind::Duration,
            Report::Users(_) => ReportKind::Users,
            Report::Raw(_) => ReportKind::Raw,
        }
    }

    /// Whether the report had nothing to compute over.
    pub fn is_empty(&self) -> bool {
        match self {
            Report::Time(o) => o.is_no_data(),
            Report::Stations(o) => o.is_no_data(),
            Report::Duration(o) => o.is_no_data(),
            Report::Users(o) => o.is_no_data(),
            Report::Raw(p) => matches!(p, Page::EndOfData { .. }),
        }
    }
}

/// Run one report over `dataset`.
pub fn run_report(kind: ReportKind, dataset: &Dataset) -> Report<'_> {
    match kind {
        ReportKind::Time => Report::Time(report_time(dataset)),
        ReportKind::Stations => Report::Stations(report_stations(dataset)),
        ReportKind::Duration => Report::Duration(report_duration(dataset)),
        ReportKind::Users => Report::Users(report_users(dataset)),
        ReportKind::Raw => Report::Raw(page(dataset, 0)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_core::models::{ColumnSet, LoadStats, Selection};
    use bikeshare_core::time_utils::parse_timestamp;

    fn trip(start: &str, from: &str, to: &str, duration: f64) -> TripRecord {
        let ts = parse_timestamp(start).unwrap();
        TripRecord::new(ts, ts, duration, from, to, "Subscriber", None, None)
    }

    fn rider(start: &str, user_type: &str, gender: Option<&str>, year: Option<i32>) -> TripRecord {
        let ts = parse_timestamp(start).unwrap();
        TripRecord::new(
            ts,
            ts,
            60.0,
            "A",
            "B",
            user_type,
            gender.map(str::to_string),
            year,
        )
    }

    fn dataset(records: Vec<TripRecord>, columns: ColumnSet) -> Dataset {
        let stats = LoadStats {
            rows_read: records.len(),
            malformed_rows: 0,
            rows_retained: records.len(),
        };
        Dataset::new(
            Selection::new("chicago", "all", "all"),
            columns,
            records,
            stats,
        )
    }

    fn plain(records: Vec<TripRecord>) -> Dataset {
        dataset(records, ColumnSet::default())
    }

    fn demographics() -> ColumnSet {
        ColumnSet {
            gender: true,
            birth_year: true,
        }
    }

    // ── report_time ───────────────────────────────────────────────────────────

    #[test]
    fn test_report_time_month_mode() {
        let ds = plain(vec![
            trip("2017-01-03 10:00:00", "A", "B", 60.0),
            trip("2017-01-20 11:00:00", "A", "B", 60.0),
            trip("2017-03-01 12:00:00", "A", "B", 60.0),
        ]);
        let stats = report_time(&ds).computed().unwrap();
        assert_eq!(stats.month, Popular { value: 1, count: 2 });
    }

    #[test]
    fn test_report_time_tie_breaks() {
        // 2017-03-03 is a Friday at 14h, 2017-01-02 a Monday at 9h.
        let ds = plain(vec![
            trip("2017-03-03 14:00:00", "A", "B", 60.0),
            trip("2017-01-02 09:00:00", "A", "B", 60.0),
        ]);
        let stats = report_time(&ds).computed().unwrap();
        assert_eq!(stats.month.value, 1);
        assert_eq!(stats.day_of_week.value, "Friday");
        assert_eq!(stats.hour.value, 9);
        assert_eq!(stats.hour.count, 1);
    }

    // ── report_stations ───────────────────────────────────────────────────────

    #[test]
    fn test_report_stations_most_used_pair() {
        let ds = plain(vec![
            trip("2017-01-01 10:00:00", "A", "B", 60.0),
            trip("2017-01-01 11:00:00", "A", "C", 60.0),
            trip("2017-01-01 12:00:00", "A", "B", 60.0),
        ]);
        let stats = report_stations(&ds).computed().unwrap();
        assert_eq!(stats.start_station, Popular { value: "A".to_string(), count: 3 });
        assert_eq!(stats.end_station.value, "B");
        assert_eq!(
            stats.trip.value,
            StationPair {
                start: "A".to_string(),
                end: "B".to_string()
            }
        );
        assert_eq!(stats.trip.count, 2);
    }

    #[test]
    fn test_report_stations_tie_breaks() {
        let ds = plain(vec![
            trip("2017-01-01 12:00:00", "Alpha", "Yard", 60.0),
            trip("2017-01-01 10:00:00", "Zulu", "Beach", 60.0),
        ]);
        let stats = report_stations(&ds).computed().unwrap();
        // Stations: first seen in start-time order.
        assert_eq!(stats.start_station.value, "Zulu");
        assert_eq!(stats.end_station.value, "Beach");
        // Pairs: smallest pair.
        assert_eq!(stats.trip.value.start, "Alpha");
        assert_eq!(stats.trip.value.to_string(), "Alpha -> Yard");
    }

    #[test]
    fn test_report_stations_skips_blank_names() {
        let ds = plain(vec![
            trip("2017-01-01 09:00:00", "", "", 60.0),
            trip("2017-01-01 10:00:00", "", "", 60.0),
            trip("2017-01-01 11:00:00", "", "B", 60.0),
            trip("2017-01-01 12:00:00", "A", "B", 60.0),
        ]);
        let stats = report_stations(&ds).computed().unwrap();
        assert_eq!(stats.start_station, Popular { value: "A".to_string(), count: 1 });
        assert_eq!(stats.end_station, Popular { value: "B".to_string(), count: 2 });
        assert_eq!(stats.trip.value.to_string(), "A -> B");
        assert_eq!(stats.trip.count, 1);
    }

    #[test]
    fn test_report_stations_all_blank_is_no_data() {
        let ds = plain(vec![
            trip("2017-01-01 09:00:00", "", "", 60.0),
            trip("2017-01-01 10:00:00", "", "", 60.0),
        ]);
        assert!(report_stations(&ds).is_no_data());
    }

    // ── report_duration ───────────────────────────────────────────────────────

    #[test]
    fn test_report_duration_sum_and_mean() {
        let ds = plain(vec![
            trip("2017-01-01 10:00:00", "A", "B", 100.123),
            trip("2017-01-01 11:00:00", "A", "B", 200.456),
            trip("2017-01-01 12:00:00", "A", "B", 300.0),
        ]);
        let stats = report_duration(&ds).computed().unwrap();
        assert_eq!(stats.trips, 3);
        assert_eq!(stats.total_seconds, 600.58);
        assert_eq!(stats.mean_seconds, 200.19);
    }

    // ── report_users ──────────────────────────────────────────────────────────

    #[test]
    fn test_report_users_type_counts() {
        let ds = plain(vec![
            rider("2017-01-01 10:00:00", "Customer", None, None),
            rider("2017-01-01 11:00:00", "Subscriber", None, None),
            rider("2017-01-01 12:00:00", "Subscriber", None, None),
            rider("2017-01-01 13:00:00", "", None, None),
        ]);
        let stats = report_users(&ds).computed().unwrap();
        let labels: Vec<(&str, usize)> = stats
            .user_types
            .iter()
            .map(|c| (c.label.as_str(), c.count))
            .collect();
        assert_eq!(labels, vec![("Subscriber", 2), ("Customer", 1)]);
        assert_eq!(stats.gender, Availability::NotAvailable);
        assert_eq!(stats.birth_year, Availability::NotAvailable);
    }

    #[test]
    fn test_report_users_unknown_gender_bucket() {
        let ds = dataset(
            vec![
                rider("2017-01-01 10:00:00", "Subscriber", Some("Male"), None),
                rider("2017-01-01 11:00:00", "Subscriber", None, None),
                rider("2017-01-01 12:00:00", "Customer", None, None),
            ],
            demographics(),
        );
        let stats = report_users(&ds).computed().unwrap();
        let gender = stats.gender.available().unwrap();
        assert_eq!(gender[0].label, UNKNOWN_GENDER);
        assert_eq!(gender[0].count, 2);
        assert_eq!(gender[1].label, "Male");
        // No valid birth year in scope.
        assert_eq!(stats.birth_year, Availability::NotAvailable);
    }

    #[test]
    fn test_report_users_birth_years() {
        let ds = dataset(
            vec![
                rider("2017-01-01 10:00:00", "Subscriber", Some("Male"), Some(1990)),
                rider("2017-01-01 11:00:00", "Subscriber", None, None),
                rider("2017-01-01 12:00:00", "Customer", Some("Female"), Some(1985)),
                rider("2017-01-01 13:00:00", "Customer", Some("Female"), None),
            ],
            demographics(),
        );
        let years = report_users(&ds)
            .computed()
            .unwrap()
            .birth_year
            .available()
            .unwrap();
        assert_eq!(years.earliest, 1985);
        assert_eq!(years.most_recent, 1990);
        assert_eq!(years.most_common, Popular { value: 1985, count: 1 });
    }

    // ── page ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_page_windows() {
        let records = (0..12)
            .map(|i| trip(&format!("2017-01-01 {:02}:00:00", i), "A", "B", 60.0))
            .collect();
        let ds = plain(records);

        let sizes: Vec<usize> = [0, 5, 10].iter().map(|&o| page(&ds, o).rows().len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert_eq!(page(&ds, 15), Page::EndOfData { total: 12 });
        assert_eq!(page(&ds, 12), Page::EndOfData { total: 12 });

        assert_eq!(page(&ds, 0).next_offset(), Some(5));
        assert_eq!(page(&ds, 5).next_offset(), Some(10));
        assert!(!page(&ds, 10).has_more());
        assert_eq!(page(&ds, 5).rows()[0].hour, 5);
    }

    #[test]
    fn test_page_serializes_status() {
        let ds = plain(Vec::new());
        let value = serde_json::to_value(page(&ds, 0)).unwrap();
        assert_eq!(value, serde_json::json!({"status": "end_of_data", "total": 0}));
    }

    // ── Empty datasets ────────────────────────────────────────────────────────

    #[test]
    fn test_every_report_handles_empty_dataset() {
        let ds = dataset(Vec::new(), demographics());
        for kind in ReportKind::ALL {
            let report = run_report(kind, &ds);
            assert_eq!(report.kind(), kind);
            assert!(report.is_empty(), "{kind} should be empty");
        }
        assert!(report_duration(&ds).is_no_data());
    }

    // ── ReportKind ────────────────────────────────────────────────────────────

    #[test]
    fn test_report_kind_from_str() {
        assert_eq!("Time".parse::<ReportKind>().unwrap(), ReportKind::Time);
        assert_eq!("2".parse::<ReportKind>().unwrap(), ReportKind::Stations);
        assert_eq!(
            "trip_duration_stats".parse::<ReportKind>().unwrap(),
            ReportKind::Duration
        );
        assert_eq!(" RAW ".parse::<ReportKind>().unwrap(), ReportKind::Raw);
        let err = "weather".parse::<ReportKind>().unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_run_report_serializes_with_kind() {
        let ds = plain(vec![trip("2017-01-01 10:00:00", "A", "B", 90.0)]);
        let value = serde_json::to_value(run_report(ReportKind::Duration, &ds)).unwrap();
        assert_eq!(value["report"], "duration");
        assert_eq!(value["result"]["status"], "computed");
        assert_eq!(value["result"]["data"]["total_seconds"], 90.0);
    }
}
