use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Accepted timestamp layouts, tried in order.
const FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a trip timestamp into a timezone-naive [`NaiveDateTime`].
///
/// Handles the `YYYY-MM-DD HH:MM:SS` layout used by the trip files (with
/// optional fractional seconds or a `T` separator), US-style
/// `MM/DD/YYYY HH:MM[:SS]`, and bare dates (midnight). Returns `None` for
/// empty or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// ── Calendar names ────────────────────────────────────────────────────────────

/// Full English weekday name, e.g. `"Monday"`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Full English month name for `1..=12`, e.g. `"June"`.
pub fn month_name(month: u32) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize).copied())
}

/// Weekday name of a timestamp.
pub fn day_of_week(ts: &NaiveDateTime) -> &'static str {
    weekday_name(ts.weekday())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
