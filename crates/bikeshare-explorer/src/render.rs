//! Plain-text rendering of reports.

use std::io::{self, Write};
use std::time::Duration;

use bikeshare_core::formatting::{format_duration, format_number, percentage};
use bikeshare_core::models::{Availability, ColumnSet, Dataset, Outcome, TripRecord};
use bikeshare_core::time_utils::month_name;
use bikeshare_data::aggregator::{CategoryCount, Popular};
use bikeshare_data::reports::{DurationStats, Page, Report, StationStats, TimeStats, UserStats};
use unicode_width::UnicodeWidthStr;

pub const SEPARATOR_WIDTH: usize = 40;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NO_DATA: &str = "There does not appear to be any data for your selection.";

// ── Framing ───────────────────────────────────────────────────────────────────

pub fn separator(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

pub fn elapsed(out: &mut impl Write, took: Duration) -> io::Result<()> {
    writeln!(out, "\nThis took {:.4} seconds.", took.as_secs_f64())
}

/// Row counts of a fresh load, plus a note when rows were skipped.
pub fn load_summary(out: &mut impl Write, dataset: &Dataset) -> io::Result<()> {
    let stats = dataset.stats;
    writeln!(
        out,
        "Loaded {} of {} trips for {}.",
        format_number(stats.rows_retained as f64, 0),
        format_number(stats.rows_read as f64, 0),
        dataset.selection
    )?;
    if stats.malformed_rows > 0 {
        writeln!(
            out,
            "Note: {} malformed rows were skipped.",
            format_number(stats.malformed_rows as f64, 0)
        )?;
    }
    Ok(())
}

pub fn no_data(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{NO_DATA}")
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Banner and body of one report.
pub fn report(out: &mut impl Write, report: &Report<'_>, columns: ColumnSet) -> io::Result<()> {
    writeln!(out, "\nCalculating {}...\n", report.kind().title())?;
    match report {
        Report::Time(outcome) => with_data(out, outcome, time),
        Report::Stations(outcome) => with_data(out, outcome, stations),
        Report::Duration(outcome) => with_data(out, outcome, duration),
        Report::Users(outcome) => with_data(out, outcome, users),
        Report::Raw(p) => page(out, p, columns),
    }
}

fn with_data<W: Write, T>(
    out: &mut W,
    outcome: &Outcome<T>,
    body: fn(&mut W, &T) -> io::Result<()>,
) -> io::Result<()> {
    match outcome {
        Outcome::Computed(stats) => body(out, stats),
        Outcome::NoData => no_data(out),
    }
}

fn trips(count: usize) -> String {
    let noun = if count == 1 { "trip" } else { "trips" };
    format!("{} {noun}", format_number(count as f64, 0))
}

fn popular<T: ToString>(p: &Popular<T>) -> String {
    format!("{} ({})", p.value.to_string(), trips(p.count))
}

fn time<W: Write>(out: &mut W, stats: &TimeStats) -> io::Result<()> {
    let month = month_name(stats.month.value)
        .map(str::to_string)
        .unwrap_or_else(|| stats.month.value.to_string());
    writeln!(
        out,
        "The most popular month is: {month} ({})",
        trips(stats.month.count)
    )?;
    writeln!(
        out,
        "The most popular day of the week is: {}",
        popular(&stats.day_of_week)
    )?;
    writeln!(
        out,
        "The most popular hour is: {:02}:00 ({})",
        stats.hour.value,
        trips(stats.hour.count)
    )
}

fn stations<W: Write>(out: &mut W, stats: &StationStats) -> io::Result<()> {
    writeln!(
        out,
        "The most used starting station is: {}",
        popular(&stats.start_station)
    )?;
    writeln!(
        out,
        "The most used ending station is: {}",
        popular(&stats.end_station)
    )?;
    writeln!(
        out,
        "The most used station combination is: {}",
        popular(&stats.trip)
    )
}

fn duration<W: Write>(out: &mut W, stats: &DurationStats) -> io::Result<()> {
    writeln!(
        out,
        "The total travel time is: {} seconds ({})",
        format_number(stats.total_seconds, 2),
        format_duration(stats.total_seconds)
    )?;
    writeln!(
        out,
        "The average travel time is: {} seconds ({})",
        format_number(stats.mean_seconds, 2),
        format_duration(stats.mean_seconds)
    )?;
    writeln!(out, "Trips counted: {}", format_number(stats.trips as f64, 0))
}

fn users<W: Write>(out: &mut W, stats: &UserStats) -> io::Result<()> {
    writeln!(out, "Total count by user type:")?;
    counts(out, &stats.user_types)?;

    match &stats.gender {
        Availability::Available(rows) => {
            writeln!(out, "\nTotal count by gender:")?;
            counts(out, rows)?;
        }
        Availability::NotAvailable => {
            writeln!(out, "\nGender data is not available for this query.")?;
        }
    }

    match &stats.birth_year {
        Availability::Available(years) => {
            writeln!(out, "\nEarliest year of birth: {}", years.earliest)?;
            writeln!(out, "Most recent year of birth: {}", years.most_recent)?;
            writeln!(
                out,
                "Most common year of birth: {} ({} riders)",
                years.most_common.value,
                format_number(years.most_common.count as f64, 0)
            )
        }
        Availability::NotAvailable => {
            writeln!(out, "\nBirth year data is not available for this query.")
        }
    }
}

/// Value-count table with each row's share of the total.
fn counts(out: &mut impl Write, rows: &[CategoryCount]) -> io::Result<()> {
    let total: usize = rows.iter().map(|r| r.count).sum();
    let label_width = rows.iter().map(|r| r.label.width()).max().unwrap_or(0);
    for row in rows {
        writeln!(
            out,
            "  {}  {:>10}  {:>5.1}%",
            pad(&row.label, label_width),
            format_number(row.count as f64, 0),
            percentage(row.count as f64, total as f64, 1)
        )?;
    }
    Ok(())
}

// ── Raw rows ──────────────────────────────────────────────────────────────────

/// One page of raw trips as an aligned table.
pub fn page(out: &mut impl Write, page: &Page<'_>, columns: ColumnSet) -> io::Result<()> {
    let (offset, total, rows) = match page {
        Page::Rows {
            offset,
            total,
            rows,
        } => (*offset, *total, *rows),
        Page::EndOfData { .. } => return writeln!(out, "No more rows to show."),
    };

    writeln!(
        out,
        "Rows {}-{} of {}",
        offset + 1,
        offset + rows.len(),
        format_number(total as f64, 0)
    )?;

    let mut header = vec![
        "#",
        "Start Time",
        "End Time",
        "Trip Duration",
        "Start Station",
        "End Station",
        "User Type",
    ];
    if columns.gender {
        header.push("Gender");
    }
    if columns.birth_year {
        header.push("Birth Year");
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, record)| row_cells(offset + i, record, columns))
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(col, title)| {
            cells
                .iter()
                .map(|row| row[col].width())
                .chain(std::iter::once(title.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    table_line(out, &header, &widths)?;
    for row in &cells {
        table_line(out, row, &widths)?;
    }
    Ok(())
}

fn row_cells(index: usize, record: &TripRecord, columns: ColumnSet) -> Vec<String> {
    let mut cells = vec![
        index.to_string(),
        record.start_time.format(TIMESTAMP_FORMAT).to_string(),
        record.end_time.format(TIMESTAMP_FORMAT).to_string(),
        format_number(record.trip_duration, 1),
        record.start_station.clone(),
        record.end_station.clone(),
        record.user_type.clone(),
    ];
    if columns.gender {
        cells.push(record.gender.clone().unwrap_or_default());
    }
    if columns.birth_year {
        cells.push(record.birth_year.map(|y| y.to_string()).unwrap_or_default());
    }
    cells
}

fn table_line(out: &mut impl Write, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| pad(cell, width))
        .collect();
    writeln!(out, "{}", line.join("  ").trim_end())
}

/// Left-align `s` in `width` terminal columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_core::models::{LoadStats, Selection};
    use bikeshare_core::time_utils::parse_timestamp;
    use bikeshare_data::reports::{page as page_of, run_report, ReportKind};

    fn trip(start: &str, station: &str, gender: Option<&str>, year: Option<i32>) -> TripRecord {
        let ts = parse_timestamp(start).unwrap();
        TripRecord::new(
            ts,
            ts,
            125.0,
            station,
            "Lake Shore Dr",
            "Subscriber",
            gender.map(str::to_string),
            year,
        )
    }

    fn dataset(records: Vec<TripRecord>, columns: ColumnSet) -> Dataset {
        let stats = LoadStats {
            rows_read: records.len() + 1,
            malformed_rows: 1,
            rows_retained: records.len(),
        };
        Dataset::new(Selection::new("chicago", "all", "all"), columns, records, stats)
    }

    fn render(report: &Report<'_>, columns: ColumnSet) -> String {
        let mut out = Vec::new();
        super::report(&mut out, report, columns).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_separator_width() {
        let mut out = Vec::new();
        separator(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", "-".repeat(40)));
    }

    #[test]
    fn test_elapsed_line() {
        let mut out = Vec::new();
        elapsed(&mut out, Duration::from_millis(1500)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nThis took 1.5000 seconds.\n");
    }

    #[test]
    fn test_load_summary_mentions_skipped_rows() {
        let ds = dataset(vec![trip("2017-01-01 10:00:00", "A", None, None)], ColumnSet::default());
        let mut out = Vec::new();
        load_summary(&mut out, &ds).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Loaded 1 of 2 trips for chicago / all / all."));
        assert!(text.contains("1 malformed rows were skipped"));
    }

    #[test]
    fn test_render_time_report() {
        let ds = dataset(
            vec![
                trip("2017-06-02 17:00:00", "A", None, None),
                trip("2017-06-09 17:30:00", "A", None, None),
            ],
            ColumnSet::default(),
        );
        let text = render(&run_report(ReportKind::Time, &ds), ds.columns);
        assert!(text.contains("Calculating The Most Frequent Times of Travel..."));
        assert!(text.contains("The most popular month is: June (2 trips)"));
        assert!(text.contains("The most popular day of the week is: Friday (2 trips)"));
        assert!(text.contains("The most popular hour is: 17:00 (2 trips)"));
    }

    #[test]
    fn test_render_duration_report() {
        let ds = dataset(vec![trip("2017-06-02 17:00:00", "A", None, None)], ColumnSet::default());
        let text = render(&run_report(ReportKind::Duration, &ds), ds.columns);
        assert!(text.contains("The total travel time is: 125.00 seconds (2m 5s)"));
        assert!(text.contains("Trips counted: 1"));
    }

    #[test]
    fn test_render_users_without_demographics() {
        let ds = dataset(vec![trip("2017-06-02 17:00:00", "A", None, None)], ColumnSet::default());
        let text = render(&run_report(ReportKind::Users, &ds), ds.columns);
        assert!(text.contains("Subscriber"));
        assert!(text.contains("Gender data is not available for this query."));
        assert!(text.contains("Birth year data is not available for this query."));
    }

    #[test]
    fn test_render_users_with_demographics() {
        let columns = ColumnSet {
            gender: true,
            birth_year: true,
        };
        let ds = dataset(
            vec![
                trip("2017-06-02 17:00:00", "A", Some("Female"), Some(1988)),
                trip("2017-06-02 18:00:00", "A", None, Some(1988)),
            ],
            columns,
        );
        let text = render(&run_report(ReportKind::Users, &ds), columns);
        assert!(text.contains("Unknown"));
        assert!(text.contains("50.0%"));
        assert!(text.contains("Most common year of birth: 1988 (2 riders)"));
    }

    #[test]
    fn test_render_no_data() {
        let ds = dataset(Vec::new(), ColumnSet::default());
        let text = render(&run_report(ReportKind::Stations, &ds), ds.columns);
        assert!(text.contains(NO_DATA));
    }

    #[test]
    fn test_render_page_aligns_columns() {
        let ds = dataset(
            vec![
                trip("2017-06-02 17:00:00", "Café Ünïcode", None, None),
                trip("2017-06-02 18:00:00", "B", None, None),
            ],
            ColumnSet::default(),
        );
        let mut out = Vec::new();
        page(&mut out, &page_of(&ds, 0), ds.columns).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Rows 1-2 of 2");
        // "End Station" starts in the same terminal column on every line.
        let column = |line: &str| {
            let at = line.find("Lake Shore Dr").or_else(|| line.find("End Station")).unwrap();
            line[..at].width()
        };
        assert_eq!(column(lines[1]), column(lines[2]));
        assert_eq!(column(lines[2]), column(lines[3]));
    }

    #[test]
    fn test_render_end_of_data_page() {
        let ds = dataset(Vec::new(), ColumnSet::default());
        let mut out = Vec::new();
        page(&mut out, &page_of(&ds, 0), ds.columns).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No more rows to show.\n");
    }
}
