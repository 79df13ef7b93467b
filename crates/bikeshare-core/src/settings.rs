use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Explore bike-share trip data: timing, stations, durations and riders
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bikeshare",
    about = "Explore bike-share trip data: timing, stations, durations and riders",
    version
)]
pub struct Settings {
    /// Directory holding the per-city trip CSV files
    #[arg(long, env = "BIKESHARE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding cities.csv / months.csv / weekdays.csv
    #[arg(long)]
    pub catalog_dir: Option<PathBuf>,

    /// City to query; omit to start the interactive session
    #[arg(long)]
    pub city: Option<String>,

    /// Month filter (name, number, or "all")
    #[arg(long, default_value = "all")]
    pub month: String,

    /// Weekday filter (name, number, or "all")
    #[arg(long, default_value = "all")]
    pub day: String,

    /// Report to run; may be repeated. Defaults to every statistics report
    #[arg(long = "report", value_parser = ["time", "stations", "duration", "users", "raw"])]
    pub reports: Vec<String>,

    /// Output format for non-interactive runs
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Reports run when `--report` is not given.
pub const DEFAULT_REPORTS: &[&str] = &["time", "stations", "duration", "users"];

impl Settings {
    /// Parse the process arguments and apply derived overrides.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// Whether the interactive session should drive the run.
    pub fn is_interactive(&self) -> bool {
        self.city.is_none()
    }

    /// Requested reports, or [`DEFAULT_REPORTS`] when none were given.
    pub fn report_names(&self) -> Vec<&str> {
        if self.reports.is_empty() {
            DEFAULT_REPORTS.to_vec()
        } else {
            self.reports.iter().map(String::as_str).collect()
        }
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }

    /// `--debug` overrides the log level.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::try_load_from(["bikeshare"]).unwrap();

        assert!(settings.city.is_none());
        assert_eq!(settings.month, "all");
        assert_eq!(settings.day, "all");
        assert!(settings.reports.is_empty());
        assert_eq!(settings.format, "text");
        assert_eq!(settings.log_level, "WARNING");
        assert!(!settings.debug);
        assert!(settings.catalog_dir.is_none());
        assert!(settings.is_interactive());
    }

    #[test]
    fn test_settings_non_interactive_query() {
        let settings = Settings::try_load_from([
            "bikeshare", "--city", "chicago", "--month", "june", "--day", "friday",
        ])
        .unwrap();

        assert_eq!(settings.city.as_deref(), Some("chicago"));
        assert_eq!(settings.month, "june");
        assert_eq!(settings.day, "friday");
        assert!(!settings.is_interactive());
    }

    #[test]
    fn test_settings_repeated_reports() {
        let settings = Settings::try_load_from([
            "bikeshare", "--city", "nyc", "--report", "users", "--report", "raw",
        ])
        .unwrap();
        assert_eq!(settings.report_names(), vec!["users", "raw"]);
    }

    #[test]
    fn test_settings_default_reports() {
        let settings = Settings::try_load_from(["bikeshare", "--city", "nyc"]).unwrap();
        assert_eq!(settings.report_names(), DEFAULT_REPORTS.to_vec());
    }

    #[test]
    fn test_settings_rejects_unknown_report() {
        assert!(Settings::try_load_from(["bikeshare", "--report", "weather"]).is_err());
    }

    #[test]
    fn test_settings_json_format() {
        let settings = Settings::try_load_from(["bikeshare", "--format", "json"]).unwrap();
        assert!(settings.wants_json());
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings =
            Settings::try_load_from(["bikeshare", "--log-level", "ERROR", "--debug"]).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_rejects_unknown_log_level() {
        assert!(Settings::try_load_from(["bikeshare", "--log-level", "TRACE"]).is_err());
    }

    #[test]
    fn test_settings_data_dir() {
        let settings =
            Settings::try_load_from(["bikeshare", "--data-dir", "/srv/bikeshare"]).unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("/srv/bikeshare")));
    }
}
