use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the bikeshare crates.
#[derive(Error, Debug)]
pub enum BikeshareError {
    /// A user-supplied selection matched no catalog entry.
    #[error("Unknown {category} selection: \"{candidate}\"")]
    UnknownSelection { category: String, candidate: String },

    /// A city's trip file could not be opened or its header read.
    #[error("Trip data unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every data row of a trip file failed to parse.
    #[error("No parseable trip records in {path} ({rows} malformed rows)")]
    MalformedRecord { path: PathBuf, rows: usize },

    /// A mandatory column is missing from the header row.
    #[error("Missing required column \"{column}\" in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// The month/weekday filter left no records.
    #[error("No trip data for {selection}")]
    EmptyResult { selection: String },

    /// A CSV document could not be read.
    #[error("Failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BikeshareError {
    /// Build an [`BikeshareError::UnknownSelection`] for `category`.
    pub fn unknown_selection(category: impl ToString, candidate: impl Into<String>) -> Self {
        Self::UnknownSelection {
            category: category.to_string(),
            candidate: candidate.into(),
        }
    }

    /// Whether the caller can recover by asking the user again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BikeshareError::UnknownSelection { .. } | BikeshareError::EmptyResult { .. }
        )
    }
}

/// Convenience alias used throughout the bikeshare crates.
pub type Result<T> = std::result::Result<T, BikeshareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_selection() {
        let err = BikeshareError::unknown_selection("city", "boston");
        assert_eq!(err.to_string(), "Unknown city selection: \"boston\"");
    }

    #[test]
    fn test_error_display_source_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = BikeshareError::SourceUnavailable {
            path: PathBuf::from("/data/chicago.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Trip data unavailable"));
        assert!(msg.contains("/data/chicago.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_malformed_record() {
        let err = BikeshareError::MalformedRecord {
            path: PathBuf::from("washington.csv"),
            rows: 4,
        };
        assert_eq!(
            err.to_string(),
            "No parseable trip records in washington.csv (4 malformed rows)"
        );
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = BikeshareError::MissingColumn {
            path: PathBuf::from("chicago.csv"),
            column: "Start Time".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required column \"Start Time\" in chicago.csv"
        );
    }

    #[test]
    fn test_error_display_empty_result() {
        let err = BikeshareError::EmptyResult {
            selection: "chicago / june / monday".to_string(),
        };
        assert_eq!(err.to_string(), "No trip data for chicago / june / monday");
    }

    #[test]
    fn test_error_display_config() {
        let err = BikeshareError::Config("catalog has no cities".to_string());
        assert_eq!(err.to_string(), "Configuration error: catalog has no cities");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(BikeshareError::unknown_selection("month", "smarch").is_recoverable());
        assert!(BikeshareError::EmptyResult {
            selection: "x".to_string()
        }
        .is_recoverable());
        assert!(!BikeshareError::Config("bad".to_string()).is_recoverable());
    }
}
