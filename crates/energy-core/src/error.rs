use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the energy dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file's bytes are not valid UTF-8.
    #[error("File is not valid UTF-8: {0}")]
    InvalidEncoding(PathBuf),

    /// None of the candidate delimiters produced a consistent column layout.
    #[error("Could not determine delimiter")]
    DelimiterUndetected,

    /// The file contains no header row.
    #[error("File is empty")]
    EmptyFile,

    /// A data row has more fields than the header.
    #[error("Row on line {line} has {found} fields, expected {expected}")]
    TooManyFields {
        line: u64,
        found: usize,
        expected: usize,
    },

    /// A delimited record could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = DashboardError::FileRead {
            path: PathBuf::from("/exports/meter.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/exports/meter.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_delimiter() {
        let err = DashboardError::DelimiterUndetected;
        assert_eq!(err.to_string(), "Could not determine delimiter");
    }

    #[test]
    fn test_error_display_too_many_fields() {
        let err = DashboardError::TooManyFields {
            line: 14,
            found: 4,
            expected: 3,
        };
        assert_eq!(err.to_string(), "Row on line 14 has 4 fields, expected 3");
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = DashboardError::TimestampParse("not-a-timestamp".to_string());
        assert_eq!(err.to_string(), "Invalid timestamp format: not-a-timestamp");
    }

    #[test]
    fn test_error_display_config() {
        let err = DashboardError::Config("preview_rows must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: preview_rows must be positive"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DashboardError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: DashboardError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
