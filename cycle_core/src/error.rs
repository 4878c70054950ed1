//! Error types for the cycle_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cycle_core operations
///
/// The prediction engine itself never fails; these variants cover the
/// storage, configuration and import/export layers around it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A period entry that breaks its own invariants
    #[error("Invalid period entry: {0}")]
    InvalidEntry(String),

    /// A date string that could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Calendar grid request outside the supported range
    #[error("Calendar error: {0}")]
    Calendar(String),

    /// No stored entry carries the given id
    #[error("No period entry with id {0}")]
    EntryNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_messages() {
        assert_eq!(
            Error::EntryNotFound("abc".into()).to_string(),
            "No period entry with id abc"
        );
        assert_eq!(
            Error::Calendar("no such month: 2024-13".into()).to_string(),
            "Calendar error: no such month: 2024-13"
        );
        assert!(matches!(
            Error::from(io::Error::other("disk")),
            Error::Io(_)
        ));
    }
}
