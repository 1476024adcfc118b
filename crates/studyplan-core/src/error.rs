//! Core error types for studyplan-core.
//!
//! This module defines the error hierarchy using thiserror. Each concern
//! (curriculum loading, schedule generation, persistence, configuration,
//! export) has its own enum, and [`CoreError`] wraps them for callers that
//! only want a single error type.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Curriculum parsing or validation errors
    #[error("Curriculum error: {0}")]
    Curriculum(#[from] CurriculumError),

    /// Schedule generation errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Completion store persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors raised while loading or validating a curriculum.
#[derive(Error, Debug)]
pub enum CurriculumError {
    /// The curriculum text could not be parsed
    #[error("Failed to parse curriculum: {0}")]
    Parse(String),

    /// Two topics resolve to the same topic key
    #[error("Duplicate topic key: {0}")]
    DuplicateTopic(String),

    /// A topic key does not exist in the curriculum
    #[error("Unknown topic key: {0}")]
    UnknownTopic(String),

    /// A review id does not belong to any topic in the curriculum
    #[error("Unknown review id: {0}")]
    UnknownReview(String),
}

/// Errors raised by the schedule generator and review deriver.
///
/// Both fail fast: no partial schedule is ever returned alongside one of
/// these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The start date is missing or malformed
    #[error("Invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Date arithmetic left chrono's representable range
    #[error("Date out of range: {base} + {days} days")]
    DateOutOfRange { base: chrono::NaiveDate, days: u64 },

    /// A daily budget of zero minutes can never place a topic
    #[error("Daily budget must be greater than zero minutes")]
    ZeroBudget,
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend failed to read or write
    #[error("Store backend failed: {0}")]
    Backend(String),

    /// A stored value could not be decoded
    #[error("Corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised while writing the CSV export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid date format: {0}")]
    DateFormat(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                StoreError::Backend("database is locked".to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for CurriculumError {
    fn from(err: toml::de::Error) -> Self {
        CurriculumError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for CurriculumError {
    fn from(err: serde_json::Error) -> Self {
        CurriculumError::Parse(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_error_converts_into_core_error() {
        let err: CoreError = ScheduleError::InvalidDate {
            input: "2026-13-01".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Schedule(_)));
        assert!(err.to_string().contains("2026-13-01"));
    }

    #[test]
    fn rusqlite_errors_map_to_backend() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
