//! Centralized error types for mailsleuth.
//!
//! Two categories exist and must not be mixed up: per-message failures
//! (`Parse`, `Encoding`) are recovered locally by the corpus loader and
//! collected into diagnostics, while range/configuration/backend errors
//! are fatal to the call that raised them and propagate with `?`.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the mailsleuth library.
#[derive(Error, Debug)]
pub enum SleuthError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The corpus folder does not exist or is not a directory.
    #[error("Corpus folder not found or not a directory: {0}")]
    FolderNotFound(PathBuf),

    /// A single message's structure is unreadable. Recovered locally:
    /// the loader skips the file and the corpus scan continues.
    #[error("Parse error in '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Byte content could not be decoded even with the permissive
    /// fallback. Recovered locally, same as `Parse`.
    #[error("Undecodable content in '{path}': {reason}")]
    Encoding { path: PathBuf, reason: String },

    /// The caller supplied a date range with start > end. Fatal to the
    /// filter call; surfaced before any record is scanned.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A date string was not valid ISO `YYYY-MM-DD`.
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Zero records survived filtering. Surfaced as a distinct
    /// condition so the investigator is told "no matching emails"
    /// instead of receiving an empty graph.
    #[error("No emails match the requested date range")]
    EmptyCorpus,

    /// The corpus scan was cancelled between files.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// The model backend request failed or timed out.
    #[error("Model backend error: {0}")]
    ModelBackend(String),
}

/// Convenience alias for `Result<T, SleuthError>`.
pub type Result<T> = std::result::Result<T, SleuthError>;

impl SleuthError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is recovered locally by the corpus loader
    /// (message skipped, scan continues) rather than aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Encoding { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let parse = SleuthError::Parse {
            path: PathBuf::from("a.eml"),
            reason: "bad".into(),
        };
        assert!(parse.is_recoverable());

        let range = SleuthError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert!(!range.is_recoverable());
        assert!(!SleuthError::EmptyCorpus.is_recoverable());
        assert!(!SleuthError::Cancelled.is_recoverable());
    }
}
