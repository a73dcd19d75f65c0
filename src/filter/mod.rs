//! Date range filtering.
//!
//! The range is a closed interval at day granularity in UTC. Undated
//! records (no parsable `Date:` header) are excluded from the match set
//! but reported separately, so corpus-wide counts stay honest.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, SleuthError};
use crate::model::record::MessageRecord;

/// A validated inclusive date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, failing with [`SleuthError::InvalidRange`] when
    /// `start > end` — before any record is scanned.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(SleuthError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse two ISO `YYYY-MM-DD` strings into a validated range.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse_day = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| SleuthError::InvalidDate(s.to_string()))
        };
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether a UTC calendar day falls inside the interval.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Result of filtering a record sequence by date range.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Matching records, input order preserved.
    pub records: Vec<MessageRecord>,
    /// Records with `timestamp = None`: excluded from the match set,
    /// reported here ("undated, excluded").
    pub undated: usize,
    /// Dated records outside the interval.
    pub out_of_range: usize,
}

/// Retain the records whose timestamp (UTC, day granularity) falls
/// inside `range`. Order-preserving.
pub fn filter_by_range(records: Vec<MessageRecord>, range: &DateRange) -> FilterOutcome {
    let mut matched = Vec::new();
    let mut undated = 0usize;
    let mut out_of_range = 0usize;

    for record in records {
        match record.date() {
            Some(day) if range.contains(day) => matched.push(record),
            Some(_) => out_of_range += 1,
            None => undated += 1,
        }
    }

    tracing::info!(
        matched = matched.len(),
        undated,
        out_of_range,
        range = %range,
        "Filtered corpus by date range"
    );

    FilterOutcome {
        records: matched,
        undated,
        out_of_range,
    }
}
