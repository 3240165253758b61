//! Dated rule evaluations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    Success,
    Failure,
    NotApplicable,
}

impl PerformanceStatus {
    pub const ALL: [PerformanceStatus; 3] = [
        PerformanceStatus::Success,
        PerformanceStatus::Failure,
        PerformanceStatus::NotApplicable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceStatus::Success => "success",
            PerformanceStatus::Failure => "failure",
            PerformanceStatus::NotApplicable => "not_applicable",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceStatus::Success => "Followed",
            PerformanceStatus::Failure => "Broken",
            PerformanceStatus::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceStatus {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "success" => Ok(PerformanceStatus::Success),
            "failure" => Ok(PerformanceStatus::Failure),
            "not_applicable" => Ok(PerformanceStatus::NotApplicable),
            other => Err(JournalError::validation(
                "status",
                format!("unknown status {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceEntry {
    pub id: i64,
    pub rule_id: i64,
    pub date: NaiveDate,
    pub status: PerformanceStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerformanceEntry {
    pub rule_id: i64,
    pub date: NaiveDate,
    pub status: PerformanceStatus,
    pub notes: String,
}
