//! Market reversal observations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SuccessfulReversal,
    FailedReversal,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SuccessfulReversal => "successful_reversal",
            EventType::FailedReversal => "failed_reversal",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "successful_reversal" => Ok(EventType::SuccessfulReversal),
            "failed_reversal" => Ok(EventType::FailedReversal),
            other => Err(JournalError::validation(
                "event_type",
                format!("unknown event type {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Uptrend,
    Downtrend,
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Uptrend => "uptrend",
            Direction::Downtrend => "downtrend",
            Direction::None => "none",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "uptrend" => Ok(Direction::Uptrend),
            "downtrend" => Ok(Direction::Downtrend),
            "none" | "" => Ok(Direction::None),
            other => Err(JournalError::validation(
                "direction",
                format!("unknown direction {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEvent {
    pub id: i64,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub event_type: EventType,
    pub direction: Direction,
    pub description: String,
    pub rule_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TrendEvent {
    /// Replay order: date, then time of day (untimed first), then creation
    /// time, then id.
    pub fn chronological(a: &TrendEvent, b: &TrendEvent) -> Ordering {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time.cmp(&b.time))
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrendEvent {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub event_type: EventType,
    pub direction: Direction,
    pub description: String,
    pub rule_id: Option<i64>,
}

/// Accepts `HH:MM` or `HH:MM:SS`; blank means no time.
pub fn parse_time(value: &str) -> Result<Option<NaiveTime>, JournalError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map(Some)
        .map_err(|_| JournalError::validation("time", format!("expected HH:MM, got {value:?}")))
}
