//! Performance entry storage port.

use chrono::NaiveDate;

use crate::domain::error::JournalError;
use crate::domain::performance::{NewPerformanceEntry, PerformanceEntry};

pub trait PerformancePort {
    /// Records a new evaluation; earlier entries for the same day are kept.
    fn append_entry(&self, entry: &NewPerformanceEntry) -> Result<PerformanceEntry, JournalError>;

    /// Records the checklist status for a rule and day. A second call for the
    /// same rule and date updates that entry; appended evaluations are untouched.
    fn upsert_daily_entry(
        &self,
        entry: &NewPerformanceEntry,
    ) -> Result<PerformanceEntry, JournalError>;

    /// Entries for one rule ordered by date, then creation.
    fn entries_for_rule(&self, rule_id: i64) -> Result<Vec<PerformanceEntry>, JournalError>;

    fn entries_on(&self, date: NaiveDate) -> Result<Vec<PerformanceEntry>, JournalError>;

    /// Distinct days that have at least one entry, newest first.
    fn tracked_dates(&self) -> Result<Vec<NaiveDate>, JournalError>;
}
