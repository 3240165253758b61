//! Trend event storage port.

use chrono::NaiveDate;

use crate::domain::error::JournalError;
use crate::domain::trend_event::{NewTrendEvent, TrendEvent};

pub trait TrendPort {
    fn create_event(&self, event: &NewTrendEvent) -> Result<TrendEvent, JournalError>;

    fn delete_event(&self, id: i64) -> Result<(), JournalError>;

    /// All events dated on or before `until`, in no particular order.
    fn events_until(&self, until: NaiveDate) -> Result<Vec<TrendEvent>, JournalError>;

    /// Distinct `YYYY-MM` keys that have events, newest first.
    fn event_months(&self) -> Result<Vec<String>, JournalError>;
}
