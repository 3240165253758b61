//! Day-by-day market trend derived from reversal events.
//!
//! The trend starts bearish and only successful reversals move it: an
//! uptrend reversal makes it bullish, any other direction makes it bearish.
//! Days without events carry the previous day's trend forward.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::dates::{first_of_month, last_of_month, weekday_index};
use super::trend_event::{Direction, EventType, TrendEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTrend {
    Bullish,
    Bearish,
}

impl MarketTrend {
    pub const INITIAL: MarketTrend = MarketTrend::Bearish;

    pub fn after(self, event: &TrendEvent) -> MarketTrend {
        match event.event_type {
            EventType::SuccessfulReversal if event.direction == Direction::Uptrend => {
                MarketTrend::Bullish
            }
            EventType::SuccessfulReversal => MarketTrend::Bearish,
            EventType::FailedReversal => self,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketTrend::Bullish => "bullish",
            MarketTrend::Bearish => "bearish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTrend {
    pub date: NaiveDate,
    /// Trend after all of the day's events.
    pub trend: MarketTrend,
    /// Day-start trend followed by the trend after each successful reversal.
    pub transitions: Vec<MarketTrend>,
    /// The day's events in replay order.
    pub events: Vec<TrendEvent>,
}

/// Replays `events` (any order) and returns one entry per day in
/// `from..=to`. Events before `from` contribute state but are not emitted.
pub fn replay(events: &[TrendEvent], from: NaiveDate, to: NaiveDate) -> Vec<DayTrend> {
    if from > to {
        return Vec::new();
    }

    let mut sorted: Vec<TrendEvent> = events.iter().filter(|e| e.date <= to).cloned().collect();
    sorted.sort_by(TrendEvent::chronological);

    let mut by_day: BTreeMap<NaiveDate, Vec<TrendEvent>> = BTreeMap::new();
    for event in sorted {
        by_day.entry(event.date).or_default().push(event);
    }

    let mut current = MarketTrend::INITIAL;
    for events in by_day.range(..from).map(|(_, evs)| evs) {
        current = events.iter().fold(current, |t, e| t.after(e));
    }

    let mut days = Vec::with_capacity((to - from).num_days() as usize + 1);
    for date in from.iter_days().take_while(|d| *d <= to) {
        let events = by_day.remove(&date).unwrap_or_default();
        let mut transitions = vec![current];
        for event in &events {
            if event.event_type == EventType::SuccessfulReversal {
                current = current.after(event);
                transitions.push(current);
            }
        }
        days.push(DayTrend {
            date,
            trend: current,
            transitions,
            events,
        });
    }
    days
}

/// Trend at the end of `day`.
pub fn trend_on(events: &[TrendEvent], day: NaiveDate) -> MarketTrend {
    replay(events, day, day)
        .pop()
        .map(|d| d.trend)
        .unwrap_or(MarketTrend::INITIAL)
}

/// A calendar month laid out in Sunday-first weeks. Cells outside the month
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<Option<DayTrend>>>,
}

impl MonthGrid {
    pub fn build(year: i32, month: u32, events: &[TrendEvent]) -> Option<Self> {
        let first = first_of_month(year, month)?;
        let last = last_of_month(year, month)?;

        let mut cells: Vec<Option<DayTrend>> = vec![None; weekday_index(first.weekday())];
        cells.extend(replay(events, first, last).into_iter().map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }

        let weeks = cells.chunks(7).map(<[_]>::to_vec).collect();
        Some(Self { year, month, weeks })
    }

    pub fn days(&self) -> impl Iterator<Item = &DayTrend> {
        self.weeks.iter().flatten().flatten()
    }

    pub fn bullish_days(&self) -> usize {
        self.days().filter(|d| d.trend == MarketTrend::Bullish).count()
    }

    pub fn reversal_count(&self) -> usize {
        self.days()
            .flat_map(|d| &d.events)
            .filter(|e| e.event_type == EventType::SuccessfulReversal)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn ev(id: i64, d: u32, event_type: EventType, direction: Direction) -> TrendEvent {
        TrendEvent {
            id,
            date: day(d),
            time: None,
            event_type,
            direction,
            description: String::new(),
            rule_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap(),
        }
    }

    use Direction::{Downtrend, Uptrend};
    use EventType::{FailedReversal, SuccessfulReversal};
    use MarketTrend::{Bearish, Bullish};

    #[test]
    fn gap_fill_and_default() {
        let events = vec![
            ev(1, 2, SuccessfulReversal, Uptrend),
            ev(2, 4, SuccessfulReversal, Downtrend),
        ];
        let days = replay(&events, day(1), day(5));
        let trends: Vec<MarketTrend> = days.iter().map(|d| d.trend).collect();
        assert_eq!(trends, vec![Bearish, Bullish, Bullish, Bearish, Bearish]);
    }

    #[test]
    fn failed_reversal_never_changes_state() {
        let events = vec![
            ev(1, 2, SuccessfulReversal, Uptrend),
            ev(2, 3, FailedReversal, Downtrend),
        ];
        let days = replay(&events, day(3), day(3));
        assert_eq!(days[0].trend, Bullish);
        assert_eq!(days[0].transitions, vec![Bullish]);
        assert_eq!(days[0].events.len(), 1);
    }

    #[test]
    fn intraday_transitions_follow_time_order() {
        let mut late = ev(1, 2, SuccessfulReversal, Downtrend);
        late.time = NaiveTime::from_hms_opt(15, 0, 0);
        let mut early = ev(2, 2, SuccessfulReversal, Uptrend);
        early.time = NaiveTime::from_hms_opt(9, 30, 0);
        let days = replay(&[late, early], day(2), day(2));
        assert_eq!(days[0].transitions, vec![Bearish, Bullish, Bearish]);
        assert_eq!(days[0].trend, Bearish);
        assert_eq!(days[0].events[0].id, 2);
    }

    #[test]
    fn direction_none_on_success_is_bearish() {
        let events = vec![
            ev(1, 1, SuccessfulReversal, Uptrend),
            ev(2, 2, SuccessfulReversal, Direction::None),
        ];
        assert_eq!(trend_on(&events, day(2)), Bearish);
    }

    #[test]
    fn events_before_range_seed_state() {
        let events = vec![ev(1, 1, SuccessfulReversal, Uptrend)];
        let days = replay(&events, day(10), day(11));
        assert!(days.iter().all(|d| d.trend == Bullish && d.events.is_empty()));
    }

    #[test]
    fn events_after_range_are_ignored() {
        let events = vec![ev(1, 20, SuccessfulReversal, Uptrend)];
        assert_eq!(trend_on(&events, day(19)), Bearish);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(replay(&[], day(5), day(4)).is_empty());
    }

    #[test]
    fn month_grid_pads_to_whole_weeks() {
        // May 2024 starts on a Wednesday and has 31 days
        let grid = MonthGrid::build(2024, 5, &[ev(1, 15, SuccessfulReversal, Uptrend)]).unwrap();
        assert_eq!(grid.weeks.len(), 5);
        assert!(grid.weeks.iter().all(|w| w.len() == 7));
        assert!(grid.weeks[0][2].is_none());
        assert_eq!(grid.weeks[0][3].as_ref().unwrap().date, day(1));
        assert_eq!(grid.days().count(), 31);
        assert_eq!(grid.bullish_days(), 17);
        assert_eq!(grid.reversal_count(), 1);
    }

    #[test]
    fn month_grid_rejects_invalid_month() {
        assert!(MonthGrid::build(2024, 13, &[]).is_none());
    }
}
