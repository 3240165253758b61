//! Per-rule performance statistics.
//!
//! Everything here is a pure function over entries already loaded for one
//! rule. Empty input yields zero rates and [`TrendDirection::InsufficientData`].

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::dates::{WEEKDAY_NAMES, month_key, weekday_index};
use super::performance::{PerformanceEntry, PerformanceStatus};
use super::rule::{Rule, RuleCategory};

/// Minimum number of month buckets before a trend is classified.
pub const TREND_WINDOW_MONTHS: usize = 3;
/// Rate change (percentage points) separating stable from improving/declining.
pub const TREND_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "Improving",
            TrendDirection::Declining => "Declining",
            TrendDirection::Stable => "Stable",
            TrendDirection::InsufficientData => "Not enough data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayStats {
    pub day: &'static str,
    pub success_count: usize,
    pub failure_count: usize,
    pub rate: i64,
}

impl WeekdayStats {
    pub fn evaluated(&self) -> usize {
        self.success_count + self.failure_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStats {
    /// `YYYY-MM`
    pub month: String,
    /// e.g. `Mar 2024`
    pub label: String,
    pub success_count: usize,
    pub failure_count: usize,
    pub rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Streak {
    pub length: usize,
    pub status: Option<PerformanceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RulePerformance {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub not_applicable_count: usize,
    pub success_rate: i64,
    pub weekdays: Vec<WeekdayStats>,
    pub months: Vec<MonthStats>,
    pub trend: TrendDirection,
    pub streak: Streak,
    pub best_weekday: Option<&'static str>,
    pub worst_weekday: Option<&'static str>,
}

impl RulePerformance {
    pub fn compute(entries: &[PerformanceEntry]) -> Self {
        let success_count = count_status(entries, PerformanceStatus::Success);
        let failure_count = count_status(entries, PerformanceStatus::Failure);
        let not_applicable_count = count_status(entries, PerformanceStatus::NotApplicable);

        let weekdays = weekday_breakdown(entries);
        let months = month_breakdown(entries);
        let trend = classify_trend(&months);
        let (best_weekday, worst_weekday) = weekday_extremes(&weekdays);

        RulePerformance {
            total: entries.len(),
            success_count,
            failure_count,
            not_applicable_count,
            success_rate: success_rate(entries),
            weekdays,
            months,
            trend,
            streak: current_streak(entries),
            best_weekday,
            worst_weekday,
        }
    }
}

/// Condensed view of one rule used by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub rule_id: i64,
    pub name: String,
    pub category: RuleCategory,
    pub is_active: bool,
    pub total: usize,
    pub success_rate: i64,
    pub trend: TrendDirection,
}

impl RuleSummary {
    pub fn compute(rule: &Rule, entries: &[PerformanceEntry]) -> Self {
        RuleSummary {
            rule_id: rule.id,
            name: rule.name.clone(),
            category: rule.category,
            is_active: rule.is_active,
            total: entries.len(),
            success_rate: success_rate(entries),
            trend: classify_trend(&month_breakdown(entries)),
        }
    }
}

fn count_status(entries: &[PerformanceEntry], status: PerformanceStatus) -> usize {
    entries.iter().filter(|e| e.status == status).count()
}

/// `round(100 * part / whole)`, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as i64
}

/// Share of all entries (not-applicable included) that were successes.
pub fn success_rate(entries: &[PerformanceEntry]) -> i64 {
    percentage(
        count_status(entries, PerformanceStatus::Success),
        entries.len(),
    )
}

/// Always returns seven buckets, Sunday first. Not-applicable entries are
/// left out of every bucket.
pub fn weekday_breakdown(entries: &[PerformanceEntry]) -> Vec<WeekdayStats> {
    let mut counts = [(0usize, 0usize); 7];
    for entry in entries {
        let slot = &mut counts[weekday_index(entry.date.weekday())];
        match entry.status {
            PerformanceStatus::Success => slot.0 += 1,
            PerformanceStatus::Failure => slot.1 += 1,
            PerformanceStatus::NotApplicable => {}
        }
    }

    WEEKDAY_NAMES
        .into_iter()
        .zip(counts)
        .map(|(day, (success_count, failure_count))| WeekdayStats {
            day,
            success_count,
            failure_count,
            rate: percentage(success_count, success_count + failure_count),
        })
        .collect()
}

/// One bucket per calendar month that has entries, oldest first.
pub fn month_breakdown(entries: &[PerformanceEntry]) -> Vec<MonthStats> {
    // keyed by (year, month) so iteration order is chronological
    let mut buckets: BTreeMap<(i32, u32), (NaiveDate, usize, usize)> = BTreeMap::new();
    for entry in entries {
        let first = entry.date.with_day(1).unwrap_or(entry.date);
        let slot = buckets
            .entry((entry.date.year(), entry.date.month()))
            .or_insert((first, 0, 0));
        match entry.status {
            PerformanceStatus::Success => slot.1 += 1,
            PerformanceStatus::Failure => slot.2 += 1,
            PerformanceStatus::NotApplicable => {}
        }
    }

    buckets
        .into_values()
        .map(|(first, success_count, failure_count)| MonthStats {
            month: month_key(first),
            label: first.format("%b %Y").to_string(),
            success_count,
            failure_count,
            rate: percentage(success_count, success_count + failure_count),
        })
        .collect()
}

/// Compares the first and last of the most recent three months.
pub fn classify_trend(months: &[MonthStats]) -> TrendDirection {
    if months.len() < TREND_WINDOW_MONTHS {
        return TrendDirection::InsufficientData;
    }
    let recent = &months[months.len() - TREND_WINDOW_MONTHS..];
    let delta = recent[recent.len() - 1].rate - recent[0].rate;
    if delta >= TREND_THRESHOLD {
        TrendDirection::Improving
    } else if delta <= -TREND_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Run of identical statuses counted back from the most recently created
/// entry. Ties on `created_at` are broken by the higher id being newer.
pub fn current_streak(entries: &[PerformanceEntry]) -> Streak {
    let mut newest_first: Vec<&PerformanceEntry> = entries.iter().collect();
    newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    streak_of(newest_first.iter().map(|e| e.status))
}

/// Streak over statuses already ordered newest first.
pub fn streak_of(statuses: impl IntoIterator<Item = PerformanceStatus>) -> Streak {
    let mut iter = statuses.into_iter();
    let Some(head) = iter.next() else {
        return Streak {
            length: 0,
            status: None,
        };
    };
    let length = 1 + iter.take_while(|s| *s == head).count();
    Streak {
        length,
        status: Some(head),
    }
}

fn weekday_extremes(weekdays: &[WeekdayStats]) -> (Option<&'static str>, Option<&'static str>) {
    let with_data: Vec<&WeekdayStats> = weekdays.iter().filter(|w| w.evaluated() > 0).collect();
    // first maximum / first minimum in Sunday-first order
    let best = with_data
        .iter()
        .copied()
        .fold(None::<&WeekdayStats>, |acc, w| match acc {
            Some(b) if b.rate >= w.rate => Some(b),
            _ => Some(w),
        })
        .map(|w| w.day);
    let worst = with_data
        .iter()
        .copied()
        .fold(None::<&WeekdayStats>, |acc, w| match acc {
            Some(b) if b.rate <= w.rate => Some(b),
            _ => Some(w),
        })
        .map(|w| w.day);
    (best, worst)
}
