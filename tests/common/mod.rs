#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::io::Write;

use tradejournal::adapters::sqlite_adapter::SqliteAdapter;
use tradejournal::domain::performance::{NewPerformanceEntry, PerformanceEntry, PerformanceStatus};
use tradejournal::domain::rule::{Rule, RuleDraft};
use tradejournal::domain::trade::{Trade, TradeDraft, TradeSide};
use tradejournal::domain::trend_event::{Direction, EventType, NewTrendEvent, TrendEvent};
use tradejournal::ports::performance_port::PerformancePort;
use tradejournal::ports::rule_port::RulePort;
use tradejournal::ports::trade_port::TradePort;
use tradejournal::ports::trend_port::TrendPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn timestamp(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute as i64)
}

/// In-memory store with the schema applied.
pub fn memory_store() -> SqliteAdapter {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    store
}

pub fn add_rule(store: &SqliteAdapter, name: &str, category: &str) -> Rule {
    let draft = RuleDraft::new(name, category, "", true).unwrap();
    store.create_rule(&draft).unwrap()
}

pub fn record(
    store: &SqliteAdapter,
    rule_id: i64,
    day: NaiveDate,
    status: PerformanceStatus,
) -> PerformanceEntry {
    store
        .append_entry(&NewPerformanceEntry {
            rule_id,
            date: day,
            status,
            notes: String::new(),
        })
        .unwrap()
}

pub fn add_event(
    store: &SqliteAdapter,
    day: NaiveDate,
    event_type: EventType,
    direction: Direction,
) -> TrendEvent {
    store
        .create_event(&NewTrendEvent {
            date: day,
            time: None,
            event_type,
            direction,
            description: String::new(),
            rule_id: None,
        })
        .unwrap()
}

pub fn trade_draft(symbol: &str, entry: f64, exit: Option<f64>) -> TradeDraft {
    TradeDraft {
        symbol: symbol.to_string(),
        side: TradeSide::Long,
        entry_date: date(2024, 3, 4),
        exit_date: exit.map(|_| date(2024, 3, 8)),
        entry_price: entry,
        exit_price: exit,
        quantity: 10.0,
        fees: 0.0,
        notes: String::new(),
    }
    .validate()
    .unwrap()
}

pub fn add_trade(store: &SqliteAdapter, symbol: &str, entry: f64, exit: Option<f64>) -> Trade {
    store.create_trade(&trade_draft(symbol, entry, exit)).unwrap()
}

/// Entry built in memory, for tests that do not need a store.
pub fn entry(
    id: i64,
    day: NaiveDate,
    status: PerformanceStatus,
    created_minute: u32,
) -> PerformanceEntry {
    PerformanceEntry {
        id,
        rule_id: 1,
        date: day,
        status,
        notes: String::new(),
        created_at: timestamp(created_minute),
    }
}

pub fn event(id: i64, day: NaiveDate, event_type: EventType, direction: Direction) -> TrendEvent {
    TrendEvent {
        id,
        date: day,
        time: None,
        event_type,
        direction,
        description: String::new(),
        rule_id: None,
        created_at: timestamp(id as u32),
    }
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
