//! SQLite journal store.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

use crate::domain::dates::{DATE_FORMAT, format_date};
use crate::domain::error::JournalError;
use crate::domain::performance::{NewPerformanceEntry, PerformanceEntry};
use crate::domain::rule::{Rule, RuleDraft};
use crate::domain::rule_history::RuleVersion;
use crate::domain::trade::{Trade, TradeDraft};
use crate::domain::trend_event::{NewTrendEvent, TrendEvent};
use crate::ports::config_port::ConfigPort;
use crate::ports::performance_port::PerformancePort;
use crate::ports::rule_port::RulePort;
use crate::ports::trade_port::TradePort;
use crate::ports::trend_port::TrendPort;

const TIME_FORMAT: &str = "%H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS rule_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_id INTEGER NOT NULL REFERENCES rules(id) ON DELETE CASCADE,
    version INTEGER NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (rule_id, version)
);
CREATE TABLE IF NOT EXISTS performance_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_id INTEGER NOT NULL REFERENCES rules(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('success', 'failure', 'not_applicable')),
    notes TEXT NOT NULL DEFAULT '',
    tracked INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_entries_rule_date ON performance_entries(rule_id, date);
CREATE INDEX IF NOT EXISTS idx_entries_date ON performance_entries(date);
CREATE TABLE IF NOT EXISTS trend_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    time TEXT,
    event_type TEXT NOT NULL CHECK (event_type IN ('successful_reversal', 'failed_reversal')),
    direction TEXT NOT NULL CHECK (direction IN ('uptrend', 'downtrend', 'none')),
    description TEXT NOT NULL DEFAULT '',
    rule_id INTEGER REFERENCES rules(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trend_events_date ON trend_events(date);
CREATE TABLE IF NOT EXISTS trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    side TEXT NOT NULL CHECK (side IN ('long', 'short')),
    entry_date TEXT NOT NULL,
    exit_date TEXT,
    entry_price REAL NOT NULL,
    exit_price REAL,
    quantity REAL NOT NULL,
    fees REAL NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trades_entry_date ON trades(entry_date);
";

const RULE_COLUMNS: &str =
    "id, name, category, description, is_active, version, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, rule_id, date, status, notes, created_at";
const EVENT_COLUMNS: &str =
    "id, date, time, event_type, direction, description, rule_id, created_at";
const TRADE_COLUMNS: &str = "id, symbol, side, entry_date, exit_date, entry_price, exit_price, \
                             quantity, fees, notes, created_at";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path = config.require_string("database", "path")?;
        if db_path == ":memory:" {
            return Self::in_memory();
        }

        let pool_size = config.get_int("database", "pool_size", 4);
        if pool_size < 1 {
            return Err(JournalError::ConfigInvalid {
                section: "database".into(),
                key: "pool_size".into(),
                reason: format!("must be at least 1, got {pool_size}"),
            });
        }

        let manager = SqliteConnectionManager::file(&db_path).with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(pool_size as u32)
            .build(manager)?;

        log::info!("opened journal database {db_path} (pool size {pool_size})");
        Ok(Self { pool })
    }

    /// Single-connection in-memory store; the database lives as long as the
    /// pooled connection, so it is never recycled.
    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, JournalError> {
        Ok(self.pool.get()?)
    }
}

fn enable_foreign_keys(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reads a text column and converts it with `parse`, reporting failures as
/// column conversion errors.
fn text_column<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let value: String = row.get(idx)?;
    parse(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn optional_text_column<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<Option<T>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| {
            parse(&v).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    text_column(row, idx, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    text_column(row, idx, |s| {
        DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
    })
}

fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = JournalError>,
{
    text_column(row, idx, T::from_str)
}

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<Rule> {
    Ok(Rule {
        id: row.get(0)?,
        name: row.get(1)?,
        category: parsed_column(row, 2)?,
        description: row.get(3)?,
        is_active: row.get(4)?,
        version: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<RuleVersion> {
    Ok(RuleVersion {
        rule_id: row.get(0)?,
        version: row.get(1)?,
        name: row.get(2)?,
        category: parsed_column(row, 3)?,
        description: row.get(4)?,
        is_active: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<PerformanceEntry> {
    Ok(PerformanceEntry {
        id: row.get(0)?,
        rule_id: row.get(1)?,
        date: date_column(row, 2)?,
        status: parsed_column(row, 3)?,
        notes: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<TrendEvent> {
    Ok(TrendEvent {
        id: row.get(0)?,
        date: date_column(row, 1)?,
        time: optional_text_column(row, 2, |s| NaiveTime::parse_from_str(s, TIME_FORMAT))?,
        event_type: parsed_column(row, 3)?,
        direction: parsed_column(row, 4)?,
        description: row.get(5)?,
        rule_id: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
    })
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        symbol: row.get(1)?,
        side: parsed_column(row, 2)?,
        entry_date: date_column(row, 3)?,
        exit_date: optional_text_column(row, 4, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
        entry_price: row.get(5)?,
        exit_price: row.get(6)?,
        quantity: row.get(7)?,
        fees: row.get(8)?,
        notes: row.get(9)?,
        created_at: timestamp_column(row, 10)?,
    })
}

fn load_rule(conn: &Connection, id: i64) -> Result<Rule, JournalError> {
    conn.query_row(
        &format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = ?1"),
        params![id],
        rule_from_row,
    )
    .optional()?
    .ok_or(JournalError::NotFound { entity: "rule", id })
}

fn ensure_rule_exists(conn: &Connection, id: i64) -> Result<(), JournalError> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM rules WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    found
        .map(|_| ())
        .ok_or(JournalError::NotFound { entity: "rule", id })
}

fn load_entry(conn: &Connection, id: i64) -> Result<PerformanceEntry, JournalError> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM performance_entries WHERE id = ?1"),
        params![id],
        entry_from_row,
    )
    .optional()?
    .ok_or(JournalError::NotFound {
        entity: "performance entry",
        id,
    })
}

/// `tracked` marks the one row per rule and day owned by the daily checklist.
fn insert_entry(
    conn: &Connection,
    entry: &NewPerformanceEntry,
    tracked: bool,
) -> Result<i64, JournalError> {
    conn.execute(
        "INSERT INTO performance_entries (rule_id, date, status, notes, tracked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.rule_id,
            format_date(entry.date),
            entry.status.as_str(),
            entry.notes.trim(),
            tracked,
            format_timestamp(now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn load_trade(conn: &Connection, id: i64) -> Result<Trade, JournalError> {
    conn.query_row(
        &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1"),
        params![id],
        trade_from_row,
    )
    .optional()?
    .ok_or(JournalError::NotFound { entity: "trade", id })
}

fn load_event(conn: &Connection, id: i64) -> Result<TrendEvent, JournalError> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM trend_events WHERE id = ?1"),
        params![id],
        event_from_row,
    )
    .optional()?
    .ok_or(JournalError::NotFound {
        entity: "trend event",
        id,
    })
}

/// Runs `sql` and collects every mapped row.
fn query_all<T>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, JournalError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

impl RulePort for SqliteAdapter {
    fn create_rule(&self, draft: &RuleDraft) -> Result<Rule, JournalError> {
        let conn = self.conn()?;
        let ts = format_timestamp(now());
        conn.execute(
            "INSERT INTO rules (name, category, description, is_active, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            params![
                draft.name,
                draft.category.as_str(),
                draft.description,
                draft.is_active,
                ts
            ],
        )?;
        load_rule(&conn, conn.last_insert_rowid())
    }

    fn update_rule(&self, id: i64, draft: &RuleDraft) -> Result<Rule, JournalError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current = load_rule(&tx, id)?;
        if draft.is_noop_for(&current) {
            return Ok(current);
        }

        let snapshot = RuleVersion::snapshot(&current);
        tx.execute(
            "INSERT INTO rule_versions (rule_id, version, name, category, description, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                snapshot.rule_id,
                snapshot.version,
                snapshot.name,
                snapshot.category.as_str(),
                snapshot.description,
                snapshot.is_active,
                format_timestamp(snapshot.created_at),
            ],
        )?;
        tx.execute(
            "UPDATE rules
             SET name = ?1, category = ?2, description = ?3, is_active = ?4,
                 version = version + 1, updated_at = ?5
             WHERE id = ?6",
            params![
                draft.name,
                draft.category.as_str(),
                draft.description,
                draft.is_active,
                format_timestamp(now()),
                id
            ],
        )?;

        let updated = load_rule(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_rule(&self, id: i64) -> Result<(), JournalError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM rules WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(JournalError::NotFound { entity: "rule", id });
        }
        Ok(())
    }

    fn get_rule(&self, id: i64) -> Result<Rule, JournalError> {
        let conn = self.conn()?;
        load_rule(&conn, id)
    }

    fn list_rules(&self) -> Result<Vec<Rule>, JournalError> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("SELECT {RULE_COLUMNS} FROM rules ORDER BY category, name COLLATE NOCASE, id"),
            [],
            rule_from_row,
        )
    }

    fn list_versions(&self, rule_id: i64) -> Result<Vec<RuleVersion>, JournalError> {
        let conn = self.conn()?;
        ensure_rule_exists(&conn, rule_id)?;
        query_all(
            &conn,
            "SELECT rule_id, version, name, category, description, is_active, created_at
             FROM rule_versions WHERE rule_id = ?1 ORDER BY version DESC",
            params![rule_id],
            version_from_row,
        )
    }
}

impl PerformancePort for SqliteAdapter {
    fn append_entry(&self, entry: &NewPerformanceEntry) -> Result<PerformanceEntry, JournalError> {
        let conn = self.conn()?;
        ensure_rule_exists(&conn, entry.rule_id)?;
        let id = insert_entry(&conn, entry, false)?;
        load_entry(&conn, id)
    }

    fn upsert_daily_entry(
        &self,
        entry: &NewPerformanceEntry,
    ) -> Result<PerformanceEntry, JournalError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        ensure_rule_exists(&tx, entry.rule_id)?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM performance_entries
                 WHERE rule_id = ?1 AND date = ?2 AND tracked = 1
                 ORDER BY id DESC LIMIT 1",
                params![entry.rule_id, format_date(entry.date)],
                |row| row.get(0),
            )
            .optional()?;
        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE performance_entries SET status = ?1, notes = ?2 WHERE id = ?3",
                    params![entry.status.as_str(), entry.notes.trim(), id],
                )?;
                id
            }
            None => insert_entry(&tx, entry, true)?,
        };
        let stored = load_entry(&tx, id)?;
        tx.commit()?;
        Ok(stored)
    }

    fn entries_for_rule(&self, rule_id: i64) -> Result<Vec<PerformanceEntry>, JournalError> {
        let conn = self.conn()?;
        ensure_rule_exists(&conn, rule_id)?;
        query_all(
            &conn,
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM performance_entries
                 WHERE rule_id = ?1 ORDER BY date, created_at, id"
            ),
            params![rule_id],
            entry_from_row,
        )
    }

    fn entries_on(&self, date: NaiveDate) -> Result<Vec<PerformanceEntry>, JournalError> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM performance_entries
                 WHERE date = ?1 ORDER BY rule_id, created_at, id"
            ),
            params![format_date(date)],
            entry_from_row,
        )
    }

    fn tracked_dates(&self) -> Result<Vec<NaiveDate>, JournalError> {
        let conn = self.conn()?;
        query_all(
            &conn,
            "SELECT DISTINCT date FROM performance_entries ORDER BY date DESC",
            [],
            |row| date_column(row, 0),
        )
    }
}

impl TrendPort for SqliteAdapter {
    fn create_event(&self, event: &NewTrendEvent) -> Result<TrendEvent, JournalError> {
        let conn = self.conn()?;
        if let Some(rule_id) = event.rule_id {
            ensure_rule_exists(&conn, rule_id)?;
        }
        conn.execute(
            "INSERT INTO trend_events (date, time, event_type, direction, description, rule_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                format_date(event.date),
                event.time.map(|t| t.format(TIME_FORMAT).to_string()),
                event.event_type.as_str(),
                event.direction.as_str(),
                event.description.trim(),
                event.rule_id,
                format_timestamp(now()),
            ],
        )?;
        load_event(&conn, conn.last_insert_rowid())
    }

    fn delete_event(&self, id: i64) -> Result<(), JournalError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM trend_events WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(JournalError::NotFound {
                entity: "trend event",
                id,
            });
        }
        Ok(())
    }

    fn events_until(&self, until: NaiveDate) -> Result<Vec<TrendEvent>, JournalError> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("SELECT {EVENT_COLUMNS} FROM trend_events WHERE date <= ?1"),
            params![format_date(until)],
            event_from_row,
        )
    }

    fn event_months(&self) -> Result<Vec<String>, JournalError> {
        let conn = self.conn()?;
        query_all(
            &conn,
            "SELECT DISTINCT substr(date, 1, 7) AS month FROM trend_events ORDER BY month DESC",
            [],
            |row| row.get(0),
        )
    }
}

impl TradePort for SqliteAdapter {
    fn create_trade(&self, draft: &TradeDraft) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO trades (symbol, side, entry_date, exit_date, entry_price, exit_price,
                                 quantity, fees, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                draft.symbol,
                draft.side.as_str(),
                format_date(draft.entry_date),
                draft.exit_date.map(format_date),
                draft.entry_price,
                draft.exit_price,
                draft.quantity,
                draft.fees,
                draft.notes,
                format_timestamp(now()),
            ],
        )?;
        load_trade(&conn, conn.last_insert_rowid())
    }

    fn update_trade(&self, id: i64, draft: &TradeDraft) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE trades
             SET symbol = ?1, side = ?2, entry_date = ?3, exit_date = ?4, entry_price = ?5,
                 exit_price = ?6, quantity = ?7, fees = ?8, notes = ?9
             WHERE id = ?10",
            params![
                draft.symbol,
                draft.side.as_str(),
                format_date(draft.entry_date),
                draft.exit_date.map(format_date),
                draft.entry_price,
                draft.exit_price,
                draft.quantity,
                draft.fees,
                draft.notes,
                id
            ],
        )?;
        if affected == 0 {
            return Err(JournalError::NotFound { entity: "trade", id });
        }
        load_trade(&conn, id)
    }

    fn delete_trade(&self, id: i64) -> Result<(), JournalError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM trades WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(JournalError::NotFound { entity: "trade", id });
        }
        Ok(())
    }

    fn get_trade(&self, id: i64) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        load_trade(&conn, id)
    }

    fn list_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("SELECT {TRADE_COLUMNS} FROM trades ORDER BY entry_date DESC, id DESC"),
            [],
            trade_from_row,
        )
    }
}
