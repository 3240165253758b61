//! Trade import and export as CSV.
//!
//! Columns: `symbol,side,entry_date,exit_date,entry_price,exit_price,quantity,fees,notes`.
//! `exit_date`, `exit_price`, `fees` and `notes` may be left empty.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::domain::dates::{format_date, parse_date};
use crate::domain::error::JournalError;
use crate::domain::trade::{Trade, TradeDraft};
use crate::ports::trade_port::TradePort;

#[derive(Debug, Serialize, Deserialize)]
struct TradeRecord {
    symbol: String,
    side: String,
    entry_date: String,
    #[serde(default)]
    exit_date: String,
    entry_price: f64,
    #[serde(default)]
    exit_price: Option<f64>,
    quantity: f64,
    #[serde(default)]
    fees: Option<f64>,
    #[serde(default)]
    notes: String,
}

impl TradeRecord {
    fn into_draft(self) -> Result<TradeDraft, JournalError> {
        let exit_date = if self.exit_date.trim().is_empty() {
            None
        } else {
            Some(parse_date("exit_date", &self.exit_date)?)
        };
        TradeDraft {
            symbol: self.symbol,
            side: self.side.parse()?,
            entry_date: parse_date("entry_date", &self.entry_date)?,
            exit_date,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            quantity: self.quantity,
            fees: self.fees.unwrap_or(0.0),
            notes: self.notes,
        }
        .validate()
    }

    fn from_trade(trade: &Trade) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            side: trade.side.to_string(),
            entry_date: format_date(trade.entry_date),
            exit_date: trade.exit_date.map(format_date).unwrap_or_default(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            quantity: trade.quantity,
            fees: Some(trade.fees),
            notes: trade.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    /// 1-based line in the source file, header included.
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<LineError>,
}

/// Parses every data row. A malformed row yields a [`LineError`] and does not
/// stop the remaining rows from being read.
pub fn parse_trades<R: Read>(
    reader: R,
) -> Result<Vec<Result<TradeDraft, LineError>>, JournalError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                rows.push(Err(LineError {
                    line: err.position().map(|p| p.line()).unwrap_or(0),
                    message: err.to_string(),
                }));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let parsed = record
            .deserialize::<TradeRecord>(Some(&headers))
            .map_err(JournalError::from)
            .and_then(TradeRecord::into_draft)
            .map_err(|e| LineError {
                line,
                message: e.to_string(),
            });
        rows.push(parsed);
    }
    Ok(rows)
}

pub fn import_trades<R: Read>(
    store: &dyn TradePort,
    reader: R,
) -> Result<ImportReport, JournalError> {
    let mut report = ImportReport::default();
    for row in parse_trades(reader)? {
        match row {
            Ok(draft) => {
                store.create_trade(&draft)?;
                report.imported += 1;
            }
            Err(err) => {
                log::warn!("skipping line {}: {}", err.line, err.message);
                report.errors.push(err);
            }
        }
    }
    log::info!(
        "imported {} trades ({} lines skipped)",
        report.imported,
        report.errors.len()
    );
    Ok(report)
}

pub fn export_trades<W: Write>(trades: &[Trade], writer: W) -> Result<usize, JournalError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for trade in trades {
        wtr.serialize(TradeRecord::from_trade(trade))?;
    }
    wtr.flush()?;
    Ok(trades.len())
}
