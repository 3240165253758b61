//! Logged trades and their profit/loss.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(TradeSide::Long),
            "short" | "sell" => Ok(TradeSide::Short),
            other => Err(JournalError::validation(
                "side",
                format!("expected long or short, got {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
    Open,
}

impl TradeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TradeOutcome::Win => "Win",
            TradeOutcome::Loss => "Loss",
            TradeOutcome::Breakeven => "Breakeven",
            TradeOutcome::Open => "Open",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub fees: f64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.exit_price.is_none()
    }

    /// Realized profit/loss net of fees; `None` while the trade is open.
    pub fn pnl(&self) -> Option<f64> {
        let exit = self.exit_price?;
        let gross = match self.side {
            TradeSide::Long => (exit - self.entry_price) * self.quantity,
            TradeSide::Short => (self.entry_price - exit) * self.quantity,
        };
        Some(gross - self.fees)
    }

    pub fn outcome(&self) -> TradeOutcome {
        match self.pnl() {
            None => TradeOutcome::Open,
            Some(p) if p > 0.0 => TradeOutcome::Win,
            Some(p) if p < 0.0 => TradeOutcome::Loss,
            Some(_) => TradeOutcome::Breakeven,
        }
    }

    /// Return on the capital committed at entry, in percent.
    pub fn return_pct(&self) -> Option<f64> {
        let cost = self.entry_price * self.quantity;
        if cost <= 0.0 {
            return None;
        }
        self.pnl().map(|p| p / cost * 100.0)
    }

    pub fn holding_days(&self) -> Option<i64> {
        self.exit_date.map(|exit| (exit - self.entry_date).num_days())
    }
}

/// Validated input for creating or updating a trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDraft {
    pub symbol: String,
    pub side: TradeSide,
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub fees: f64,
    pub notes: String,
}

impl TradeDraft {
    pub fn validate(self) -> Result<Self, JournalError> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(JournalError::validation("symbol", "must not be empty"));
        }
        if !(self.entry_price.is_finite() && self.entry_price > 0.0) {
            return Err(JournalError::validation("entry_price", "must be positive"));
        }
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(JournalError::validation("quantity", "must be positive"));
        }
        if !(self.fees.is_finite() && self.fees >= 0.0) {
            return Err(JournalError::validation("fees", "must not be negative"));
        }
        if let Some(exit) = self.exit_price {
            if !(exit.is_finite() && exit > 0.0) {
                return Err(JournalError::validation("exit_price", "must be positive"));
            }
        }
        match (self.exit_date, self.exit_price) {
            (Some(_), None) => {
                return Err(JournalError::validation(
                    "exit_price",
                    "required when an exit date is given",
                ));
            }
            (None, Some(_)) => {
                return Err(JournalError::validation(
                    "exit_date",
                    "required when an exit price is given",
                ));
            }
            (Some(exit), Some(_)) if exit < self.entry_date => {
                return Err(JournalError::validation(
                    "exit_date",
                    "must not be before the entry date",
                ));
            }
            _ => {}
        }
        Ok(Self {
            symbol,
            notes: self.notes.trim().to_string(),
            ..self
        })
    }
}

/// Parses an optional numeric form field; blank means absent.
pub fn parse_optional_f64(field: &str, value: &str) -> Result<Option<f64>, JournalError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_f64(field, value).map(Some)
}

pub fn parse_f64(field: &str, value: &str) -> Result<f64, JournalError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| JournalError::validation(field, format!("expected a number, got {value:?}")))
}
