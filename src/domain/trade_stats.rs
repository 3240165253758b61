//! Aggregate statistics over logged trades.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use super::dates::{WEEKDAY_NAMES, weekday_index};
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    pub open_trades: usize,
    /// Percent of decided (win or loss) trades that won.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    /// `f64::INFINITY` when there is profit and no loss.
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_days: f64,
    pub by_weekday: Vec<WeekdayPnl>,
    pub by_symbol: Vec<SymbolResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayPnl {
    pub day: &'static str,
    pub trades: usize,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolResult {
    pub symbol: String,
    pub trades: usize,
    pub wins: usize,
    pub pnl: f64,
}

impl TradeStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut breakevens = 0usize;
        let mut open_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_holding_days = 0i64;
        let mut weekday = [(0usize, 0.0_f64); 7];
        let mut symbols: BTreeMap<&str, (usize, usize, f64)> = BTreeMap::new();

        for trade in trades {
            let Some(pnl) = trade.pnl() else {
                open_trades += 1;
                continue;
            };

            if pnl > 0.0 {
                wins += 1;
                gross_profit += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losses += 1;
                gross_loss += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                breakevens += 1;
            }

            total_holding_days += trade.holding_days().unwrap_or(0);

            if let Some(exit) = trade.exit_date {
                let slot = &mut weekday[weekday_index(exit.weekday())];
                slot.0 += 1;
                slot.1 += pnl;
            }

            let sym = symbols.entry(trade.symbol.as_str()).or_insert((0, 0, 0.0));
            sym.0 += 1;
            if pnl > 0.0 {
                sym.1 += 1;
            }
            sym.2 += pnl;
        }

        let closed = wins + losses + breakevens;
        let decided = wins + losses;
        let win_rate = if decided > 0 {
            wins as f64 / decided as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if wins > 0 {
            gross_profit / wins as f64
        } else {
            0.0
        };

        let avg_loss = if losses > 0 {
            gross_loss / losses as f64
        } else {
            0.0
        };

        let avg_holding_days = if closed > 0 {
            total_holding_days as f64 / closed as f64
        } else {
            0.0
        };

        let by_weekday = WEEKDAY_NAMES
            .into_iter()
            .zip(weekday)
            .map(|(day, (trades, pnl))| WeekdayPnl { day, trades, pnl })
            .collect();

        let mut by_symbol: Vec<SymbolResult> = symbols
            .into_iter()
            .map(|(symbol, (trades, wins, pnl))| SymbolResult {
                symbol: symbol.to_string(),
                trades,
                wins,
                pnl,
            })
            .collect();
        by_symbol.sort_by(|a, b| b.pnl.total_cmp(&a.pnl).then_with(|| a.symbol.cmp(&b.symbol)));

        TradeStats {
            total_trades: trades.len(),
            wins,
            losses,
            breakevens,
            open_trades,
            win_rate,
            total_pnl: gross_profit - gross_loss,
            gross_profit,
            gross_loss,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_holding_days,
            by_weekday,
            by_symbol,
        }
    }

    /// Profit factor for display; infinity renders as `∞`.
    pub fn profit_factor_display(&self) -> String {
        if self.profit_factor.is_infinite() {
            "∞".to_string()
        } else {
            format!("{:.2}", self.profit_factor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeSide;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn closed(symbol: &str, entry: f64, exit: f64, exit_day: u32) -> Trade {
        Trade {
            id: 0,
            symbol: symbol.into(),
            side: TradeSide::Long,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 3, exit_day),
            entry_price: entry,
            exit_price: Some(exit),
            quantity: 10.0,
            fees: 0.0,
            notes: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    fn open(symbol: &str) -> Trade {
        Trade {
            exit_date: None,
            exit_price: None,
            ..closed(symbol, 10.0, 10.0, 1)
        }
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = TradeStats::compute(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.profit_factor, 0.0);
        assert_eq!(stats.by_weekday.len(), 7);
        assert!(stats.by_symbol.is_empty());
    }

    #[test]
    fn wins_losses_and_profit_factor() {
        let trades = vec![
            closed("BHP", 10.0, 12.0, 4), // +20, Monday
            closed("BHP", 10.0, 9.0, 5),  // -10, Tuesday
            closed("CBA", 10.0, 13.0, 4), // +30, Monday
            closed("CBA", 10.0, 10.0, 6), // 0
            open("RIO"),
        ];
        let stats = TradeStats::compute(&trades);
        assert_eq!(stats.total_trades, 5);
        assert_eq!((stats.wins, stats.losses, stats.breakevens, stats.open_trades), (2, 1, 1, 1));
        assert_relative_eq!(stats.win_rate, 200.0 / 3.0);
        assert_relative_eq!(stats.total_pnl, 40.0);
        assert_relative_eq!(stats.gross_profit, 50.0);
        assert_relative_eq!(stats.gross_loss, 10.0);
        assert_relative_eq!(stats.profit_factor, 5.0);
        assert_relative_eq!(stats.avg_win, 25.0);
        assert_relative_eq!(stats.avg_loss, 10.0);
        assert_relative_eq!(stats.largest_win, 30.0);
        assert_relative_eq!(stats.largest_loss, 10.0);
        assert_relative_eq!(stats.avg_holding_days, 3.75);

        let monday = &stats.by_weekday[1];
        assert_eq!(monday.day, "Monday");
        assert_eq!(monday.trades, 2);
        assert_relative_eq!(monday.pnl, 50.0);

        assert_eq!(stats.by_symbol[0].symbol, "CBA");
        assert_relative_eq!(stats.by_symbol[0].pnl, 30.0);
        assert_eq!(stats.by_symbol[1].symbol, "BHP");
        assert_eq!(stats.by_symbol[1].wins, 1);
    }

    #[test]
    fn profit_factor_infinite_without_losses() {
        let stats = TradeStats::compute(&[closed("BHP", 10.0, 11.0, 4)]);
        assert!(stats.profit_factor.is_infinite());
        assert_eq!(stats.profit_factor_display(), "∞");
    }

    #[test]
    fn only_open_trades_have_no_decided_stats() {
        let stats = TradeStats::compute(&[open("BHP"), open("CBA")]);
        assert_eq!(stats.open_trades, 2);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.avg_holding_days, 0.0);
        assert!(stats.by_symbol.is_empty());
    }
}
