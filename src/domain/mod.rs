//! Core domain types and logic.

pub mod action_result;
pub mod analytics;
pub mod config_validation;
pub mod dates;
pub mod error;
pub mod performance;
pub mod rule;
pub mod rule_history;
pub mod trade;
pub mod trade_stats;
pub mod trend_calendar;
pub mod trend_event;
