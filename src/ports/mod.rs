//! Port traits implemented by adapters.

pub mod config_port;
pub mod performance_port;
pub mod rule_port;
pub mod trade_port;
pub mod trend_port;

use performance_port::PerformancePort;
use rule_port::RulePort;
use trade_port::TradePort;
use trend_port::TrendPort;

/// Everything the journal persists.
pub trait JournalStore: RulePort + PerformancePort + TrendPort + TradePort {}

impl<T> JournalStore for T where T: RulePort + PerformancePort + TrendPort + TradePort {}
