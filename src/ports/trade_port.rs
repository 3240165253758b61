//! Trade storage port.

use crate::domain::error::JournalError;
use crate::domain::trade::{Trade, TradeDraft};

pub trait TradePort {
    fn create_trade(&self, draft: &TradeDraft) -> Result<Trade, JournalError>;

    fn update_trade(&self, id: i64, draft: &TradeDraft) -> Result<Trade, JournalError>;

    fn delete_trade(&self, id: i64) -> Result<(), JournalError>;

    fn get_trade(&self, id: i64) -> Result<Trade, JournalError>;

    /// Newest entry date first.
    fn list_trades(&self) -> Result<Vec<Trade>, JournalError>;
}
