//! Rule storage port.

use crate::domain::error::JournalError;
use crate::domain::rule::{Rule, RuleDraft};
use crate::domain::rule_history::RuleVersion;

pub trait RulePort {
    fn create_rule(&self, draft: &RuleDraft) -> Result<Rule, JournalError>;

    /// Stores a snapshot of the current state as a version, then applies the
    /// draft and bumps the version counter.
    fn update_rule(&self, id: i64, draft: &RuleDraft) -> Result<Rule, JournalError>;

    /// Deletes the rule together with its entries, versions and events.
    fn delete_rule(&self, id: i64) -> Result<(), JournalError>;

    fn get_rule(&self, id: i64) -> Result<Rule, JournalError>;

    /// Ordered by category then name.
    fn list_rules(&self) -> Result<Vec<Rule>, JournalError>;

    /// Stored versions of a rule, newest first. Does not include the live rule.
    fn list_versions(&self, rule_id: i64) -> Result<Vec<RuleVersion>, JournalError>;
}
