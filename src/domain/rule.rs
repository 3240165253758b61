//! Trading rules authored by the user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;

pub const MAX_RULE_NAME_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 20_000;
pub const MAX_DESCRIPTION_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleCategory {
    Entry,
    Exit,
    #[serde(rename = "Risk Management")]
    RiskManagement,
    Psychology,
    Other,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 5] = [
        RuleCategory::Entry,
        RuleCategory::Exit,
        RuleCategory::RiskManagement,
        RuleCategory::Psychology,
        RuleCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Entry => "Entry",
            RuleCategory::Exit => "Exit",
            RuleCategory::RiskManagement => "Risk Management",
            RuleCategory::Psychology => "Psychology",
            RuleCategory::Other => "Other",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RuleCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| JournalError::validation("category", format!("unknown category {s:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: i64,
    pub name: String,
    pub category: RuleCategory,
    pub description: String,
    pub is_active: bool,
    /// Starts at 1 and increases on every update.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating or updating a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub name: String,
    pub category: RuleCategory,
    pub description: String,
    pub is_active: bool,
}

impl RuleDraft {
    pub fn new(
        name: &str,
        category: &str,
        description: &str,
        is_active: bool,
    ) -> Result<Self, JournalError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::validation("name", "must not be empty"));
        }
        if name.chars().count() > MAX_RULE_NAME_LEN {
            return Err(JournalError::validation(
                "name",
                format!("must be at most {MAX_RULE_NAME_LEN} characters"),
            ));
        }
        let description = normalize_description(description);
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(JournalError::validation(
                "description",
                format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
            ));
        }
        if description.lines().count() > MAX_DESCRIPTION_LINES {
            return Err(JournalError::validation(
                "description",
                format!("must be at most {MAX_DESCRIPTION_LINES} lines"),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            category: category.parse()?,
            description,
            is_active,
        })
    }

    /// True when applying this draft would leave the rule unchanged.
    pub fn is_noop_for(&self, rule: &Rule) -> bool {
        self.name == rule.name
            && self.category == rule.category
            && self.description == rule.description
            && self.is_active == rule.is_active
    }
}

/// Trims trailing whitespace per line and normalizes line endings so that
/// version diffs are not polluted by editor artifacts.
pub fn normalize_description(text: &str) -> String {
    text.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
