//! Rule versions and the diff between two of them.
//!
//! Every update of a rule first stores a [`RuleVersion`] snapshot of the
//! state being replaced, so the history of a rule is its stored versions plus
//! the live rule itself (see [`RuleVersion::current`]).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rule::{Rule, RuleCategory};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleVersion {
    pub rule_id: i64,
    pub version: u32,
    pub name: String,
    pub category: RuleCategory,
    pub description: String,
    pub is_active: bool,
    /// When this version became the live rule.
    pub created_at: DateTime<Utc>,
}

impl RuleVersion {
    /// Snapshot of the rule as it is right now, before an update is applied.
    pub fn snapshot(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id,
            version: rule.version,
            name: rule.name.clone(),
            category: rule.category,
            description: rule.description.clone(),
            is_active: rule.is_active,
            created_at: rule.updated_at,
        }
    }

    /// The live rule expressed as the newest version.
    pub fn current(rule: &Rule) -> Self {
        Self::snapshot(rule)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineChange {
    Unchanged,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffLine {
    pub change: LineChange,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDiff {
    pub from_version: u32,
    pub to_version: u32,
    pub fields: Vec<FieldChange>,
    pub description: Vec<DiffLine>,
}

impl RuleDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self
                .description
                .iter()
                .all(|l| l.change == LineChange::Unchanged)
    }

    pub fn lines_added(&self) -> usize {
        self.description
            .iter()
            .filter(|l| l.change == LineChange::Added)
            .count()
    }

    pub fn lines_removed(&self) -> usize {
        self.description
            .iter()
            .filter(|l| l.change == LineChange::Removed)
            .count()
    }
}

pub fn diff_versions(old: &RuleVersion, new: &RuleVersion) -> RuleDiff {
    let mut fields = Vec::new();
    if old.name != new.name {
        fields.push(FieldChange {
            field: "name",
            before: old.name.clone(),
            after: new.name.clone(),
        });
    }
    if old.category != new.category {
        fields.push(FieldChange {
            field: "category",
            before: old.category.to_string(),
            after: new.category.to_string(),
        });
    }
    if old.is_active != new.is_active {
        fields.push(FieldChange {
            field: "active",
            before: old.is_active.to_string(),
            after: new.is_active.to_string(),
        });
    }

    RuleDiff {
        from_version: old.version,
        to_version: new.version,
        fields,
        description: diff_lines(&old.description, &new.description),
    }
}

/// Upper bound on the LCS table; larger inputs diff the differing middle
/// as a block replacement.
pub const MAX_DIFF_CELLS: usize = 250_000;

/// Line diff via longest common subsequence over the lines between the common
/// prefix and suffix. Removals are emitted before additions at each point of
/// divergence.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let a: Vec<&str> = if old.is_empty() { Vec::new() } else { old.lines().collect() };
    let b: Vec<&str> = if new.is_empty() { Vec::new() } else { new.lines().collect() };

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    out.extend(a[..prefix].iter().map(|t| line(LineChange::Unchanged, t)));
    if a_mid.len().saturating_mul(b_mid.len()) > MAX_DIFF_CELLS {
        out.extend(a_mid.iter().map(|t| line(LineChange::Removed, t)));
        out.extend(b_mid.iter().map(|t| line(LineChange::Added, t)));
    } else {
        lcs_diff(a_mid, b_mid, &mut out);
    }
    out.extend(a[a.len() - suffix..].iter().map(|t| line(LineChange::Unchanged, t)));
    out
}

fn lcs_diff(a: &[&str], b: &[&str], out: &mut Vec<DiffLine>) {
    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let width = b.len() + 1;
    let mut lcs = vec![0u32; (a.len() + 1) * width];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(line(LineChange::Unchanged, a[i]));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            out.push(line(LineChange::Removed, a[i]));
            i += 1;
        } else {
            out.push(line(LineChange::Added, b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|t| line(LineChange::Removed, t)));
    out.extend(b[j..].iter().map(|t| line(LineChange::Added, t)));
}

fn line(change: LineChange, text: &str) -> DiffLine {
    DiffLine {
        change,
        text: text.to_string(),
    }
}
