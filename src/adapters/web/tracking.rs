//! Daily checklist: one status per active rule per day.

use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::dates::{format_date, parse_date};
use crate::domain::error::JournalError;
use crate::domain::performance::{NewPerformanceEntry, PerformanceStatus};

use super::templates::{TrackingRow, TrackingTemplate, status_options};
use super::{AppState, WebError, render_page};

const HISTORY_DAYS: usize = 14;

#[derive(Debug, Default, Deserialize)]
pub struct TrackingQuery {
    pub date: Option<String>,
}

fn resolve_date(state: &AppState, value: Option<&str>) -> Result<NaiveDate, JournalError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => parse_date("date", v),
        _ => Ok((state.today)()),
    }
}

pub async fn checklist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TrackingQuery>,
) -> Result<Response, WebError> {
    let date = resolve_date(&state, query.date.as_deref())?;

    let recorded: HashMap<i64, (PerformanceStatus, String)> = state
        .store
        .entries_on(date)?
        .into_iter()
        .map(|e| (e.rule_id, (e.status, e.notes)))
        .collect();

    let rows = state
        .store
        .list_rules()?
        .into_iter()
        .filter(|rule| rule.is_active || recorded.contains_key(&rule.id))
        .map(|rule| {
            let (status, notes) = match recorded.get(&rule.id) {
                Some((status, notes)) => (status.as_str(), notes.clone()),
                None => ("", String::new()),
            };
            TrackingRow {
                rule_id: rule.id,
                name: rule.name,
                category: rule.category.as_str(),
                options: status_options(status),
                notes,
            }
        })
        .collect();

    let history = state
        .store
        .tracked_dates()?
        .into_iter()
        .take(HISTORY_DAYS)
        .map(format_date)
        .collect();

    let template = TrackingTemplate {
        date: format_date(date),
        prev_date: date.pred_opt().map(format_date),
        next_date: date.succ_opt().map(format_date),
        rows,
        history,
    };
    render_page(&headers, "Daily tracking", &template)
}

/// Submitted checklist fields: `date`, then `status_{rule_id}` and
/// `notes_{rule_id}` per rule. Rules left without a status are skipped.
pub fn parse_checklist(
    fields: &[(String, String)],
) -> Result<(Option<String>, Vec<(i64, PerformanceStatus, String)>), JournalError> {
    let mut date = None;
    let mut statuses: Vec<(i64, PerformanceStatus)> = Vec::new();
    let mut notes: HashMap<i64, String> = HashMap::new();

    for (key, value) in fields {
        if key == "date" {
            date = Some(value.clone());
        } else if let Some(id) = key.strip_prefix("status_") {
            if value.trim().is_empty() {
                continue;
            }
            statuses.push((parse_rule_id(id)?, value.parse()?));
        } else if let Some(id) = key.strip_prefix("notes_") {
            notes.insert(parse_rule_id(id)?, value.trim().to_string());
        }
    }

    let entries = statuses
        .into_iter()
        .map(|(id, status)| (id, status, notes.remove(&id).unwrap_or_default()))
        .collect();
    Ok((date, entries))
}

fn parse_rule_id(value: &str) -> Result<i64, JournalError> {
    value
        .parse()
        .map_err(|_| JournalError::validation("rule", format!("bad rule id {value:?}")))
}

pub async fn save(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, WebError> {
    let (date, entries) = parse_checklist(&fields)?;
    let date = resolve_date(&state, date.as_deref())?;

    for (rule_id, status, notes) in entries {
        state.store.upsert_daily_entry(&NewPerformanceEntry {
            rule_id,
            date,
            status,
            notes,
        })?;
    }
    Ok(Redirect::to(&format!("/tracking?date={}", format_date(date))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn checklist_pairs_notes_with_statuses() {
        let (date, entries) = parse_checklist(&fields(&[
            ("date", "2024-05-06"),
            ("status_1", "success"),
            ("notes_1", " waited for close "),
            ("status_2", ""),
            ("notes_2", "ignored"),
            ("status_3", "not_applicable"),
        ]))
        .unwrap();
        assert_eq!(date.as_deref(), Some("2024-05-06"));
        assert_eq!(
            entries,
            vec![
                (1, PerformanceStatus::Success, "waited for close".to_string()),
                (3, PerformanceStatus::NotApplicable, String::new()),
            ]
        );
    }

    #[test]
    fn checklist_rejects_unknown_status() {
        let result = parse_checklist(&fields(&[("status_1", "maybe")]));
        assert!(matches!(result, Err(JournalError::Validation { .. })));
    }

    #[test]
    fn checklist_rejects_bad_rule_id() {
        let result = parse_checklist(&fields(&[("status_x", "success")]));
        assert!(matches!(result, Err(JournalError::Validation { .. })));
    }
}
