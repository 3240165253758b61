//! Rule pages: list, detail, edit, evaluation and version history.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::analytics::{RulePerformance, RuleSummary};
use crate::domain::dates::{format_date, parse_date};
use crate::domain::error::JournalError;
use crate::domain::performance::NewPerformanceEntry;
use crate::domain::rule::{Rule, RuleDraft};
use crate::domain::rule_history::{RuleVersion, diff_versions};

use super::templates::{
    DiffView, EntryRow, RuleDetailTemplate, RuleEditTemplate, RuleHistoryTemplate, RuleRow,
    RulesTemplate, VersionRow, category_options, status_options,
};
use super::{AppState, WebError, render_page};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Checkbox; present only when ticked.
    pub is_active: Option<String>,
}

impl RuleForm {
    /// Empty create form with the rule active by default.
    pub fn blank() -> Self {
        Self {
            is_active: Some("on".into()),
            ..Self::default()
        }
    }

    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            name: rule.name.clone(),
            category: rule.category.as_str().to_string(),
            description: rule.description.clone(),
            is_active: rule.is_active.then(|| "on".to_string()),
        }
    }

    pub fn active(&self) -> bool {
        self.is_active.is_some()
    }

    fn to_draft(&self) -> Result<RuleDraft, JournalError> {
        RuleDraft::new(&self.name, &self.category, &self.description, self.active())
    }
}

#[derive(Debug, Deserialize)]
pub struct EvaluateForm {
    #[serde(default)]
    pub date: String,
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<u32>,
    pub to: Option<u32>,
}

fn rule_rows(state: &AppState) -> Result<Vec<RuleRow>, JournalError> {
    let mut rows = Vec::new();
    for rule in state.store.list_rules()? {
        let entries = state.store.entries_for_rule(rule.id)?;
        rows.push(RuleRow::new(&rule, &RuleSummary::compute(&rule, &entries)));
    }
    Ok(rows)
}

fn rules_page(
    state: &AppState,
    headers: &HeaderMap,
    form: RuleForm,
    error: Option<String>,
) -> Result<Response, WebError> {
    let template = RulesTemplate {
        rules: rule_rows(state)?,
        categories: category_options(&form.category),
        form,
        error,
    };
    render_page(headers, "Rules", &template)
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    rules_page(&state, &headers, RuleForm::blank(), None)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<RuleForm>,
) -> Result<Response, WebError> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(err @ JournalError::Validation { .. }) => {
            let page = rules_page(&state, &headers, form, Some(err.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };
    let rule = state.store.create_rule(&draft)?;
    log::info!("created rule {} ({})", rule.id, rule.name);
    Ok(Redirect::to(&format!("/rules/{}", rule.id)).into_response())
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let rule = state.store.get_rule(id)?;
    let entries = state.store.entries_for_rule(id)?;
    let performance = RulePerformance::compute(&entries);

    let streak = match performance.streak.status {
        Some(status) => format!("{} x {}", performance.streak.length, status.label()),
        None => "None yet".to_string(),
    };
    // newest first for display
    let rows = entries.iter().rev().map(EntryRow::new).collect();

    let template = RuleDetailTemplate {
        rule: &rule,
        performance: &performance,
        streak,
        entries: rows,
        statuses: status_options(""),
        today: format_date((state.today)()),
        updated: rule.updated_at.format("%Y-%m-%d %H:%M").to_string(),
    };
    render_page(&headers, &rule.name, &template)
}

fn edit_page(
    headers: &HeaderMap,
    rule_id: i64,
    form: RuleForm,
    error: Option<String>,
) -> Result<Response, WebError> {
    let template = RuleEditTemplate {
        rule_id,
        categories: category_options(&form.category),
        form,
        error,
    };
    render_page(headers, "Edit rule", &template)
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let rule = state.store.get_rule(id)?;
    edit_page(&headers, id, RuleForm::from_rule(&rule), None)
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<RuleForm>,
) -> Result<Response, WebError> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(err @ JournalError::Validation { .. }) => {
            // confirm the rule exists before showing its form again
            state.store.get_rule(id)?;
            let page = edit_page(&headers, id, form, Some(err.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };
    let rule = state.store.update_rule(id, &draft)?;
    log::info!("rule {} now at version {}", rule.id, rule.version);
    Ok(Redirect::to(&format!("/rules/{id}")).into_response())
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    state.store.delete_rule(id)?;
    log::info!("deleted rule {id}");
    Ok(Redirect::to("/rules").into_response())
}

pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<EvaluateForm>,
) -> Result<Response, WebError> {
    let date = if form.date.trim().is_empty() {
        (state.today)()
    } else {
        parse_date("date", &form.date)?
    };
    let entry = NewPerformanceEntry {
        rule_id: id,
        date,
        status: form.status.parse()?,
        notes: form.notes.trim().to_string(),
    };
    state.store.append_entry(&entry)?;
    Ok(Redirect::to(&format!("/rules/{id}")).into_response())
}

/// All versions of a rule, newest first, with the live rule on top.
fn all_versions(state: &AppState, rule: &Rule) -> Result<Vec<RuleVersion>, JournalError> {
    let mut versions = vec![RuleVersion::current(rule)];
    versions.extend(state.store.list_versions(rule.id)?);
    Ok(versions)
}

fn find_version(versions: &[RuleVersion], number: u32) -> Result<&RuleVersion, WebError> {
    versions
        .iter()
        .find(|v| v.version == number)
        .ok_or_else(|| WebError::not_found(format!("version {number} not found")))
}

/// Without a query the newest change (previous version against the live
/// rule) is shown.
pub async fn history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, WebError> {
    let rule = state.store.get_rule(id)?;
    let versions = all_versions(&state, &rule)?;

    let diff = match (query.from, query.to) {
        (Some(from), Some(to)) => {
            let old = find_version(&versions, from)?;
            let new = find_version(&versions, to)?;
            Some(DiffView::new(&diff_versions(old, new)))
        }
        (None, None) if versions.len() > 1 => {
            Some(DiffView::new(&diff_versions(&versions[1], &versions[0])))
        }
        (None, None) => None,
        _ => return Err(WebError::bad_request("both from and to are required")),
    };

    let template = RuleHistoryTemplate {
        rule_id: rule.id,
        rule_name: rule.name.clone(),
        versions: versions
            .iter()
            .map(|v| VersionRow::new(v, v.version == rule.version))
            .collect(),
        diff,
    };
    render_page(&headers, "Rule history", &template)
}
