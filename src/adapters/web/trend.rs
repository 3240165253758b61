//! Trend calendar and reversal event log.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::dates::{
    WEEKDAY_NAMES, first_of_month, format_date, last_of_month, month_key, parse_date, parse_month,
};
use crate::domain::error::JournalError;
use crate::domain::trend_calendar::MonthGrid;
use crate::domain::trend_event::{NewTrendEvent, TrendEvent, parse_time};

use super::templates::{EventRow, RuleOption, TrendTemplate, calendar_weeks};
use super::{AppState, WebError, render_page};

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub date: String,
    pub time: String,
    pub event_type: String,
    pub direction: String,
    pub description: String,
    pub rule_id: String,
}

impl EventForm {
    fn to_event(&self) -> Result<NewTrendEvent, JournalError> {
        let rule_id = match self.rule_id.trim() {
            "" => None,
            value => Some(value.parse::<i64>().map_err(|_| {
                JournalError::validation("rule_id", format!("bad rule id {value:?}"))
            })?),
        };
        Ok(NewTrendEvent {
            date: parse_date("date", &self.date)?,
            time: parse_time(&self.time)?,
            event_type: self.event_type.parse()?,
            direction: self.direction.parse()?,
            description: self.description.trim().to_string(),
            rule_id,
        })
    }
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_string(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

fn calendar_page(
    state: &AppState,
    headers: &HeaderMap,
    year: i32,
    month: u32,
    error: Option<String>,
) -> Result<Response, WebError> {
    let (Some(first), Some(last)) = (first_of_month(year, month), last_of_month(year, month))
    else {
        return Err(WebError::bad_request(format!("no such month {year}-{month}")));
    };

    let events = state.store.events_until(last)?;
    let grid = MonthGrid::build(year, month, &events)
        .ok_or_else(|| WebError::bad_request(format!("no such month {year}-{month}")))?;

    let rules = state.store.list_rules()?;
    let names: HashMap<i64, &str> = rules.iter().map(|r| (r.id, r.name.as_str())).collect();

    let mut in_month: Vec<&TrendEvent> = events.iter().filter(|e| e.date >= first).collect();
    in_month.sort_by(|a, b| TrendEvent::chronological(a, b));

    let (prev_year, prev_month) = shift_month(year, month, -1);
    let (next_year, next_month) = shift_month(year, month, 1);

    let template = TrendTemplate {
        month_label: first.format("%B %Y").to_string(),
        month_key: month_key(first),
        prev_month: month_string(prev_year, prev_month),
        next_month: month_string(next_year, next_month),
        weekday_names: WEEKDAY_NAMES,
        weeks: calendar_weeks(&grid),
        bullish_days: grid.bullish_days(),
        reversal_count: grid.reversal_count(),
        events: in_month
            .iter()
            .map(|e| EventRow::new(e, e.rule_id.and_then(|id| names.get(&id).copied())))
            .collect(),
        rules: rules
            .iter()
            .map(|r| RuleOption {
                id: r.id,
                name: r.name.clone(),
            })
            .collect(),
        event_months: state.store.event_months()?,
        today: format_date((state.today)()),
        error,
    };
    render_page(headers, "Trend calendar", &template)
}

pub async fn calendar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> Result<Response, WebError> {
    let (year, month) = match query.month.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => parse_month("month", value)?,
        _ => {
            let today = (state.today)();
            (today.year(), today.month())
        }
    };
    calendar_page(&state, &headers, year, month, None)
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<EventForm>,
) -> Result<Response, WebError> {
    let event = match form.to_event() {
        Ok(event) => event,
        Err(err @ JournalError::Validation { .. }) => {
            let shown = parse_date("date", &form.date).unwrap_or_else(|_| (state.today)());
            let page = calendar_page(
                &state,
                &headers,
                shown.year(),
                shown.month(),
                Some(err.to_string()),
            )?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };
    let created = state.store.create_event(&event)?;
    log::info!(
        "recorded {} on {} ({})",
        created.event_type,
        format_date(created.date),
        created.direction
    );
    Ok(redirect_to_month(created.date))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    state.store.delete_event(id)?;
    Ok(Redirect::to("/trend").into_response())
}

fn redirect_to_month(date: NaiveDate) -> Response {
    Redirect::to(&format!("/trend?month={}", month_key(date))).into_response()
}
