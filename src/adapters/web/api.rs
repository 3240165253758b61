//! JSON endpoints. Every response body is an [`ActionResult`].

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::action_result::ActionResult;
use crate::domain::analytics::RulePerformance;
use crate::domain::dates::parse_date;
use crate::domain::error::JournalError;
use crate::domain::trade_stats::TradeStats;
use crate::domain::trend_calendar::{DayTrend, replay};

use super::AppState;
use super::error::status_from_error;

/// Longest range `/api/trend` will replay in one request.
pub const MAX_TREND_DAYS: i64 = 3660;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn respond<T: Serialize>(result: Result<T, JournalError>) -> Response {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) => status_from_error(err),
    };
    (status, Json(ActionResult::from(result))).into_response()
}

pub async fn rule_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    respond(
        state
            .store
            .entries_for_rule(id)
            .map(|entries| RulePerformance::compute(&entries)),
    )
}

/// Defaults to the current month up to today.
fn resolve_range(
    state: &AppState,
    query: &RangeQuery,
) -> Result<(NaiveDate, NaiveDate), JournalError> {
    let today = (state.today)();
    let to = match query.to.as_deref() {
        Some(v) if !v.trim().is_empty() => parse_date("to", v)?,
        _ => today,
    };
    let from = match query.from.as_deref() {
        Some(v) if !v.trim().is_empty() => parse_date("from", v)?,
        _ => to.with_day(1).unwrap_or(to),
    };
    if from > to {
        return Err(JournalError::validation("from", "must not be after to"));
    }
    if (to - from).num_days() >= MAX_TREND_DAYS {
        return Err(JournalError::validation(
            "to",
            format!("range is limited to {MAX_TREND_DAYS} days"),
        ));
    }
    Ok((from, to))
}

pub async fn trend_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let result: Result<Vec<DayTrend>, JournalError> = resolve_range(&state, &query)
        .and_then(|(from, to)| {
            let events = state.store.events_until(to)?;
            Ok(replay(&events, from, to))
        });
    respond(result)
}

pub async fn trade_stats(State(state): State<Arc<AppState>>) -> Response {
    respond(state.store.list_trades().map(|trades| TradeStats::compute(&trades)))
}
