//! Dashboard and fallback handlers.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::analytics::RuleSummary;
use crate::domain::dates::format_date;
use crate::domain::trade_stats::TradeStats;

use super::templates::{DashboardTemplate, RuleRow, StatsView, TradeRow};
use super::{AppState, WebError, render_page};

const RECENT_TRADES: usize = 5;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let today = (state.today)();
    let trades = state.store.list_trades()?;
    let stats = TradeStats::compute(&trades);

    let mut rules = Vec::new();
    for rule in state.store.list_rules()? {
        let entries = state.store.entries_for_rule(rule.id)?;
        rules.push(RuleRow::new(&rule, &RuleSummary::compute(&rule, &entries)));
    }

    let tracked_today = state.store.entries_on(today)?.len();

    let template = DashboardTemplate {
        today: format_date(today),
        stats: StatsView::new(&stats),
        rules,
        recent_trades: trades.iter().take(RECENT_TRADES).map(TradeRow::new).collect(),
        tracked_today,
    };
    render_page(&headers, "Dashboard", &template)
}

pub async fn not_found() -> Response {
    WebError::not_found("Page not found").into_response()
}
