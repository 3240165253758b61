//! Trade log pages.

use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::dates::{format_date, parse_date};
use crate::domain::error::JournalError;
use crate::domain::trade::{Trade, TradeDraft, TradeSide, parse_f64, parse_optional_f64};
use crate::domain::trade_stats::TradeStats;

use super::templates::{StatsView, SymbolRow, TradeEditTemplate, TradeRow, TradesTemplate};
use super::{AppState, WebError, render_page};

/// Raw trade form; numbers stay text until [`TradeForm::to_draft`] so a
/// rejected submission can be shown back unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TradeForm {
    pub symbol: String,
    pub side: String,
    pub entry_date: String,
    pub exit_date: String,
    pub entry_price: String,
    pub exit_price: String,
    pub quantity: String,
    pub fees: String,
    pub notes: String,
}

impl TradeForm {
    pub fn blank(today: chrono::NaiveDate) -> Self {
        Self {
            side: TradeSide::Long.as_str().to_string(),
            entry_date: format_date(today),
            ..Self::default()
        }
    }

    pub fn from_trade(trade: &Trade) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            side: trade.side.as_str().to_string(),
            entry_date: format_date(trade.entry_date),
            exit_date: trade.exit_date.map(format_date).unwrap_or_default(),
            entry_price: trade.entry_price.to_string(),
            exit_price: trade.exit_price.map(|p| p.to_string()).unwrap_or_default(),
            quantity: trade.quantity.to_string(),
            fees: trade.fees.to_string(),
            notes: trade.notes.clone(),
        }
    }

    pub fn is_short(&self) -> bool {
        self.side == TradeSide::Short.as_str()
    }

    pub fn to_draft(&self) -> Result<TradeDraft, JournalError> {
        let exit_date = match self.exit_date.trim() {
            "" => None,
            value => Some(parse_date("exit_date", value)?),
        };
        TradeDraft {
            symbol: self.symbol.clone(),
            side: self.side.parse()?,
            entry_date: parse_date("entry_date", &self.entry_date)?,
            exit_date,
            entry_price: parse_f64("entry_price", &self.entry_price)?,
            exit_price: parse_optional_f64("exit_price", &self.exit_price)?,
            quantity: parse_f64("quantity", &self.quantity)?,
            fees: parse_optional_f64("fees", &self.fees)?.unwrap_or(0.0),
            notes: self.notes.clone(),
        }
        .validate()
    }
}

fn trades_page(
    state: &AppState,
    headers: &HeaderMap,
    form: TradeForm,
    error: Option<String>,
) -> Result<Response, WebError> {
    let trades = state.store.list_trades()?;
    let stats = TradeStats::compute(&trades);
    let template = TradesTemplate {
        trades: trades.iter().map(TradeRow::new).collect(),
        stats: StatsView::new(&stats),
        symbols: stats.by_symbol.iter().map(SymbolRow::new).collect(),
        form,
        error,
    };
    render_page(headers, "Trades", &template)
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let form = TradeForm::blank((state.today)());
    trades_page(&state, &headers, form, None)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(err @ JournalError::Validation { .. }) => {
            let page = trades_page(&state, &headers, form, Some(err.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };
    let trade = state.store.create_trade(&draft)?;
    log::info!("logged trade {} {} {}", trade.id, trade.side, trade.symbol);
    Ok(Redirect::to("/trades").into_response())
}

fn edit_page(
    headers: &HeaderMap,
    trade_id: i64,
    form: TradeForm,
    error: Option<String>,
) -> Result<Response, WebError> {
    let template = TradeEditTemplate {
        trade_id,
        form,
        error,
    };
    render_page(headers, "Edit trade", &template)
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let trade = state.store.get_trade(id)?;
    edit_page(&headers, id, TradeForm::from_trade(&trade), None)
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(err @ JournalError::Validation { .. }) => {
            state.store.get_trade(id)?;
            let page = edit_page(&headers, id, form, Some(err.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };
    state.store.update_trade(id, &draft)?;
    Ok(Redirect::to("/trades").into_response())
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    state.store.delete_trade(id)?;
    log::info!("deleted trade {id}");
    Ok(Redirect::to("/trades").into_response())
}
