//! Web server adapter.
//!
//! Axum server with server-rendered pages; HTMX requests receive the page
//! fragment without the surrounding layout.

mod api;
mod error;
mod handlers;
mod rules;
mod templates;
mod tracking;
mod trades;
mod trend;

pub use error::WebError;
pub use templates::css_gradient;

use askama::Template;
use axum::{
    Router,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::ports::JournalStore;

pub struct AppState {
    pub store: Arc<dyn JournalStore + Send + Sync>,
    /// Supplies "today" for default form values.
    pub today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(store: Arc<dyn JournalStore + Send + Sync>) -> Self {
        Self {
            store,
            today: local_today,
        }
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/rules", get(rules::list).post(rules::create))
        .route("/rules/{id}", get(rules::detail).post(rules::update))
        .route("/rules/{id}/edit", get(rules::edit_form))
        .route("/rules/{id}/delete", post(rules::delete))
        .route("/rules/{id}/evaluate", post(rules::evaluate))
        .route("/rules/{id}/history", get(rules::history))
        .route("/tracking", get(tracking::checklist).post(tracking::save))
        .route("/trades", get(trades::list).post(trades::create))
        .route("/trades/{id}", post(trades::update))
        .route("/trades/{id}/edit", get(trades::edit_form))
        .route("/trades/{id}/delete", post(trades::delete))
        .route("/trend", get(trend::calendar))
        .route("/trend/events", post(trend::create_event))
        .route("/trend/events/{id}/delete", post(trend::delete_event))
        .route("/api/rules/{id}/performance", get(api::rule_performance))
        .route("/api/trend", get(api::trend_range))
        .route("/api/trades/stats", get(api::trade_stats))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

/// Renders `content` as a fragment for HTMX, or wrapped in the layout.
fn render_page<T: Template>(
    headers: &HeaderMap,
    title: &str,
    content: &T,
) -> Result<Response, WebError> {
    let fragment = content
        .render()
        .map_err(|e| WebError::internal(format!("template error: {e}")))?;
    if is_htmx_request(headers) {
        return Ok(Html(fragment).into_response());
    }
    let page = templates::Layout {
        title,
        content: &fragment,
    }
    .render()
    .map_err(|e| WebError::internal(format!("template error: {e}")))?;
    Ok(Html(page).into_response())
}
