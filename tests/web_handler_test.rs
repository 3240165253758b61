#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Full page vs HTMX fragment responses
//! - Rule creation, validation, evaluation and version history
//! - Daily tracking replaces the day's status
//! - Trend calendar rendering and event validation
//! - JSON API result shapes and status codes
//! - 404 handling

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use tradejournal::adapters::sqlite_adapter::SqliteAdapter;
use tradejournal::adapters::web::{AppState, build_router};
use tradejournal::domain::performance::PerformanceStatus;
use tradejournal::domain::trend_event::{Direction, EventType};
use tradejournal::ports::performance_port::PerformancePort;
use tradejournal::ports::rule_port::RulePort;
use tradejournal::ports::trade_port::TradePort;

use common::*;

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
}

fn create_test_app() -> (Router, Arc<SqliteAdapter>) {
    let store = Arc::new(memory_store());
    let state = AppState {
        store: store.clone(),
        today: fixed_today,
    };
    (build_router(state, "static"), store)
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_htmx(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header("HX-Request", "true")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn post_form(app: Router, uri: &str, body: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).into_owned()
}

async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

mod page_tests {
    use super::*;

    #[tokio::test]
    async fn dashboard_renders_full_page() {
        let (app, _) = create_test_app();
        let response = get(app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Dashboard"));
        assert!(html.contains("2024-05-15"));
    }

    #[tokio::test]
    async fn htmx_request_gets_fragment_only() {
        let (app, _) = create_test_app();
        let html = body_text(get_htmx(app, "/").await).await;
        assert!(!html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<section class=\"dashboard\">"));
    }

    #[tokio::test]
    async fn unknown_path_is_404_page() {
        let (app, _) = create_test_app();
        let response = get(app, "/no/such/page").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn dashboard_lists_rules_and_trades() {
        let (app, store) = create_test_app();
        add_rule(&store, "Wait for the close", "Entry");
        add_trade(&store, "BHP", 40.0, Some(44.0));
        let html = body_text(get(app, "/").await).await;
        assert!(html.contains("Wait for the close"));
        assert!(html.contains("BHP"));
        assert!(html.contains("40.00"));
    }
}

mod rule_tests {
    use super::*;

    #[tokio::test]
    async fn create_rule_redirects_to_detail() {
        let (app, store) = create_test_app();
        let response = post_form(
            app,
            "/rules",
            "name=Cut+losses+early&category=Risk+Management&description=Exit+at+-2R&is_active=on",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let rules = store.list_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "Cut losses early");
        assert!(rules[0].is_active);
        assert_eq!(location(&response), format!("/rules/{}", rules[0].id));
    }

    #[tokio::test]
    async fn blank_name_rerenders_form_with_400() {
        let (app, store) = create_test_app();
        let response = post_form(app, "/rules", "name=++&category=Entry&description=keep+me").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("invalid name"));
        assert!(html.contains("keep me"));
        assert!(store.list_rules().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_rule_is_404() {
        let (app, _) = create_test_app();
        let response = get(app, "/rules/99").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("rule 99 not found"));
    }

    #[tokio::test]
    async fn evaluate_appends_entry_and_detail_shows_rate() {
        let (app, store) = create_test_app();
        let rule = add_rule(&store, "No revenge trades", "Psychology");
        let uri = format!("/rules/{}/evaluate", rule.id);

        let first = post_form(app.clone(), &uri, "date=2024-05-13&status=success").await;
        assert_eq!(first.status(), StatusCode::SEE_OTHER);
        post_form(app.clone(), &uri, "date=2024-05-13&status=failure").await;
        post_form(app.clone(), &uri, "status=success&notes=calm").await;

        let entries = store.entries_for_rule(rule.id).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].date, fixed_today());

        let html = body_text(get(app, &format!("/rules/{}", rule.id)).await).await;
        assert!(html.contains("67%"));
        assert!(html.contains("calm"));
    }

    #[tokio::test]
    async fn update_creates_version_and_history_shows_diff() {
        let (app, store) = create_test_app();
        let rule = add_rule(&store, "Size down after losses", "Risk Management");

        let response = post_form(
            app.clone(),
            &format!("/rules/{}", rule.id),
            "name=Size+down+after+two+losses&category=Risk+Management&description=Half+size&is_active=on",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let updated = store.get_rule(rule.id).unwrap();
        assert_eq!(updated.version, rule.version + 1);
        assert_eq!(store.list_versions(rule.id).unwrap().len(), 1);

        let html = body_text(get(app, &format!("/rules/{}/history", rule.id)).await).await;
        assert!(html.contains("Size down after two losses"));
        assert!(html.contains("+ Half size"));
    }

    #[tokio::test]
    async fn history_with_unknown_version_is_404() {
        let (app, store) = create_test_app();
        let rule = add_rule(&store, "Journal every trade", "Other");
        let response = get(app, &format!("/rules/{}/history?from=1&to=7", rule.id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_rule() {
        let (app, store) = create_test_app();
        let rule = add_rule(&store, "Temporary", "Other");
        record(&store, rule.id, date(2024, 5, 1), PerformanceStatus::Success);

        let response = post_form(app, &format!("/rules/{}/delete", rule.id), "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(store.list_rules().unwrap().is_empty());
        assert!(store.entries_on(date(2024, 5, 1)).unwrap().is_empty());
    }
}

mod tracking_tests {
    use super::*;

    #[tokio::test]
    async fn saving_a_day_twice_keeps_one_entry_per_rule() {
        let (app, store) = create_test_app();
        let rule = add_rule(&store, "Trade the plan", "Entry");
        let id = rule.id;

        post_form(
            app.clone(),
            "/tracking",
            &format!("date=2024-05-10&status_{id}=failure&notes_{id}=chased"),
        )
        .await;
        let response = post_form(
            app.clone(),
            "/tracking",
            &format!("date=2024-05-10&status_{id}=success&notes_{id}="),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/tracking?date=2024-05-10");

        let entries = store.entries_on(date(2024, 5, 10)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, PerformanceStatus::Success);

        let html = body_text(get(app, "/tracking?date=2024-05-10").await).await;
        assert!(html.contains("<option value=\"success\" selected>"));
    }

    #[tokio::test]
    async fn last_representable_day_has_no_next_link() {
        let (app, _) = create_test_app();
        let response = get(app, "/tracking?date=%2B262142-12-31").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("+262142-12-30"));
        assert!(!html.contains("&rarr;"));
    }

    #[tokio::test]
    async fn bad_date_is_400() {
        let (app, _) = create_test_app();
        let response = get(app, "/tracking?date=yesterday").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

mod trade_tests {
    use super::*;

    #[tokio::test]
    async fn create_trade_and_list() {
        let (app, store) = create_test_app();
        let response = post_form(
            app.clone(),
            "/trades",
            "symbol=cba&side=long&entry_date=2024-05-01&entry_price=100&quantity=10&exit_date=2024-05-03&exit_price=105&fees=&notes=",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let trades = store.list_trades().unwrap();
        assert_eq!(trades[0].symbol, "CBA");

        let html = body_text(get(app, "/trades").await).await;
        assert!(html.contains("50.00"));
        assert!(html.contains("Win"));
        assert!(html.contains("5.00%"));
    }

    #[tokio::test]
    async fn exit_price_without_date_rerenders_with_400() {
        let (app, store) = create_test_app();
        let response = post_form(
            app,
            "/trades",
            "symbol=CBA&side=long&entry_date=2024-05-01&entry_price=100&quantity=10&exit_price=105",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("invalid exit_date"));
        assert!(store.list_trades().unwrap().is_empty());
    }
}

mod trend_tests {
    use super::*;

    #[tokio::test]
    async fn calendar_colours_days_after_reversal() {
        let (app, store) = create_test_app();
        add_event(&store, date(2024, 5, 2), EventType::SuccessfulReversal, Direction::Uptrend);

        let html = body_text(get(app, "/trend?month=2024-05").await).await;
        assert!(html.contains("May 2024"));
        assert!(html.contains("title=\"2024-05-01: bearish\""));
        assert!(html.contains("title=\"2024-05-03: bullish\""));
        assert!(html.contains("linear-gradient(to right, #dc2626 0%, #16a34a 100%)"));
    }

    #[tokio::test]
    async fn create_event_redirects_to_its_month() {
        let (app, _) = create_test_app();
        let response = post_form(
            app,
            "/trend/events",
            "date=2024-03-04&time=10:30&event_type=successful_reversal&direction=downtrend&description=lower+high&rule_id=",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/trend?month=2024-03");
    }

    #[tokio::test]
    async fn unknown_event_type_is_400() {
        let (app, _) = create_test_app();
        let response = post_form(
            app,
            "/trend/events",
            "date=2024-03-04&event_type=sideways&direction=none",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_missing_event_is_404() {
        let (app, _) = create_test_app();
        let response = post_form(app, "/trend/events/42/delete", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod api_tests {
    use super::*;

    #[tokio::test]
    async fn rule_performance_returns_action_result() {
        let (app, store) = create_test_app();
        let rule = add_rule(&store, "Respect stops", "Exit");
        record(&store, rule.id, date(2024, 5, 6), PerformanceStatus::Success);
        record(&store, rule.id, date(2024, 5, 7), PerformanceStatus::Failure);
        record(&store, rule.id, date(2024, 5, 8), PerformanceStatus::NotApplicable);
        record(&store, rule.id, date(2024, 5, 9), PerformanceStatus::Success);

        let response = get(app, &format!("/api/rules/{}/performance", rule.id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["success_rate"], 50);
        assert_eq!(json["data"]["weekdays"].as_array().unwrap().len(), 7);
        assert_eq!(json["data"]["trend"], "insufficient_data");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn missing_rule_returns_failure_shape() {
        let (app, _) = create_test_app();
        let response = get(app, "/api/rules/5/performance").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "rule 5 not found");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn trend_range_replays_days() {
        let (app, store) = create_test_app();
        add_event(&store, date(2024, 5, 2), EventType::SuccessfulReversal, Direction::Uptrend);
        add_event(&store, date(2024, 5, 4), EventType::SuccessfulReversal, Direction::Downtrend);

        let json = body_json(get(app, "/api/trend?from=2024-05-01&to=2024-05-04").await).await;
        let days = json["data"].as_array().unwrap();
        let trends: Vec<&str> = days.iter().map(|d| d["trend"].as_str().unwrap()).collect();
        assert_eq!(trends, vec!["bearish", "bullish", "bullish", "bearish"]);
    }

    #[tokio::test]
    async fn inverted_trend_range_is_400() {
        let (app, _) = create_test_app();
        let response = get(app, "/api/trend?from=2024-05-04&to=2024-05-01").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn trade_stats_summarises_closed_trades() {
        let (app, store) = create_test_app();
        add_trade(&store, "BHP", 10.0, Some(12.0));
        add_trade(&store, "RIO", 10.0, Some(9.0));
        add_trade(&store, "WES", 10.0, None);

        let json = body_json(get(app, "/api/trades/stats").await).await;
        assert_eq!(json["data"]["total_trades"], 3);
        assert_eq!(json["data"]["wins"], 1);
        assert_eq!(json["data"]["losses"], 1);
        assert_eq!(json["data"]["open_trades"], 1);
        assert_eq!(json["data"]["total_pnl"], 10.0);
    }
}
