//! HTML templates using Askama.
//!
//! Templates receive preformatted strings; number and date formatting lives
//! in the row constructors below rather than in the markup.

use askama::Template;
use chrono::Datelike;

use crate::domain::analytics::{RulePerformance, RuleSummary, TrendDirection};
use crate::domain::dates::format_date;
use crate::domain::performance::{PerformanceEntry, PerformanceStatus};
use crate::domain::rule::{Rule, RuleCategory};
use crate::domain::rule_history::{FieldChange, LineChange, RuleDiff, RuleVersion};
use crate::domain::trade::{Trade, TradeOutcome};
use crate::domain::trade_stats::{SymbolResult, TradeStats};
use crate::domain::trend_calendar::{DayTrend, MarketTrend, MonthGrid};
use crate::domain::trend_event::{EventType, TrendEvent};

use super::rules::RuleForm;
use super::trades::TradeForm;

pub const BULLISH_COLOUR: &str = "#16a34a";
pub const BEARISH_COLOUR: &str = "#dc2626";

#[derive(Template)]
#[template(path = "layout.html")]
pub struct Layout<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub today: String,
    pub stats: StatsView,
    pub rules: Vec<RuleRow>,
    pub recent_trades: Vec<TradeRow>,
    pub tracked_today: usize,
}

#[derive(Template)]
#[template(path = "rules.html")]
pub struct RulesTemplate {
    pub rules: Vec<RuleRow>,
    pub categories: Vec<SelectOption>,
    pub form: RuleForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "rule_detail.html")]
pub struct RuleDetailTemplate<'a> {
    pub rule: &'a Rule,
    pub performance: &'a RulePerformance,
    pub streak: String,
    pub entries: Vec<EntryRow>,
    pub statuses: Vec<SelectOption>,
    pub today: String,
    pub updated: String,
}

#[derive(Template)]
#[template(path = "rule_edit.html")]
pub struct RuleEditTemplate {
    pub rule_id: i64,
    pub form: RuleForm,
    pub categories: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "rule_history.html")]
pub struct RuleHistoryTemplate {
    pub rule_id: i64,
    pub rule_name: String,
    pub versions: Vec<VersionRow>,
    pub diff: Option<DiffView>,
}

#[derive(Template)]
#[template(path = "tracking.html")]
pub struct TrackingTemplate {
    pub date: String,
    /// `None` at the ends of the representable date range.
    pub prev_date: Option<String>,
    pub next_date: Option<String>,
    pub rows: Vec<TrackingRow>,
    pub history: Vec<String>,
}

#[derive(Template)]
#[template(path = "trades.html")]
pub struct TradesTemplate {
    pub trades: Vec<TradeRow>,
    pub stats: StatsView,
    pub symbols: Vec<SymbolRow>,
    pub form: TradeForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "trade_edit.html")]
pub struct TradeEditTemplate {
    pub trade_id: i64,
    pub form: TradeForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "trend.html")]
pub struct TrendTemplate {
    pub month_label: String,
    pub month_key: String,
    pub prev_month: String,
    pub next_month: String,
    pub weekday_names: [&'static str; 7],
    pub weeks: Vec<Vec<CalendarCell>>,
    pub bullish_days: usize,
    pub reversal_count: usize,
    pub events: Vec<EventRow>,
    pub rules: Vec<RuleOption>,
    pub event_months: Vec<String>,
    pub today: String,
    pub error: Option<String>,
}

pub struct StatsView {
    pub total_trades: usize,
    pub open_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: String,
    pub total_pnl: String,
    pub pnl_class: &'static str,
    pub profit_factor: String,
    pub avg_win: String,
    pub avg_loss: String,
    pub largest_win: String,
    pub largest_loss: String,
    pub avg_holding_days: String,
}

impl StatsView {
    pub fn new(stats: &TradeStats) -> Self {
        Self {
            total_trades: stats.total_trades,
            open_trades: stats.open_trades,
            wins: stats.wins,
            losses: stats.losses,
            win_rate: format!("{:.1}%", stats.win_rate),
            total_pnl: money(stats.total_pnl),
            pnl_class: sign_class(stats.total_pnl),
            profit_factor: stats.profit_factor_display(),
            avg_win: money(stats.avg_win),
            avg_loss: money(stats.avg_loss),
            largest_win: money(stats.largest_win),
            largest_loss: money(stats.largest_loss),
            avg_holding_days: format!("{:.1}", stats.avg_holding_days),
        }
    }
}

pub struct RuleRow {
    pub id: i64,
    pub name: String,
    pub category: &'static str,
    pub is_active: bool,
    pub version: u32,
    pub total: usize,
    pub success_rate: i64,
    pub trend_label: &'static str,
    pub trend_class: &'static str,
}

impl RuleRow {
    pub fn new(rule: &Rule, summary: &RuleSummary) -> Self {
        Self {
            id: rule.id,
            name: rule.name.clone(),
            category: rule.category.as_str(),
            is_active: rule.is_active,
            version: rule.version,
            total: summary.total,
            success_rate: summary.success_rate,
            trend_label: summary.trend.label(),
            trend_class: trend_class(summary.trend),
        }
    }
}

pub struct EntryRow {
    pub date: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub notes: String,
}

impl EntryRow {
    pub fn new(entry: &PerformanceEntry) -> Self {
        Self {
            date: format_date(entry.date),
            status_label: entry.status.label(),
            status_class: entry.status.as_str(),
            notes: entry.notes.clone(),
        }
    }
}

pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub fn status_options(selected: &str) -> Vec<SelectOption> {
    PerformanceStatus::ALL
        .iter()
        .map(|s| SelectOption {
            value: s.as_str(),
            label: s.label(),
            selected: s.as_str() == selected,
        })
        .collect()
}

pub fn category_options(selected: &str) -> Vec<SelectOption> {
    RuleCategory::ALL
        .iter()
        .map(|c| SelectOption {
            value: c.as_str(),
            label: c.as_str(),
            selected: c.as_str().eq_ignore_ascii_case(selected.trim()),
        })
        .collect()
}

pub struct VersionRow {
    pub version: u32,
    pub name: String,
    pub category: &'static str,
    pub is_active: bool,
    pub created: String,
    pub is_current: bool,
}

impl VersionRow {
    pub fn new(version: &RuleVersion, is_current: bool) -> Self {
        Self {
            version: version.version,
            name: version.name.clone(),
            category: version.category.as_str(),
            is_active: version.is_active,
            created: version.created_at.format("%Y-%m-%d %H:%M").to_string(),
            is_current,
        }
    }
}

pub struct DiffLineRow {
    pub class: &'static str,
    pub marker: &'static str,
    pub text: String,
}

pub struct DiffView {
    pub from_version: u32,
    pub to_version: u32,
    pub fields: Vec<FieldChange>,
    pub lines: Vec<DiffLineRow>,
    pub added: usize,
    pub removed: usize,
    pub unchanged: bool,
}

impl DiffView {
    pub fn new(diff: &RuleDiff) -> Self {
        let lines = diff
            .description
            .iter()
            .map(|line| {
                let (class, marker) = match line.change {
                    LineChange::Unchanged => ("same", " "),
                    LineChange::Added => ("added", "+"),
                    LineChange::Removed => ("removed", "-"),
                };
                DiffLineRow {
                    class,
                    marker,
                    text: line.text.clone(),
                }
            })
            .collect();
        Self {
            from_version: diff.from_version,
            to_version: diff.to_version,
            fields: diff.fields.clone(),
            lines,
            added: diff.lines_added(),
            removed: diff.lines_removed(),
            unchanged: diff.is_empty(),
        }
    }
}

pub struct TrackingRow {
    pub rule_id: i64,
    pub name: String,
    pub category: &'static str,
    /// Status choices with the stored status, if any, selected.
    pub options: Vec<SelectOption>,
    pub notes: String,
}

pub struct TradeRow {
    pub id: i64,
    pub symbol: String,
    pub side: &'static str,
    pub entry_date: String,
    pub exit_date: String,
    pub entry_price: String,
    pub exit_price: String,
    pub quantity: String,
    pub pnl: String,
    pub pnl_class: &'static str,
    pub return_pct: String,
    pub outcome: &'static str,
    pub notes: String,
}

impl TradeRow {
    pub fn new(trade: &Trade) -> Self {
        let outcome = trade.outcome();
        Self {
            id: trade.id,
            symbol: trade.symbol.clone(),
            side: trade.side.as_str(),
            entry_date: format_date(trade.entry_date),
            exit_date: trade.exit_date.map(format_date).unwrap_or_default(),
            entry_price: format!("{:.2}", trade.entry_price),
            exit_price: trade
                .exit_price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_default(),
            quantity: trade.quantity.to_string(),
            pnl: trade.pnl().map(money).unwrap_or_default(),
            pnl_class: match outcome {
                TradeOutcome::Win => "positive",
                TradeOutcome::Loss => "negative",
                TradeOutcome::Breakeven | TradeOutcome::Open => "neutral",
            },
            return_pct: trade
                .return_pct()
                .map(|r| format!("{r:.2}%"))
                .unwrap_or_default(),
            outcome: outcome.label(),
            notes: trade.notes.clone(),
        }
    }
}

pub struct SymbolRow {
    pub symbol: String,
    pub trades: usize,
    pub wins: usize,
    pub pnl: String,
    pub pnl_class: &'static str,
}

impl SymbolRow {
    pub fn new(result: &SymbolResult) -> Self {
        Self {
            symbol: result.symbol.clone(),
            trades: result.trades,
            wins: result.wins,
            pnl: money(result.pnl),
            pnl_class: sign_class(result.pnl),
        }
    }
}

pub struct CalendarCell {
    pub blank: bool,
    pub day: u32,
    pub date: String,
    pub trend: &'static str,
    /// CSS `background` value for the cell.
    pub background: String,
    pub event_count: usize,
}

impl CalendarCell {
    fn blank() -> Self {
        Self {
            blank: true,
            day: 0,
            date: String::new(),
            trend: "",
            background: String::new(),
            event_count: 0,
        }
    }

    fn from_day(day: &DayTrend) -> Self {
        Self {
            blank: false,
            day: day.date.day(),
            date: format_date(day.date),
            trend: day.trend.as_str(),
            background: css_gradient(&day.transitions),
            event_count: day.events.len(),
        }
    }
}

pub fn calendar_weeks(grid: &MonthGrid) -> Vec<Vec<CalendarCell>> {
    grid.weeks
        .iter()
        .map(|week| {
            week.iter()
                .map(|cell| cell.as_ref().map_or_else(CalendarCell::blank, CalendarCell::from_day))
                .collect()
        })
        .collect()
}

pub struct EventRow {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub event_type: &'static str,
    pub direction: &'static str,
    pub description: String,
    pub rule_name: String,
}

impl EventRow {
    pub fn new(event: &TrendEvent, rule_name: Option<&str>) -> Self {
        Self {
            id: event.id,
            date: format_date(event.date),
            time: event
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            event_type: match event.event_type {
                EventType::SuccessfulReversal => "Successful reversal",
                EventType::FailedReversal => "Failed reversal",
            },
            direction: event.direction.as_str(),
            description: event.description.clone(),
            rule_name: rule_name.unwrap_or_default().to_string(),
        }
    }
}

pub struct RuleOption {
    pub id: i64,
    pub name: String,
}

fn trend_colour(trend: MarketTrend) -> &'static str {
    match trend {
        MarketTrend::Bullish => BULLISH_COLOUR,
        MarketTrend::Bearish => BEARISH_COLOUR,
    }
}

/// CSS background for a calendar day. One transition point is a solid
/// colour; more become evenly spaced stops of a left-to-right gradient.
pub fn css_gradient(transitions: &[MarketTrend]) -> String {
    match transitions {
        [] => trend_colour(MarketTrend::INITIAL).to_string(),
        [only] => trend_colour(*only).to_string(),
        _ => {
            let last = transitions.len() - 1;
            let stops: Vec<String> = transitions
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{} {}%", trend_colour(*t), i * 100 / last))
                .collect();
            format!("linear-gradient(to right, {})", stops.join(", "))
        }
    }
}

fn trend_class(trend: TrendDirection) -> &'static str {
    match trend {
        TrendDirection::Improving => "positive",
        TrendDirection::Declining => "negative",
        TrendDirection::Stable | TrendDirection::InsufficientData => "neutral",
    }
}

fn sign_class(value: f64) -> &'static str {
    if value > 0.0 {
        "positive"
    } else if value < 0.0 {
        "negative"
    } else {
        "neutral"
    }
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeSide;
    use chrono::NaiveDate;

    #[test]
    fn single_transition_is_solid() {
        assert_eq!(css_gradient(&[MarketTrend::Bullish]), BULLISH_COLOUR);
        assert_eq!(css_gradient(&[]), BEARISH_COLOUR);
    }

    #[test]
    fn multiple_transitions_spread_evenly() {
        let css = css_gradient(&[
            MarketTrend::Bearish,
            MarketTrend::Bullish,
            MarketTrend::Bearish,
        ]);
        assert_eq!(
            css,
            "linear-gradient(to right, #dc2626 0%, #16a34a 50%, #dc2626 100%)"
        );
    }

    #[test]
    fn trade_row_shows_return_in_percent() {
        let trade = Trade {
            id: 1,
            symbol: "BHP".into(),
            side: TradeSide::Long,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            entry_price: 45.0,
            exit_price: Some(47.0),
            quantity: 100.0,
            fees: 0.0,
            notes: "breakout".into(),
            created_at: chrono::Utc::now(),
        };
        let row = TradeRow::new(&trade);
        assert_eq!(row.return_pct, "4.44%");
        assert_eq!(row.pnl, "200.00");
        assert_eq!(row.notes, "breakout");
    }

    #[test]
    fn error_template_escapes_message() {
        let html = ErrorTemplate {
            message: "<script>",
            status: 400,
        }
        .render()
        .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("400"));
    }
}
