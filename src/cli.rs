//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{export_trades, import_trades};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::action_result::ActionResult;
use crate::domain::analytics::RulePerformance;
use crate::domain::config_validation::{log_level, validate_database_config};
use crate::domain::dates::{format_date, parse_date};
use crate::domain::error::JournalError;
use crate::domain::trend_calendar::{DayTrend, replay};
use crate::ports::performance_port::PerformancePort;
use crate::ports::rule_port::RulePort;
use crate::ports::trade_port::TradePort;
use crate::ports::trend_port::TrendPort;

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Personal trading journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the database schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print performance statistics for one rule
    RuleStats {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        rule: i64,
        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the market trend for each day in a date range
    Trend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Import trades from a CSV file
    ImportTrades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Export all trades to a CSV file
    ExportTrades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::InitDb { config } => run_init_db(&config),
        Command::RuleStats { config, rule, json } => run_rule_stats(&config, rule, json),
        Command::Trend { config, from, to } => run_trend(&config, &from, &to),
        Command::ImportTrades { config, file } => run_import(&config, &file),
        Command::ExportTrades { config, file } => run_export(&config, &file),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads the config file and starts logging at its `[logging] level`.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, JournalError> {
    let config = FileConfigAdapter::from_file(path)?;
    init_logging(&log_level(&config)?);
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// `RUST_LOG` overrides the configured level. Later calls are no-ops.
fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .try_init();
}

/// Opens the store named by the config and makes sure the schema exists.
pub fn open_store(config: &FileConfigAdapter) -> Result<SqliteAdapter, JournalError> {
    validate_database_config(config)?;
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

fn run_init_db(config_path: &Path) -> Result<(), JournalError> {
    let config = load_config(config_path)?;
    open_store(&config)?;
    println!("Database ready");
    Ok(())
}

fn run_rule_stats(config_path: &Path, rule_id: i64, json: bool) -> Result<(), JournalError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    if json {
        // the envelope is printed either way; failures still set the exit code
        let (result, outcome) = match store.entries_for_rule(rule_id) {
            Ok(entries) => (ActionResult::ok(RulePerformance::compute(&entries)), Ok(())),
            Err(err) => (ActionResult::from_error(&err), Err(err)),
        };
        let text = serde_json::to_string_pretty(&result).map_err(io::Error::other)?;
        println!("{text}");
        return outcome;
    }

    let rule = store.get_rule(rule_id)?;
    let perf = RulePerformance::compute(&store.entries_for_rule(rule_id)?);
    print!("{}", format_rule_stats(&rule.name, &perf));
    Ok(())
}

pub fn format_rule_stats(name: &str, perf: &RulePerformance) -> String {
    let mut out = format!("{name}\n");
    out.push_str(&format!(
        "  entries: {} ({} followed, {} broken, {} n/a)\n",
        perf.total, perf.success_count, perf.failure_count, perf.not_applicable_count
    ));
    out.push_str(&format!("  success rate: {}%\n", perf.success_rate));
    out.push_str(&format!("  trend: {}\n", perf.trend.label()));
    if let Some(status) = perf.streak.status {
        out.push_str(&format!(
            "  current streak: {} x {}\n",
            perf.streak.length,
            status.label()
        ));
    }
    for day in perf.weekdays.iter().filter(|d| d.evaluated() > 0) {
        out.push_str(&format!(
            "  {:<9} {:>3}% ({}/{})\n",
            day.day,
            day.rate,
            day.success_count,
            day.evaluated()
        ));
    }
    for month in &perf.months {
        out.push_str(&format!("  {:<9} {:>3}%\n", month.label, month.rate));
    }
    out
}

fn run_trend(config_path: &Path, from: &str, to: &str) -> Result<(), JournalError> {
    let from = parse_date("from", from)?;
    let to = parse_date("to", to)?;
    if from > to {
        return Err(JournalError::validation("from", "must not be after to"));
    }
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let days = replay(&store.events_until(to)?, from, to);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for day in &days {
        writeln!(out, "{}", format_trend_day(day))?;
    }
    Ok(())
}

pub fn format_trend_day(day: &DayTrend) -> String {
    let mut line = format!("{} {}", format_date(day.date), day.trend.as_str());
    if day.transitions.len() > 1 {
        let path: Vec<&str> = day.transitions.iter().map(|t| t.as_str()).collect();
        line.push_str(&format!(" ({})", path.join(" -> ")));
    }
    if !day.events.is_empty() {
        line.push_str(&format!(" [{} event(s)]", day.events.len()));
    }
    line
}

fn run_import(config_path: &Path, file: &Path) -> Result<(), JournalError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let reader = BufReader::new(File::open(file)?);
    let report = import_trades(&store, reader)?;
    println!("Imported {} trades", report.imported);
    for err in &report.errors {
        eprintln!("  line {}: {}", err.line, err.message);
    }
    Ok(())
}

fn run_export(config_path: &Path, file: &Path) -> Result<(), JournalError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let mut trades = store.list_trades()?;
    // oldest first in the file
    trades.reverse();
    let count = export_trades(&trades, BufWriter::new(File::create(file)?))?;
    log::info!("exported {count} trades to {}", file.display());
    println!("Exported {count} trades to {}", file.display());
    Ok(())
}

#[cfg(feature = "web")]
fn run_serve(config_path: &Path) -> Result<(), JournalError> {
    use crate::adapters::web::{AppState, build_router};
    use crate::domain::config_validation::validate_web_config;
    use std::sync::Arc;

    let config = load_config(config_path)?;
    let web = validate_web_config(&config)?;
    let store = open_store(&config)?;

    let router = build_router(AppState::new(Arc::new(store)), &web.static_dir);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(web.listen).await?;
        log::info!("listening on http://{}", web.listen);
        axum::serve(listener, router).await
    })?;
    Ok(())
}

#[cfg(not(feature = "web"))]
fn run_serve(_config_path: &Path) -> Result<(), JournalError> {
    Err(JournalError::validation(
        "command",
        "serve requires the web feature",
    ))
}
