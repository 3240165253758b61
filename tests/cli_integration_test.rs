//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading and validation from INI files on disk
//! - Schema creation against a file-backed database
//! - CSV import/export through the subcommands
//! - Exit codes for failing commands

mod common;

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use tradejournal::cli::{self, Cli};
use tradejournal::domain::error::JournalError;
use tradejournal::ports::rule_port::RulePort;
use tradejournal::ports::trade_port::TradePort;

use common::*;

fn journal_ini(db_path: &Path) -> String {
    format!(
        "[database]\npath = {}\npool_size = 2\n\n[web]\nlisten = 127.0.0.1:0\n\n[logging]\nlevel = warn\n",
        db_path.display()
    )
}

fn run_args(args: &[&str]) -> ExitCode {
    let mut argv = vec!["tradejournal"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

const TRADES_CSV: &str = "symbol,side,entry_date,exit_date,entry_price,exit_price,quantity,fees,notes
BHP,long,2024-01-02,2024-01-05,45.0,47.5,100,9.95,breakout
RIO,sideways,2024-01-03,,120,,10,,
CBA,short,2024-02-01,,110,,50,,still open
";

mod config_loading {
    use super::*;

    #[test]
    fn loads_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_file(&journal_ini(&dir.path().join("j.db")));
        let config = cli::load_config(ini.path()).unwrap();
        let store = cli::open_store(&config).unwrap();
        assert!(store.list_rules().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        match cli::load_config(Path::new("/nonexistent/journal.ini")) {
            Err(JournalError::ConfigParse { .. }) => {}
            other => panic!("expected ConfigParse, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let ini = write_temp_file("[database]\npath = j.db\n\n[logging]\nlevel = chatty\n");
        assert!(matches!(
            cli::load_config(ini.path()),
            Err(JournalError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn missing_database_path_fails_open() {
        let ini = write_temp_file("[logging]\nlevel = warn\n");
        let config = cli::load_config(ini.path()).unwrap();
        assert!(matches!(
            cli::open_store(&config),
            Err(JournalError::ConfigMissing { .. })
        ));
    }
}

mod commands {
    use super::*;

    #[test]
    fn init_db_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("journal.db");
        let ini = write_temp_file(&journal_ini(&db));

        let code = run_args(&["init-db", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
        assert!(db.exists());
    }

    #[test]
    fn import_skips_bad_lines_and_export_writes_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("journal.db");
        let ini = write_temp_file(&journal_ini(&db));
        let csv_in = write_temp_file(TRADES_CSV);
        let csv_out = dir.path().join("out.csv");
        let config = ini.path().to_str().unwrap();

        let code = run_args(&[
            "import-trades",
            "-c",
            config,
            "--file",
            csv_in.path().to_str().unwrap(),
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));

        let store = cli::open_store(&cli::load_config(ini.path()).unwrap()).unwrap();
        let trades = store.list_trades().unwrap();
        assert_eq!(trades.len(), 2);
        drop(store);

        let code = run_args(&[
            "export-trades",
            "-c",
            config,
            "--file",
            csv_out.to_str().unwrap(),
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));

        let written = std::fs::read_to_string(&csv_out).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("BHP,long,2024-01-02,2024-01-05"));
        assert!(lines[2].starts_with("CBA,short,2024-02-01,,"));
    }

    #[test]
    fn rule_stats_for_missing_rule_exits_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_file(&journal_ini(&dir.path().join("journal.db")));
        let code = run_args(&[
            "rule-stats",
            "-c",
            ini.path().to_str().unwrap(),
            "--rule",
            "3",
        ]);
        let expected = JournalError::NotFound { entity: "rule", id: 3 };
        assert!(same_code(code, ExitCode::from(&expected)));

        let code = run_args(&[
            "rule-stats",
            "-c",
            ini.path().to_str().unwrap(),
            "--rule",
            "3",
            "--json",
        ]);
        assert!(same_code(code, ExitCode::from(&expected)));
    }

    #[test]
    fn trend_with_inverted_range_exits_validation() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_file(&journal_ini(&dir.path().join("journal.db")));
        let code = run_args(&[
            "trend",
            "-c",
            ini.path().to_str().unwrap(),
            "--from",
            "2024-05-10",
            "--to",
            "2024-05-01",
        ]);
        let expected = JournalError::validation("from", "must not be after to");
        assert!(same_code(code, ExitCode::from(&expected)));
    }

    #[test]
    fn import_missing_file_exits_io() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_file(&journal_ini(&dir.path().join("journal.db")));
        let code = run_args(&[
            "import-trades",
            "-c",
            ini.path().to_str().unwrap(),
            "--file",
            dir.path().join("missing.csv").to_str().unwrap(),
        ]);
        assert!(same_code(code, ExitCode::from(1)));
    }
}
