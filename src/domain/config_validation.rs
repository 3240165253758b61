//! Configuration validation.
//!
//! Resolves the settings the journal needs from a [`ConfigPort`] and rejects
//! invalid values before anything is opened or bound.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq)]
pub struct WebSettings {
    pub listen: SocketAddr,
    pub static_dir: PathBuf,
}

pub fn validate_web_config(config: &dyn ConfigPort) -> Result<WebSettings, JournalError> {
    let listen_str = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    let listen = listen_str
        .trim()
        .parse::<SocketAddr>()
        .map_err(|e| JournalError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: format!("{listen_str:?} is not a socket address: {e}"),
        })?;

    let static_dir = config
        .get_string("web", "static_dir")
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());

    Ok(WebSettings {
        listen,
        static_dir: PathBuf::from(static_dir),
    })
}

pub fn validate_database_config(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let path = config.require_string("database", "path")?;
    if path.trim().is_empty() {
        return Err(JournalError::ConfigInvalid {
            section: "database".into(),
            key: "path".into(),
            reason: "path must not be empty".into(),
        });
    }
    let pool_size = config.get_int("database", "pool_size", 4);
    if !(1..=64).contains(&pool_size) {
        return Err(JournalError::ConfigInvalid {
            section: "database".into(),
            key: "pool_size".into(),
            reason: format!("pool_size must be between 1 and 64, got {pool_size}"),
        });
    }
    Ok(())
}

/// Log filter from `[logging] level`; `RUST_LOG` still takes precedence
/// when the logger is built.
pub fn log_level(config: &dyn ConfigPort) -> Result<String, JournalError> {
    let level = config
        .get_string("logging", "level")
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
        .trim()
        .to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(JournalError::ConfigInvalid {
            section: "logging".into(),
            key: "level".into(),
            reason: format!("expected one of {}, got {level:?}", LOG_LEVELS.join(", ")),
        });
    }
    Ok(level)
}
