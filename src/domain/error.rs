//! Domain error types.

/// Top-level error type for tradejournal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JournalError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        JournalError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Process exit status used by the CLI.
    pub fn exit_status(&self) -> u8 {
        match self {
            JournalError::Io(_) => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. } => 3,
            JournalError::Validation { .. } | JournalError::Csv { .. } => 4,
            JournalError::NotFound { .. } => 5,
        }
    }

    /// True for failures of the storage layer itself, as opposed to bad input.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. }
        )
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        JournalError::DatabaseQuery {
            reason: err.to_string(),
        }
    }
}

impl From<r2d2::Error> for JournalError {
    fn from(err: r2d2::Error) -> Self {
        JournalError::Database {
            reason: err.to_string(),
        }
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        JournalError::Csv {
            reason: err.to_string(),
        }
    }
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
