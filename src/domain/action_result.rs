//! The `{success, data | error}` result shape returned to callers.

use serde::Serialize;

use super::error::JournalError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> ActionResult<T> {
    /// Storage failures are reported with a generic message; the detail is
    /// logged, not returned.
    pub fn from_error(err: &JournalError) -> Self {
        if err.is_storage() {
            log::error!("storage failure: {err}");
            Self::failure("Something went wrong while accessing the journal")
        } else {
            Self::failure(err.to_string())
        }
    }
}

impl<T> From<Result<T, JournalError>> for ActionResult<T> {
    fn from(result: Result<T, JournalError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::from_error(&err),
        }
    }
}
