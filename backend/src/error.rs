//! Run-level error types.
//!
//! Only configuration problems (before any send) and report persistence
//! problems (after every send) abort a run. Per-row send outcomes are data,
//! carried in `DispatchResult`, and never become a `DispatchError`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("mapping is missing required fields: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("mapping refers to columns absent from the data source: {}", columns.join(", "))]
    UnknownColumns { columns: Vec<String> },

    #[error("preview failed: {0}")]
    Preview(String),

    #[error("report failed: {0}")]
    Report(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error(transparent)]
    Collect(#[from] crate::services::dispatch::collector::CollectError),

    #[error(transparent)]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DispatchError {
    /// True for errors raised by the validation gate, before any send.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DispatchError::Configuration { .. } | DispatchError::UnknownColumns { .. }
        )
    }
}

/// Why a single send produced no usable API answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SendError::MalformedResponse(err.to_string())
        } else {
            SendError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("media upload rejected with HTTP {0}")]
    Rejected(u16),

    #[error("media upload response has no image URL")]
    MissingUrl,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
