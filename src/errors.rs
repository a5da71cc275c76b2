//! Error types for the harvesting and classification stages.
//!
//! Two families live here, matching how failures propagate:
//!
//! - [`FetchError`]: per-item network failures. These are *data*: the
//!   orchestrator folds them into the record's body text and keeps going.
//! - [`StageError`]: stage-level failures (missing model, missing input file,
//!   unwritable output). These abort the stage before any output is written.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A failed fetch of a single listing page or article.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("timed out after {after:?} fetching {url}")]
    Timeout { url: String, after: Duration },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Connection, DNS, TLS or redirect failure.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The response arrived but its body could not be read.
    #[error("failed reading body of {url}: {message}")]
    Body { url: String, message: String },

    /// The listing entry carried no article link.
    #[error("listing entry has no article link")]
    MissingLink,
}

impl FetchError {
    /// Short machine-friendly name of the failure kind, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Status { .. } => "status",
            FetchError::Transport { .. } => "transport",
            FetchError::Body { .. } => "body",
            FetchError::MissingLink => "missing_link",
        }
    }
}

/// A failure that aborts a whole stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// A required resource (NER model, rules file) is unusable.
    #[error("configuration error in {resource}: {message}")]
    Configuration { resource: String, message: String },

    /// The stage's input artifact does not exist.
    #[error("input file {} not found; run the `{producer}` stage first", path.display())]
    InputMissing { path: PathBuf, producer: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StageError {
    pub fn configuration(resource: impl Into<String>, message: impl ToString) -> Self {
        StageError::Configuration {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}
