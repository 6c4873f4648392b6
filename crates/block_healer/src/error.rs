use reqwest::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Failures fetching one record from the remote source.
///
/// All variants are recoverable: callers log them, back off and carry on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connect(String),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload has no height at {pointer}")]
    MissingHeight { pointer: String },
    #[error("payload height {value} at {pointer} is not a non-negative integer")]
    InvalidHeight { pointer: String, value: String },
    #[error("client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Network-level failures that are expected to clear up on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Client(e.to_string())
        }
    }
}

/// Process setup failures; these are the only errors surfaced as a non-zero exit.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("only http:// and https:// URLs are supported: {0}")]
    NonHttpUrl(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
