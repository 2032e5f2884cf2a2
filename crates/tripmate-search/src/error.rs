//! Error types for provider searches.

use std::time::Duration;

/// Errors from a provider search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search API key is not configured")]
    MissingApiKey,
    #[error("missing search parameter: {0}")]
    MissingParam(&'static str),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider payload: {0}")]
    Payload(String),
    #[error("provider reported an error: {0}")]
    Api(String),
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Payload(err.to_string())
        } else {
            SearchError::Http(err.to_string())
        }
    }
}
