//! Error taxonomy for the aggregation pipeline.
//!
//! Only [`OrchestrationError`] aborts a request. Fetch and parse failures are
//! recovered per source and show up as `null` in the result map.

use thiserror::Error;

/// A live fetch failed and no cached copy was available to fall back to.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("reading response body from {url} failed")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Used by in-memory transports (tests, fixtures).
    #[error("{url} unavailable: {reason}")]
    Unavailable { url: String, reason: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Body { url, .. }
            | Self::Unavailable { url, .. } => url,
        }
    }
}

/// A source body that could not be turned into a JSON value.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("source {source_name} returned an empty body")]
    Empty { source_name: String },

    #[error("source {source_name} returned invalid JSON")]
    Invalid {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the fan-out itself (not of any single source).
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("fetch task for source {source_name} could not be joined")]
    Join {
        source_name: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("signing key must be at least {min} bytes, got {len}")]
    WeakKey { min: usize, len: usize },

    #[error("token expiry of {minutes} minutes is out of range")]
    ExpiryOutOfRange { minutes: i64 },

    #[error("token signing failed")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
