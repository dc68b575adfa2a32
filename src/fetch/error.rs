//! Error types for HTTP operations.

use thiserror::Error;

/// Error type for a single HTTP exchange at the transport level.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built (malformed URL, header or body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure of one attempt, as seen by the retry classifier.
///
/// The status is captured from the response that failed, so the value
/// reported on exhaustion is always the last observed status.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The server answered with a non-2xx status.
    #[error("HTTP status {status}")]
    Status {
        /// Status code of the failing response
        status: http::StatusCode,
        /// Response body, if it was valid UTF-8
        body: Option<String>,
    },
}

/// Error returned by [`RequestExecutor::execute`](super::RequestExecutor::execute).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed at the transport level.
    #[error("Connection failed after {attempts} attempts: {source}")]
    ConnectionExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Transport error of the last attempt
        #[source]
        source: HttpError,
    },

    /// The server answered 404. Never retried.
    #[error("Resource not found: {url}")]
    NotFound {
        /// URL that was requested
        url: String,
    },

    /// Every attempt failed, the last one with a non-404 error status.
    #[error("HTTP status {status} after {attempts} attempts")]
    HttpExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Status of the last failing response
        status: http::StatusCode,
    },

    /// A 2xx body was not UTF-8 or not valid JSON.
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// The request could not be built. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Returns the HTTP status associated with this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::NotFound { .. } => Some(http::StatusCode::NOT_FOUND),
            Self::HttpExhausted { status, .. } => Some(*status),
            _ => None,
        }
    }
}
