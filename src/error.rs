//! Error types for Hetzner Cloud operations.
//!
//! Every failure the library can produce is surfaced as one [`Error`] variant.
//! Nothing is retried automatically; [`Error::is_retryable`] tells the caller
//! which conditions are worth retrying.

use thiserror::Error;

/// Main error type for Hetzner Cloud operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The client configuration failed validation
    #[error("Your Hetzner Cloud configuration is incorrect: {0}")]
    Configuration(String),

    /// A required argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single resource lookup returned 404
    #[error("{resource} {id} not found")]
    NotFound {
        /// Resource kind, e.g. "server"
        resource: &'static str,
        /// Identifier that was requested
        id: u64,
    },

    /// The API rejected the token (401/403)
    #[error("Authentication with the Hetzner Cloud API failed")]
    Authentication,

    /// The API rate limit was hit (429)
    #[error("Hetzner Cloud API rate limit exceeded")]
    RateLimitExceeded,

    /// The API reported a server-side failure (5xx)
    #[error("Hetzner Cloud API unavailable: {0}")]
    ProviderUnavailable(String),

    /// Unexpected status code or an embedded action error
    #[error("Action failed{}: {payload}", status_suffix(.status))]
    Action {
        /// HTTP status of the response, when there was one
        status: Option<u16>,
        /// Parsed response body or embedded error object
        payload: serde_json::Value,
    },

    /// The poller ran out of attempts before the target value appeared
    #[error("Wait attempts exceeded after {attempts} attempts")]
    WaitAttemptsExceeded {
        /// Number of fetches performed
        attempts: u32,
    },

    /// The poller was cancelled by its caller
    #[error("Wait cancelled")]
    Cancelled,

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed JSON or an unexpected payload shape
    #[error("Failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" with status {}", s))
        .unwrap_or_default()
}

/// Specialized result type for Hetzner Cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an [`Error::Action`] from a response status and body.
    pub(crate) fn action(status: Option<u16>, payload: serde_json::Value) -> Self {
        Self::Action { status, payload }
    }

    /// Shorthand for a missing or invalid argument.
    pub(crate) fn invalid_argument(what: impl Into<String>) -> Self {
        Self::InvalidArgument(what.into())
    }

    /// Returns true if the caller may reasonably retry the same call.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ProviderUnavailable(_))
    }
}
