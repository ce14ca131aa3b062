//! Error type definitions.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the async worker pool.
    #[error("Worker pool initialization error: {0}")]
    WorkerPoolError(#[from] std::io::Error),
}

/// Errors surfaced by executing a request or reading its response.
///
/// None of these are retried internally; callers re-run `execute` to retry.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The endpoint (or a redirect target) is unparsable or uses an unsupported scheme.
    /// Raised before any network I/O for the hop in question.
    #[error("Malformed endpoint {url}: {reason}")]
    MalformedEndpoint {
        /// The offending URL text
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Connect/read timeout, connection reset and other transport failures.
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O failure while reading or decoding the response stream.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The redirect budget was exhausted.
    #[error("Server redirected too many times ({attempted})")]
    TooManyRedirects {
        /// Number of redirects attempted
        attempted: usize,
    },

    /// A redirect status arrived without a usable `Location` header.
    #[error("Illegal URL redirect: status {status} from {url} has no Location header")]
    IllegalRedirect {
        /// The redirect status received
        status: u16,
        /// The URL that answered with it
        url: String,
    },

    /// The response declared a charset this runtime does not know.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// The response body was requested in a state where it cannot be produced.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// An async submission lost its worker before reporting an outcome.
    #[error("Async dispatch failed: {0}")]
    Dispatch(String),
}

impl RequestError {
    /// Builds a `MalformedEndpoint` error.
    pub(crate) fn malformed(url: impl Into<String>, reason: impl ToString) -> Self {
        RequestError::MalformedEndpoint {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// True for transport-level failures (timeouts, resets, stream errors).
    pub fn is_network(&self) -> bool {
        matches!(self, RequestError::Network(_) | RequestError::Io(_))
    }

    /// True when the redirect chain itself was the problem.
    pub fn is_redirect_failure(&self) -> bool {
        matches!(
            self,
            RequestError::TooManyRedirects { .. } | RequestError::IllegalRedirect { .. }
        )
    }

    /// True when the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            RequestError::Network(e) => e.is_timeout(),
            RequestError::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}
