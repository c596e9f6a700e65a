//! Error types for catalog operations.
//!
//! Errors are categorized so callers can tell a throttled or unavailable
//! catalog apart from a request the catalog will never accept. This crate
//! never retries on its own; the category is information for whoever
//! decides to run the operation again.

use crate::types::{BatchOperation, FailedAssociation};
use std::fmt;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of catalog errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network failure or 5xx response (transient).
    Network,
    /// The catalog throttled the request (transient).
    Throttled,
    /// A referenced action, product or artifact does not exist.
    NotFound,
    /// Missing or rejected credentials.
    Auth,
    /// The catalog rejected the request as invalid.
    Rejected,
    /// The response could not be understood.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Throttled)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Catalog unreachable",
            Self::Throttled => "Catalog throttled the request",
            Self::NotFound => "Catalog resource not found",
            Self::Auth => "Catalog credentials missing or rejected",
            Self::Rejected => "Catalog rejected the request",
            Self::Format => "Unexpected catalog response",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The catalog answered with a typed API error.
    #[error("{operation} failed with {code} (HTTP {status}): {message}")]
    Api {
        /// Operation being called.
        operation: String,
        /// Exception name, e.g. `ResourceNotFoundException`.
        code: String,
        /// Message from the catalog.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The catalog accepted the batch but refused some tuples.
    #[error("batch {operation} refused {} of {total} associations: {}", .failed.len(), summarize(.failed))]
    BatchRejected {
        /// Which bulk operation.
        operation: BatchOperation,
        /// Number of tuples sent.
        total: usize,
        /// Tuples the catalog refused.
        failed: Vec<FailedAssociation>,
    },

    /// The batch exceeds the catalog's per-request limit and was not sent.
    #[error("batch {operation} of {count} associations exceeds the limit of {limit} per request")]
    BatchTooLarge {
        /// Which bulk operation.
        operation: BatchOperation,
        /// Number of tuples in the batch.
        count: usize,
        /// Per-request limit.
        limit: usize,
    },

    /// Credentials or region are not configured.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid response from the catalog.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

fn summarize(failed: &[FailedAssociation]) -> String {
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { status, .. } => match status {
                Some(403) => ErrorCategory::Auth,
                Some(code) if *code < 500 => ErrorCategory::Rejected,
                _ => ErrorCategory::Network,
            },
            Error::Api { code, status, .. } => {
                if code.contains("Throttling") || *status == 429 {
                    ErrorCategory::Throttled
                } else if code.contains("ResourceNotFound") {
                    ErrorCategory::NotFound
                } else if code.contains("AccessDenied")
                    || code.contains("UnrecognizedClient")
                    || code.contains("InvalidSignature")
                    || code.contains("ExpiredToken")
                {
                    ErrorCategory::Auth
                } else if *status >= 500 {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Rejected
                }
            }
            Error::BatchRejected { failed, .. } => {
                if failed.iter().all(|f| f.error_code == "THROTTLING") {
                    ErrorCategory::Throttled
                } else if failed.iter().all(|f| f.error_code == "RESOURCE_NOT_FOUND") {
                    ErrorCategory::NotFound
                } else {
                    ErrorCategory::Rejected
                }
            }
            Error::BatchTooLarge { .. } => ErrorCategory::Rejected,
            Error::MissingCredentials(_) => ErrorCategory::Auth,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
