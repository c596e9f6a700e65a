//! Error types for reconciliation.
//!
//! Two kinds matter to the caller: input errors, which will fail again no
//! matter how often the event is replayed, and upstream errors from the
//! catalog, passed through unmodified.

use crate::lifecycle::{LifecycleState, RequestKind};
use std::fmt;

/// Result type alias for reconciliation.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The event itself is malformed or violates a property constraint.
    Input,
    /// A catalog call failed.
    Upstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input error"),
            Self::Upstream => f.write_str("upstream error"),
        }
    }
}

/// Errors raised while handling a lifecycle event.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event JSON could not be decoded.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// `RequestType` is not Create, Update or Delete.
    #[error("unsupported request type: {0}")]
    UnsupportedRequestType(String),

    /// A required property is absent or empty.
    #[error("missing required property: {0}")]
    MissingProperty(String),

    /// A property is present but unusable.
    #[error("invalid property {name}: {reason}")]
    InvalidProperty {
        /// Property path, e.g. `ResourceProperties.ProductId`.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The lifecycle table has no transition for this event from a
    /// caller-tracked state.
    #[error("no {kind} transition from state {from}")]
    InvalidTransition {
        /// State the resource was in.
        from: LifecycleState,
        /// Event received.
        kind: RequestKind,
    },

    /// A catalog call failed.
    #[error("catalog call failed: {0}")]
    Upstream(#[from] catalog::Error),
}

impl Error {
    /// Create an invalid-property error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Upstream(_) => ErrorKind::Upstream,
            _ => ErrorKind::Input,
        }
    }

    /// Whether replaying the same event might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Upstream(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEvent(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_not_retryable() {
        let err = Error::MissingProperty("ResourceProperties.ProductId".to_string());
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "missing required property: ResourceProperties.ProductId"
        );
    }

    #[test]
    fn test_upstream_error_passthrough() {
        let upstream = catalog::Error::http("connection reset", None);
        let err: Error = upstream.into();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_invalid_property_display() {
        let err = Error::invalid("ResourceProperties.ProvisioningArtifactIds", "too many");
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(
            err.to_string(),
            "invalid property ResourceProperties.ProvisioningArtifactIds: too many"
        );
    }

    #[test]
    fn test_error_from_serde() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::MalformedEvent(_)));
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
