//! Error types for the Vultr provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving a resource or data source operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing or contradictory user input (e.g. no filter supplied).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider is not configured, or its configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A transport or API fault while listing or polling.
    #[error("Fetch error: {context}: {source}")]
    Fetch {
        /// What was being fetched.
        context: String,
        /// The underlying fault.
        #[source]
        source: Box<ProviderError>,
    },

    /// A lookup matched no record, or a remote object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A lookup matched more than one record.
    #[error(
        "Ambiguous result: your search returned {count} results, please refine your search to be more specific"
    )]
    AmbiguousResult {
        /// Number of records that matched.
        count: usize,
    },

    /// A record could not be decomposed into fields.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A poll observed a state that is neither pending nor the target.
    #[error("Unexpected state '{observed}', wanted target '{target}'")]
    UnexpectedState {
        /// The state reported by the remote system.
        observed: String,
        /// The state the poll was waiting for.
        target: String,
    },

    /// A poll exceeded its deadline.
    #[error("Timeout while waiting for state '{target}' (last observed '{last_observed}')")]
    Timeout {
        /// The state the poll was waiting for.
        target: String,
        /// The last state observed before giving up.
        last_observed: String,
    },

    /// A delete is blocked by an active attachment.
    #[error("Dependency conflict: {0}")]
    DependencyConflict(String),

    /// The Vultr API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The HTTP request could not be sent or its body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The calling context was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// A resource was created remotely but the operation did not complete.
    #[error("Resource {id} was created but did not become ready: {source}")]
    PartialCreate {
        /// The id assigned by the remote system.
        id: String,
        /// Why the create did not complete.
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Wrap a fault raised while fetching remote data.
    pub fn fetch(context: impl Into<String>, source: ProviderError) -> Self {
        match source {
            // Cancellation must stay recognisable to callers.
            ProviderError::Cancelled => ProviderError::Cancelled,
            source => Self::Fetch {
                context: context.into(),
                source: Box::new(source),
            },
        }
    }

    /// Whether the remote object is gone (HTTP 404 or a not-found lookup).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { status, .. } => *status == 404,
            Self::Fetch { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether a retry of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }

    /// The id of a partially created resource, if any.
    pub fn partial_id(&self) -> Option<&str> {
        match self {
            Self::PartialCreate { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Convert this error into an error diagnostic for the host.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self {
            Self::PartialCreate { id, .. } => diagnostic.with_detail(format!(
                "The remote object {id} exists; a later read will reconcile its state"
            )),
            Self::DependencyConflict(_) => diagnostic
                .with_detail("Detach the object from the instances using it and retry"),
            _ => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("no results were found".to_string());
        assert_eq!(format!("{}", err), "Not found: no results were found");

        let err = ProviderError::Validation("filter is required".to_string());
        assert_eq!(format!("{}", err), "Validation error: filter is required");

        let err = ProviderError::UnknownResource("vultr_nope".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: vultr_nope");
    }

    #[test]
    fn test_state_error_display() {
        let err = ProviderError::UnexpectedState {
            observed: "failed".to_string(),
            target: "complete".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Unexpected state 'failed', wanted target 'complete'"
        );

        let err = ProviderError::Timeout {
            target: "ready".to_string(),
            last_observed: "isomounted".to_string(),
        };
        assert!(format!("{}", err).contains("isomounted"));

        let err = ProviderError::AmbiguousResult { count: 2 };
        assert!(format!("{}", err).contains("returned 2 results"));
    }

    #[test]
    fn test_fetch_wraps_source() {
        let err = ProviderError::fetch(
            "error getting block storages",
            ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        );
        assert_eq!(
            format!("{}", err),
            "Fetch error: error getting block storages: API error (500): boom"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_fetch_keeps_cancellation() {
        let err = ProviderError::fetch("listing", ProviderError::Cancelled);
        assert!(matches!(err, ProviderError::Cancelled));
    }

    #[test]
    fn test_not_found_classification() {
        let api_404 = ProviderError::Api {
            status: 404,
            message: "Invalid iso".to_string(),
        };
        assert!(api_404.is_not_found());
        assert!(ProviderError::fetch("get", api_404).is_not_found());

        let api_400 = ProviderError::Api {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(!api_400.is_not_found());
    }

    #[test]
    fn test_retryable_classification() {
        let too_many = ProviderError::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(too_many.is_retryable());

        let unavailable = ProviderError::Api {
            status: 503,
            message: "down".to_string(),
        };
        assert!(unavailable.is_retryable());

        let bad_request = ProviderError::Api {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(!bad_request.is_retryable());
        assert!(!ProviderError::Cancelled.is_retryable());
    }

    #[test]
    fn test_partial_create_diagnostic() {
        let err = ProviderError::PartialCreate {
            id: "iso-123".to_string(),
            source: Box::new(ProviderError::Timeout {
                target: "complete".to_string(),
                last_observed: "pending".to_string(),
            }),
        };
        assert_eq!(err.partial_id(), Some("iso-123"));

        let diagnostic = err.to_diagnostic();
        assert!(diagnostic.summary.contains("iso-123"));
        assert!(diagnostic.detail.unwrap().contains("iso-123"));
    }
}
