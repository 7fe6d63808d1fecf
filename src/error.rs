//! Caller-facing error taxonomy.
//!
//! Every lifecycle operation resolves to exactly one of these outcomes. The
//! seam-specific errors (engine, catalog, variable bag, template) convert into
//! this taxonomy so that transport detail never leaks to a caller.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::domain::TaskId;
use crate::engine::EngineError;
use crate::template::TemplateError;
use crate::vars::VarError;

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, AlertError>;

#[derive(Debug, Error)]
pub enum AlertError {
    /// The task is absent from the catalog (or the engine).
    #[error("task not found")]
    NotFound,

    /// A task with this identity already exists.
    #[error("task {0} already exists")]
    Conflict(TaskId),

    /// The rule engine refused the request; the message is the engine's own.
    #[error("{0}")]
    UpstreamRejected(String),

    /// Catalog or engine transport failure. The detail is for logs only.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed input payload.
    #[error("invalid request: {0}")]
    ValidationFailed(String),

    /// Deployment fault: a script template that does not parse or render.
    #[error("configuration fault: {0}")]
    Configuration(String),
}

impl AlertError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    /// Message safe to return to a caller.
    ///
    /// Store and configuration faults are reduced to an opaque message.
    pub fn public_message(&self) -> String {
        match self {
            Self::StoreUnavailable(_) | Self::Configuration(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<EngineError> for AlertError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(_) => Self::NotFound,
            EngineError::Rejected { message, .. } => Self::UpstreamRejected(message),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<CatalogError> for AlertError {
    fn from(err: CatalogError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<VarError> for AlertError {
    fn from(err: VarError) -> Self {
        Self::ValidationFailed(err.to_string())
    }
}

impl From<TemplateError> for AlertError {
    fn from(err: TemplateError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rejection_is_surfaced_verbatim() {
        let err: AlertError = EngineError::Rejected {
            status: 400,
            message: "invalid TICKscript".to_string(),
        }
        .into();
        assert!(matches!(err, AlertError::UpstreamRejected(ref m) if m == "invalid TICKscript"));
        assert_eq!(err.public_message(), "invalid TICKscript");
    }

    #[test]
    fn test_store_failures_are_opaque() {
        let err: AlertError = CatalogError::Unavailable("connection refused".to_string()).into();
        assert!(matches!(err, AlertError::StoreUnavailable(_)));
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_engine_not_found_maps_to_not_found() {
        let err: AlertError = EngineError::NotFound("svc-5xx".to_string()).into();
        assert!(matches!(err, AlertError::NotFound));
    }
}
