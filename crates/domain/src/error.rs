//! Domain error types.
//!
//! `CoreError` is what every service operation returns. Collaborator
//! failures arrive as `StoreError` or `IdentityError` and are mapped into
//! it explicitly at the call site or through the `From` impls below.

use thiserror::Error;
use uuid::Uuid;

/// Error returned by every core operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    /// A compensating action failed and left an identity without a profile.
    #[error("{original}; rollback failed: {rollback} (orphaned identity {orphaned_identity})")]
    RollbackFailure {
        original: String,
        rollback: String,
        orphaned_identity: Uuid,
    },
}

impl CoreError {
    /// Machine-readable tag used in API responses and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::Authentication(_) => "authentication",
            CoreError::Authorization(_) => "authorization",
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::Upstream(_) => "upstream",
            CoreError::RollbackFailure { .. } => "rollback_failure",
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .next()
            .unwrap_or_else(|| "Validation failed".to_string());
        CoreError::Validation(message)
    }
}

impl From<validator::ValidationError> for CoreError {
    fn from(error: validator::ValidationError) -> Self {
        CoreError::Validation(
            error
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string()),
        )
    }
}

/// Failure reported by a relational store implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("referenced row not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store query failed: {0}")]
    Query(String),
}

impl From<StoreError> for CoreError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(_) => {
                CoreError::Conflict("A conflicting record already exists".to_string())
            }
            StoreError::NotFound(what) => CoreError::NotFound(what),
            StoreError::Unavailable(_) | StoreError::Query(_) => {
                tracing::error!(error = %error, "Store operation failed");
                CoreError::Upstream("Storage is temporarily unavailable".to_string())
            }
        }
    }
}

/// Failure reported by the external identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity already exists")]
    AlreadyExists,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("identity provider timed out: {0}")]
    Timeout(String),

    #[error("identity provider error: {0}")]
    Upstream(String),
}

impl From<IdentityError> for CoreError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::AlreadyExists => {
                CoreError::Conflict("An account with this email already exists".to_string())
            }
            IdentityError::InvalidCredential => {
                CoreError::Authentication("Invalid or expired access token".to_string())
            }
            IdentityError::Timeout(_) | IdentityError::Upstream(_) => {
                tracing::error!(error = %error, "Identity provider call failed");
                CoreError::Upstream("Identity provider is unavailable".to_string())
            }
        }
    }
}
