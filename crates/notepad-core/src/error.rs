//! Domain-level error types.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::FingeringError;
use crate::ports::AuthError;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account blocked until {until}")]
    Blocked { until: DateTime<Utc> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FingeringError> for DomainError {
    fn from(err: FingeringError) -> Self {
        DomainError::Validation(err.to_string())
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                DomainError::Unauthorized
            }
            AuthError::HashingError(msg) => DomainError::Internal(msg),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Stored row could not be decoded: {0}")]
    Decode(String),
}
