//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use notepad_core::error::{DomainError, RepoError};
use notepad_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
    Conflict(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized()
                .with_detail("Invalid credentials or missing authentication"),
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                // The detail stays in the logs, never in the response
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Blocked { until } => {
                AppError::Forbidden(format!("Account blocked until {}", until.to_rfc3339()))
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) | RepoError::Decode(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
