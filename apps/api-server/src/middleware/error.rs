//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use scribe_shared::{ErrorResponse, FieldError};
use std::fmt;

use scribe_core::forms::FieldViolation;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Validation(Vec<FieldViolation>),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(violations) => {
                write!(f, "Validation failed on {} field(s)", violations.len())
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(violations) => ErrorResponse::validation_failed(
                violations
                    .iter()
                    .map(|v| FieldError {
                        field: v.field.clone(),
                        message: v.message.clone(),
                    })
                    .collect(),
            ),
            AppError::Internal(detail) => {
                // Log internal errors; the body stays sanitized.
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<scribe_core::error::DomainError> for AppError {
    fn from(err: scribe_core::error::DomainError) -> Self {
        match err {
            scribe_core::error::DomainError::NotFound { entity_type } => {
                AppError::NotFound(format!("{} not found", entity_type))
            }
            scribe_core::error::DomainError::Validation(violations) => {
                AppError::Validation(violations)
            }
            scribe_core::error::DomainError::Unauthorized => {
                AppError::BadRequest("Unauthorized".to_string())
            }
            scribe_core::error::DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<scribe_core::error::RepoError> for AppError {
    fn from(err: scribe_core::error::RepoError) -> Self {
        match err {
            scribe_core::error::RepoError::NotFound => {
                AppError::NotFound("Resource not found".to_string())
            }
            scribe_core::error::RepoError::Constraint(msg) => AppError::BadRequest(msg),
            scribe_core::error::RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            scribe_core::error::RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<scribe_core::ports::MediaError> for AppError {
    fn from(err: scribe_core::ports::MediaError) -> Self {
        match err {
            scribe_core::ports::MediaError::UnsupportedFormat(ct) => AppError::Validation(vec![
                FieldViolation::new("image", format!("Unsupported image type: {ct}")),
            ]),
            scribe_core::ports::MediaError::Io(msg) => {
                tracing::error!("Media storage error: {}", msg);
                AppError::Internal("Media storage error".to_string())
            }
        }
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Malformed multipart body: {err}"))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
