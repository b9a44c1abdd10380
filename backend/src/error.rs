//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.

use crate::auth::AuthError;
use crate::services::TaskError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tasktrack_shared::types::{ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::{error, warn};
use validator::{ValidationErrors, ValidationErrorsKind};

/// Response message for rejected credentials or access tokens
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or missing credentials";
/// Response message for any refused refresh/logout token
pub const INVALID_REFRESH_MESSAGE: &str = "Invalid or expired refresh token";
/// Response message for a failed login
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid login or password";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: None,
            },
        });

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        // The specific cause stays in the logs only.
        if err.is_authentication_failure() {
            warn!(cause = %err, "Authentication failed");
        }

        match err {
            AuthError::DuplicateLogin | AuthError::DuplicateEmail => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized(INVALID_LOGIN_MESSAGE.to_string())
            }
            AuthError::InvalidOrExpiredRefreshToken
            | AuthError::RefreshTokenExpired
            | AuthError::RotationFailed(_) => {
                ApiError::Unauthorized(INVALID_REFRESH_MESSAGE.to_string())
            }
            AuthError::Unauthenticated => {
                ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string())
            }
            AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            other @ (AuthError::Password(_)
            | AuthError::Signing(_)
            | AuthError::Entropy(_)
            | AuthError::Storage(_)) => ApiError::Internal(other.into()),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound | TaskError::DependencyNotFound => {
                ApiError::NotFound(err.to_string())
            }
            TaskError::AssigneeNotFound | TaskError::SelfDependency => {
                ApiError::Validation(err.to_string())
            }
            TaskError::DependencyCycle | TaskError::DuplicateDependency => {
                ApiError::Conflict(err.to_string())
            }
            TaskError::Storage(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .errors()
            .iter()
            .flat_map(|(field, kind)| match kind {
                ValidationErrorsKind::Field(field_errors) => field_errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("{} is invalid", field),
                    })
                    .collect(),
                _ => vec![format!("{} is invalid", field)],
            })
            .collect();
        // HashMap iteration order is unstable
        messages.sort();

        ApiError::Validation(messages.join("; "))
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
