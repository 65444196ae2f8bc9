// Error handling module for the Q&A API
// Provides the caller-facing error taxonomy and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::auth::AuthError;

/// Main error type for the API
/// Repositories, services and handlers all return Result<T, ApiError>
///
/// Each variant maps to a specific HTTP status code and error response format.
#[derive(Debug)]
pub enum ApiError {
    /// Bad input shape or content
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// No such record, or the record is soft-deleted
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Caller is not the owner of the record
    /// Maps to HTTP 403 Forbidden
    Unauthorized(String),

    /// Caller could not be authenticated
    /// Maps to HTTP 401 Unauthorized
    Unauthenticated(String),

    /// Uniqueness violation (duplicate handle/email, duplicate vote)
    /// Maps to HTTP 409 Conflict
    Conflict { code: &'static str, message: String },

    /// Business rule rejection of an action on one's own record
    /// Maps to HTTP 422 Unprocessable Entity
    SelfActionRejected(String),

    /// Database operation errors
    /// Maps to HTTP 500, details are only logged
    DatabaseError(sqlx::Error),

    /// Internal server errors
    /// Maps to HTTP 500, details are only logged
    InternalError(String),
}

/// Consistent error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "SELF_VOTE")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors, omitted when None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Build a single-field validation failure for checks the derive can't express
    pub fn invalid(field: &'static str, code: &'static str, message: &str) -> Self {
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.to_string().into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        ApiError::ValidationError(errors)
    }

    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, message, details) = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Request validation failed".to_string(),
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({}))),
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{} with id {} not found", resource, id),
                    None,
                )
            }
            ApiError::Unauthorized(message) => {
                warn!("Ownership check failed: {}", message);
                (StatusCode::FORBIDDEN, "UNAUTHORIZED", message.clone(), None)
            }
            ApiError::Unauthenticated(message) => {
                warn!("Unauthenticated request: {}", message);
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message.clone(), None)
            }
            ApiError::Conflict { code, message } => {
                warn!("Conflict error: {}", message);
                (StatusCode::CONFLICT, *code, message.clone(), None)
            }
            ApiError::SelfActionRejected(message) => {
                debug!("Self action rejected: {}", message);
                (StatusCode::UNPROCESSABLE_ENTITY, "SELF_VOTE", message.clone(), None)
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        (
            status,
            ErrorResponse {
                error_code: code.to_string(),
                message,
                details,
                timestamp: Utc::now().to_rfc3339(),
            },
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::SelfActionRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::ValidationError(errors) => write!(f, "validation failed: {}", errors),
            ApiError::NotFound { resource, id } => write!(f, "{} with id {} not found", resource, id),
            ApiError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            ApiError::Unauthenticated(msg) => write!(f, "unauthenticated: {}", msg),
            ApiError::Conflict { message, .. } => write!(f, "conflict: {}", message),
            ApiError::SelfActionRejected(msg) => write!(f, "rejected: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "database error: {}", e),
            ApiError::InternalError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::DatabaseError(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

/// Token and credential failures surface as authentication errors;
/// failures of the hashing or signing machinery are internal
impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::PasswordHashError(msg) | AuthError::TokenGenerationError(msg) => {
                ApiError::InternalError(msg)
            }
            other => ApiError::Unauthenticated(other.client_message().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_vote_and_duplicate_vote_stay_distinguishable() {
        let self_vote = ApiError::SelfActionRejected("cannot vote on own question".to_string());
        let duplicate = ApiError::Conflict {
            code: "ALREADY_VOTED",
            message: "already voted".to_string(),
        };

        assert_ne!(self_vote.status_code(), duplicate.status_code());
        let (_, a) = self_vote.to_error_response();
        let (_, b) = duplicate.to_error_response();
        assert_eq!(a.error_code, "SELF_VOTE");
        assert_eq!(b.error_code, "ALREADY_VOTED");
    }

    #[test]
    fn database_errors_are_opaque() {
        let err = ApiError::DatabaseError(sqlx::Error::RowNotFound);
        let (status, body) = err.to_error_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "A database error occurred");
    }

    #[test]
    fn invalid_carries_field_details() {
        let err = ApiError::invalid("title", "empty_payload", "nothing to update");
        let (status, body) = err.to_error_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let details = body.details.expect("details present");
        assert!(details.get("title").is_some());
    }

    #[test]
    fn credential_failures_render_identically() {
        let unknown: ApiError = AuthError::UnknownEmail.into();
        let wrong: ApiError = AuthError::WrongPassword.into();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
    }
}
