// Authentication error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::error::ApiError;

/// Authentication error types
///
/// `UnknownEmail` and `WrongPassword` are kept apart for logging only;
/// both render the same client message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("No active user with that email")]
    UnknownEmail,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
}

impl AuthError {
    /// Message that is safe to send to clients
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Missing authentication token",
            AuthError::InvalidToken => "Invalid token",
            AuthError::ExpiredToken => "Token has expired",
            AuthError::UnknownEmail | AuthError::WrongPassword => "Invalid email or password",
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                "Internal server error"
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::MissingToken => warn!("Missing token in request"),
            AuthError::InvalidToken => warn!("Invalid token attempt"),
            AuthError::ExpiredToken => warn!("Expired token attempt"),
            AuthError::UnknownEmail => debug!("Login attempt for unknown email"),
            AuthError::WrongPassword => warn!("Login attempt with wrong password"),
            AuthError::PasswordHashError(msg) => error!("Password hashing error: {}", msg),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
        }

        // Same body shape as every other error, timestamp included
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_status_matches_variant() {
        let errors = [
            AuthError::MissingToken,
            AuthError::ExpiredToken,
            AuthError::WrongPassword,
            AuthError::TokenGenerationError("bad key".to_string()),
        ];
        for err in errors {
            let expected = err.status_code();
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
