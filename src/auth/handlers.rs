// HTTP handlers for authentication endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::models::AuthResponse;
use crate::error::ApiError;
use crate::users::models::{LoginRequest, RegisterRequest};
use crate::AppState;

/// Issue a token for the user and attach it both to the body and a cookie
fn token_response(state: &AppState, status: StatusCode, user_id: i64) -> Result<Response, ApiError> {
    let token = state.tokens.issue(user_id)?;
    let cookie = state.cookie.build_set_cookie(&token);
    let body = AuthResponse::bearer(user_id, token, state.tokens.access_token_duration());

    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Register a new user
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid registration"),
        (status = 409, description = "Email or handle already taken")
    ),
    tag = "users"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let user_id = state.users.register(request).await?;
    token_response(&state, StatusCode::CREATED, user_id)
}

/// Login a user
/// POST /api/v1/users/login
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "users"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user_id = state.users.authenticate(&request).await?;
    token_response(&state, StatusCode::OK, user_id)
}
