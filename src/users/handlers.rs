// HTTP handlers for user endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::users::models::UserProfile;
use crate::AppState;

/// Get the caller's own profile
/// GET /api/v1/users/me
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Own profile", body = UserProfile),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    let profile = state.users.profile(user.user_id).await?;
    Ok(Json(profile))
}

/// Get a user's public profile
/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = UserProfile),
        (status = 404, description = "No such live user")
    ),
    tag = "users"
)]
pub async fn profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.users.profile(user_id).await?;
    Ok(Json(profile))
}

/// Soft-delete the caller's account and clear the token cookie
/// DELETE /api/v1/users/me
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    state.users.soft_delete(user.user_id).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.cookie.build_delete_cookie())],
    )
        .into_response())
}
