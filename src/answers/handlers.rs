// HTTP handlers for answer endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::answers::models::{Answer, AnswerRequest};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::AppState;

/// Answer a question
/// POST /api/v1/questions/{id}/answers
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/answers",
    params(("id" = i64, Path, description = "Question id")),
    request_body = AnswerRequest,
    responses(
        (status = 201, description = "Answer created", body = Answer),
        (status = 404, description = "No such live question")
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn create_answer_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<i64>,
    Json(request): Json<AnswerRequest>,
) -> Result<(StatusCode, Json<Answer>), ApiError> {
    state.users.ensure_active(user.user_id).await?;
    let answer = state.answers.create(question_id, user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

/// Update the caller's own answer
/// PUT /api/v1/answers/{id}
#[utoipa::path(
    put,
    path = "/api/v1/answers/{id}",
    params(("id" = i64, Path, description = "Answer id")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer updated", body = Answer),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such live answer")
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn update_answer_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(answer_id): Path<i64>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<Answer>, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    let answer = state.answers.update(answer_id, user.user_id, request).await?;
    Ok(Json(answer))
}

/// Soft-delete the caller's own answer
/// DELETE /api/v1/answers/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/answers/{id}",
    params(("id" = i64, Path, description = "Answer id")),
    responses(
        (status = 204, description = "Answer deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such live answer")
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn delete_answer_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(answer_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    state.answers.soft_delete(answer_id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
