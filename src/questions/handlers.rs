// HTTP handlers for question endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::questions::models::{
    CreateQuestionRequest, Polarity, Question, QuestionView, UpdateQuestionRequest, VoteTally,
};
use crate::AppState;

/// Ask a question
/// POST /api/v1/questions
#[utoipa::path(
    post,
    path = "/api/v1/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Invalid question"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn create_question_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    state.users.ensure_active(user.user_id).await?;
    let question = state.questions.create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// View a question with its answers, tags and votes
/// GET /api/v1/questions/{id}
#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question found", body = QuestionView),
        (status = 404, description = "No such live question")
    ),
    tag = "questions"
)]
pub async fn get_question_handler(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<Json<QuestionView>, ApiError> {
    let view = state.questions.get(question_id).await?;
    Ok(Json(view))
}

/// Update the caller's own question
/// PUT /api/v1/questions/{id}
#[utoipa::path(
    put,
    path = "/api/v1/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such live question")
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn update_question_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<i64>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    let question = state
        .questions
        .update_authored(question_id, user.user_id, request)
        .await?;
    Ok(Json(question))
}

/// Soft-delete the caller's own question
/// DELETE /api/v1/questions/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such live question")
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn delete_question_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    state.questions.soft_delete(question_id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vote(
    state: AppState,
    user: AuthenticatedUser,
    question_id: i64,
    polarity: Polarity,
) -> Result<Json<VoteTally>, ApiError> {
    state.users.ensure_active(user.user_id).await?;
    let tally = state.questions.vote(question_id, user.user_id, polarity).await?;
    Ok(Json(tally))
}

/// Upvote a question
/// POST /api/v1/questions/{id}/upvote
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/upvote",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Vote recorded", body = VoteTally),
        (status = 404, description = "No such live question"),
        (status = 409, description = "Already voted"),
        (status = 422, description = "Own question")
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn upvote_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<i64>,
) -> Result<Json<VoteTally>, ApiError> {
    vote(state, user, question_id, Polarity::Up).await
}

/// Downvote a question
/// POST /api/v1/questions/{id}/downvote
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/downvote",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Vote recorded", body = VoteTally),
        (status = 404, description = "No such live question"),
        (status = 409, description = "Already voted"),
        (status = 422, description = "Own question")
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn downvote_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<i64>,
) -> Result<Json<VoteTally>, ApiError> {
    vote(state, user, question_id, Polarity::Down).await
}
