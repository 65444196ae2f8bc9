// Storage for answers

use async_trait::async_trait;
use sqlx::PgPool;

use crate::answers::models::Answer;
use crate::db::{constraint_violation, ConstraintViolation};
use crate::error::ApiError;
use crate::ownership::RecordStatus;

/// Storage operations for answers
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Insert an answer; `None` when the question is absent or soft-deleted
    async fn insert(&self, question_id: i64, author_id: i64, text: &str) -> Result<Option<Answer>, ApiError>;

    /// Author and deletion state, including soft-deleted answers
    async fn status(&self, answer_id: i64) -> Result<Option<RecordStatus>, ApiError>;

    /// Replace the text of a live answer written by `author_id`
    async fn update_authored(&self, answer_id: i64, author_id: i64, text: &str) -> Result<Option<Answer>, ApiError>;

    /// Soft-delete a live answer written by `author_id`
    async fn soft_delete_authored(&self, answer_id: i64, author_id: i64) -> Result<bool, ApiError>;
}

const ANSWER_COLUMNS: &str = "id, question_id, author_id, text, created_at, updated_at";

/// PostgreSQL answer repository
#[derive(Clone)]
pub struct PgAnswerRepository {
    pool: PgPool,
}

impl PgAnswerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerRepository for PgAnswerRepository {
    async fn insert(&self, question_id: i64, author_id: i64, text: &str) -> Result<Option<Answer>, ApiError> {
        // Selecting from questions keeps the liveness check and the insert in one statement
        let answer = sqlx::query_as::<_, Answer>(&format!(
            r#"
            INSERT INTO answers (question_id, author_id, text)
            SELECT id, $2, $3 FROM questions WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            ANSWER_COLUMNS
        ))
        .bind(question_id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match constraint_violation(&e) {
            Some(ConstraintViolation::ForeignKey(constraint))
                if constraint.as_deref().is_some_and(|c| c.contains("author")) =>
            {
                ApiError::not_found("User", author_id)
            }
            Some(ConstraintViolation::ForeignKey(_)) => ApiError::not_found("Question", question_id),
            _ => ApiError::DatabaseError(e),
        })?;

        Ok(answer)
    }

    async fn status(&self, answer_id: i64) -> Result<Option<RecordStatus>, ApiError> {
        let status = sqlx::query_as::<_, RecordStatus>(
            "SELECT author_id, deleted_at FROM answers WHERE id = $1",
        )
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn update_authored(&self, answer_id: i64, author_id: i64, text: &str) -> Result<Option<Answer>, ApiError> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            r#"
            UPDATE answers SET text = $3, updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            ANSWER_COLUMNS
        ))
        .bind(answer_id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    async fn soft_delete_authored(&self, answer_id: i64, author_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE answers SET deleted_at = NOW()
            WHERE id = $1 AND author_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(answer_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
