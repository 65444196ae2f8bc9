// Storage for user records

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{constraint_violation, ConstraintViolation};
use crate::error::ApiError;
use crate::users::models::{
    Credentials, NewUser, PublicUser, RecentAnswer, RecentQuestion, UserRow, UserStatus, VoteTotals,
};

/// Storage operations for users
///
/// Email and handle are unique among live (non-deleted) users; a duplicate
/// surfaces as `ApiError::Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return the assigned identifier
    async fn insert(&self, user: &NewUser) -> Result<i64, ApiError>;

    /// Credentials of the live user with this email (case-insensitive)
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, ApiError>;

    /// Mark a live user deleted; false when there was no live user to mark
    async fn soft_delete(&self, user_id: i64) -> Result<bool, ApiError>;

    /// Deletion state regardless of whether the user is live
    async fn status(&self, user_id: i64) -> Result<Option<UserStatus>, ApiError>;

    /// Public fields of a live user
    async fn find_public(&self, user_id: i64) -> Result<Option<PublicUser>, ApiError>;

    /// Most recent live questions by the user, newest first
    async fn recent_questions(&self, user_id: i64, limit: i64) -> Result<Vec<RecentQuestion>, ApiError>;

    /// Most recent live answers by the user on live questions, newest first
    async fn recent_answers(&self, user_id: i64, limit: i64) -> Result<Vec<RecentAnswer>, ApiError>;

    /// Votes received across the user's live questions
    async fn vote_totals(&self, user_id: i64) -> Result<VoteTotals, ApiError>;
}

/// Translate a failed user insert into a caller-facing outcome
pub(crate) fn user_insert_error(error: sqlx::Error) -> ApiError {
    match constraint_violation(&error) {
        Some(ConstraintViolation::Unique(constraint)) => {
            let constraint = constraint.unwrap_or_default();
            if constraint.contains("email") {
                duplicate_email()
            } else if constraint.contains("handle") {
                duplicate_handle()
            } else {
                ApiError::Conflict {
                    code: "USER_EXISTS",
                    message: "this user already exists".to_string(),
                }
            }
        }
        _ => ApiError::DatabaseError(error),
    }
}

pub(crate) fn duplicate_email() -> ApiError {
    ApiError::Conflict {
        code: "EMAIL_TAKEN",
        message: "this email already exists".to_string(),
    }
}

pub(crate) fn duplicate_handle() -> ApiError {
    ApiError::Conflict {
        code: "HANDLE_TAKEN",
        message: "this handle already exists".to_string(),
    }
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<i64, ApiError> {
        // The id is read back inside the transaction: if that fails the
        // insert is rolled back when `tx` drops.
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, handle, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.handle)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(user_insert_error)?;

        tx.commit().await?;

        tracing::info!("Registered user with id: {}", user_id);
        Ok(user_id)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, ApiError> {
        let credentials = sqlx::query_as::<_, Credentials>(
            r#"
            SELECT id AS user_id, password_hash
            FROM users
            WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    async fn soft_delete(&self, user_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn status(&self, user_id: i64) -> Result<Option<UserStatus>, ApiError> {
        let status = sqlx::query_as::<_, UserStatus>("SELECT deleted_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    async fn find_public(&self, user_id: i64) -> Result<Option<PublicUser>, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT username, handle, created_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PublicUser::from))
    }

    async fn recent_questions(&self, user_id: i64, limit: i64) -> Result<Vec<RecentQuestion>, ApiError> {
        let questions = sqlx::query_as::<_, RecentQuestion>(
            r#"
            SELECT id, title, text, created_at
            FROM questions
            WHERE author_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn recent_answers(&self, user_id: i64, limit: i64) -> Result<Vec<RecentAnswer>, ApiError> {
        let answers = sqlx::query_as::<_, RecentAnswer>(
            r#"
            SELECT a.id, a.question_id, a.text, a.created_at
            FROM answers a
            JOIN questions q ON q.id = a.question_id AND q.deleted_at IS NULL
            WHERE a.author_id = $1 AND a.deleted_at IS NULL
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    async fn vote_totals(&self, user_id: i64) -> Result<VoteTotals, ApiError> {
        let totals = sqlx::query_as::<_, VoteTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM question_upvotes v
                    JOIN questions q ON q.id = v.question_id
                    WHERE q.author_id = $1 AND q.deleted_at IS NULL) AS upvotes,
                (SELECT COUNT(*) FROM question_downvotes v
                    JOIN questions q ON q.id = v.question_id
                    WHERE q.author_id = $1 AND q.deleted_at IS NULL) AS downvotes
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}
