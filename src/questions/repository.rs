// Storage for questions, their tags and the vote ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::answers::models::{AnswerView, AnswerViewRow};
use crate::db::{constraint_violation, ConstraintViolation};
use crate::error::ApiError;
use crate::ownership::RecordStatus;
use crate::questions::ledger::{already_voted, VoteLedger};
use crate::questions::models::{
    NewQuestion, Polarity, Question, QuestionChanges, QuestionRow, QuestionView, VoteTally,
};
use crate::users::models::{PublicUser, UserRow};

/// Storage operations for questions
///
/// The `*_authored` mutations carry the ownership predicate in the statement
/// itself and report `None`/`false` when it matched nothing.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a question with its tags in one transaction
    async fn insert(&self, author_id: i64, question: &NewQuestion) -> Result<Question, ApiError>;

    /// Author and deletion state, including soft-deleted questions
    async fn status(&self, question_id: i64) -> Result<Option<RecordStatus>, ApiError>;

    /// Assemble the view of a live question
    async fn find_view(&self, question_id: i64) -> Result<Option<QuestionView>, ApiError>;

    /// Apply changes to a live question written by `author_id`
    async fn update_authored(
        &self,
        question_id: i64,
        author_id: i64,
        changes: &QuestionChanges,
    ) -> Result<Option<Question>, ApiError>;

    /// Soft-delete a live question written by `author_id`
    async fn soft_delete_authored(&self, question_id: i64, author_id: i64) -> Result<bool, ApiError>;

    /// Record a vote under the ledger rules and return the new tally
    async fn cast_vote(
        &self,
        question_id: i64,
        voter_id: i64,
        polarity: Polarity,
    ) -> Result<VoteTally, ApiError>;
}

const QUESTION_COLUMNS: &str = "id, author_id, title, text, created_at, updated_at";

/// Question joined with its author and vote counts
#[derive(Debug, FromRow)]
struct QuestionViewRow {
    id: i64,
    title: String,
    text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    username: String,
    handle: String,
    registered_at: DateTime<Utc>,
    author_deleted_at: Option<DateTime<Utc>>,
    upvotes: i64,
    downvotes: i64,
}

/// PostgreSQL question repository
#[derive(Clone)]
pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn tags_of(conn: &mut PgConnection, question_id: i64) -> Result<Vec<String>, ApiError> {
        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name
            FROM tags t
            JOIN question_tags qt ON qt.tag_id = t.id
            WHERE qt.question_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(question_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(tags)
    }

    async fn tally(conn: &mut PgConnection, question_id: i64) -> Result<VoteTally, ApiError> {
        let tally = sqlx::query_as::<_, VoteTally>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM question_upvotes WHERE question_id = $1) AS upvotes,
                (SELECT COUNT(*) FROM question_downvotes WHERE question_id = $1) AS downvotes
            "#,
        )
        .bind(question_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(tally)
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn insert(&self, author_id: i64, question: &NewQuestion) -> Result<Question, ApiError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "INSERT INTO questions (author_id, title, text) VALUES ($1, $2, $3) RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(author_id)
        .bind(&question.title)
        .bind(&question.text)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match constraint_violation(&e) {
            Some(ConstraintViolation::ForeignKey(_)) => ApiError::not_found("User", author_id),
            _ => ApiError::DatabaseError(e),
        })?;

        for tag in &question.tags {
            let tag_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO tags (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(tag)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO question_tags (question_id, tag_id) VALUES ($1, $2)")
                .bind(row.id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("Created question {} by user {}", row.id, author_id);
        Ok(row.with_tags(question.tags.clone()))
    }

    async fn status(&self, question_id: i64) -> Result<Option<RecordStatus>, ApiError> {
        let status = sqlx::query_as::<_, RecordStatus>(
            "SELECT author_id, deleted_at FROM questions WHERE id = $1",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn find_view(&self, question_id: i64) -> Result<Option<QuestionView>, ApiError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, QuestionViewRow>(
            r#"
            SELECT q.id, q.title, q.text, q.created_at, q.updated_at,
                   u.username, u.handle, u.created_at AS registered_at,
                   u.deleted_at AS author_deleted_at,
                   (SELECT COUNT(*) FROM question_upvotes WHERE question_id = q.id) AS upvotes,
                   (SELECT COUNT(*) FROM question_downvotes WHERE question_id = q.id) AS downvotes
            FROM questions q
            JOIN users u ON u.id = q.author_id
            WHERE q.id = $1 AND q.deleted_at IS NULL
            "#,
        )
        .bind(question_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = Self::tags_of(&mut *conn, question_id).await?;

        let answers = sqlx::query_as::<_, AnswerViewRow>(
            r#"
            SELECT a.id, a.text, a.created_at, a.updated_at,
                   u.username, u.handle, u.created_at AS registered_at,
                   u.deleted_at AS author_deleted_at
            FROM answers a
            JOIN users u ON u.id = a.author_id
            WHERE a.question_id = $1 AND a.deleted_at IS NULL
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(question_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(QuestionView {
            id: row.id,
            title: row.title,
            text: row.text,
            author: PublicUser::unless_deleted(
                UserRow {
                    username: row.username,
                    handle: row.handle,
                    created_at: row.registered_at,
                },
                row.author_deleted_at,
            ),
            tags,
            answers: answers.into_iter().map(AnswerView::from).collect(),
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            asked_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn update_authored(
        &self,
        question_id: i64,
        author_id: i64,
        changes: &QuestionChanges,
    ) -> Result<Option<Question>, ApiError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            UPDATE questions
            SET title = COALESCE($3, title),
                text = COALESCE($4, text),
                updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(question_id)
        .bind(author_id)
        .bind(&changes.title)
        .bind(&changes.text)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let tags = Self::tags_of(&mut *conn, question_id).await?;
                Ok(Some(row.with_tags(tags)))
            }
            None => Ok(None),
        }
    }

    async fn soft_delete_authored(&self, question_id: i64, author_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE questions SET deleted_at = NOW()
            WHERE id = $1 AND author_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(question_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cast_vote(
        &self,
        question_id: i64,
        voter_id: i64,
        polarity: Polarity,
    ) -> Result<VoteTally, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent votes on the same question, so an
        // upvote and a downvote by one user cannot both pass the check.
        let status = sqlx::query_as::<_, RecordStatus>(
            "SELECT author_id, deleted_at FROM questions WHERE id = $1 FOR UPDATE",
        )
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (up, down): (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM question_upvotes WHERE question_id = $1 AND user_id = $2),
                EXISTS(SELECT 1 FROM question_downvotes WHERE question_id = $1 AND user_id = $2)
            "#,
        )
        .bind(question_id)
        .bind(voter_id)
        .fetch_one(&mut *tx)
        .await?;

        let existing = match (up, down) {
            (true, _) => Some(Polarity::Up),
            (_, true) => Some(Polarity::Down),
            _ => None,
        };

        VoteLedger::admit(status, question_id, voter_id, existing)?;

        sqlx::query(&format!(
            "INSERT INTO {} (question_id, user_id) VALUES ($1, $2)",
            VoteLedger::table(polarity)
        ))
        .bind(question_id)
        .bind(voter_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match constraint_violation(&e) {
            Some(ConstraintViolation::Unique(_)) => already_voted(),
            Some(ConstraintViolation::ForeignKey(_)) => ApiError::not_found("User", voter_id),
            None => ApiError::DatabaseError(e),
        })?;

        let tally = Self::tally(&mut *tx, question_id).await?;
        tx.commit().await?;

        tracing::info!(
            "User {} voted {:?} on question {}",
            voter_id,
            polarity,
            question_id
        );
        Ok(tally)
    }
}
