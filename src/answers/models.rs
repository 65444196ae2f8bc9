// Answer data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::users::models::{PublicUser, UserRow};
use crate::validation::validate_not_blank;

/// Create or update answer request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AnswerRequest {
    #[validate(custom = "validate_not_blank")]
    pub text: String,
}

/// Answer record as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A live answer with its author's public fields, as listed under a question
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerView {
    pub id: i64,
    pub text: String,
    /// `None` once the author's account is deleted
    pub author: Option<PublicUser>,
    pub answered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Answer joined with its author
#[derive(Debug, Clone, FromRow)]
pub struct AnswerViewRow {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub handle: String,
    pub registered_at: DateTime<Utc>,
    pub author_deleted_at: Option<DateTime<Utc>>,
}

impl From<AnswerViewRow> for AnswerView {
    fn from(row: AnswerViewRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author: PublicUser::unless_deleted(
                UserRow {
                    username: row.username,
                    handle: row.handle,
                    created_at: row.registered_at,
                },
                row.author_deleted_at,
            ),
            answered_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
