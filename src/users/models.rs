// User data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{display_handle, validate_alphanumeric, validate_handle};

/// Registration request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        length(max = 100, message = "Username must be at most 100 characters"),
        custom = "validate_alphanumeric"
    )]
    pub username: String,
    #[validate(email, length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(
        length(max = 100, message = "Handle must be at most 100 characters"),
        custom = "validate_handle"
    )]
    pub handle: String,
}

/// Login request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// A validated registration, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub handle: String,
    pub password_hash: String,
}

/// Stored credentials of a live user
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub user_id: i64,
    pub password_hash: String,
}

/// Deletion state of a user row
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UserStatus {
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Public fields of a user as stored
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub username: String,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

/// Public fields of a user as shown to other users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub username: String,
    /// Handle with the display sigil prepended
    pub handle: String,
    pub registered_at: DateTime<Utc>,
}

impl PublicUser {
    /// Public fields of an author, hidden once the account is soft-deleted
    pub fn unless_deleted(row: UserRow, deleted_at: Option<DateTime<Utc>>) -> Option<Self> {
        match deleted_at {
            None => Some(row.into()),
            Some(_) => None,
        }
    }
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            handle: display_handle(&row.handle),
            registered_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RecentQuestion {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecentAnswer {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Votes received across a user's live questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct VoteTotals {
    pub upvotes: i64,
    pub downvotes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionSummary {
    pub question_id: i64,
    pub title: String,
    pub text: String,
    pub asked_at: DateTime<Utc>,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerSummary {
    pub answer_id: i64,
    pub question_id: i64,
    pub text: String,
    pub answered_at: DateTime<Utc>,
    pub link: String,
}

/// Profile aggregate: public fields, recent activity and vote totals
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub username: String,
    pub handle: String,
    pub registered_at: DateTime<Utc>,
    pub total_upvotes: i64,
    pub total_downvotes: i64,
    pub last_questions: Vec<QuestionSummary>,
    pub last_answers: Vec<AnswerSummary>,
}

/// Builds absolute links to questions from the configured domain
#[derive(Debug, Clone)]
pub struct Links {
    base: String,
}

impl Links {
    pub fn new(domain: &str, use_tls: bool) -> Self {
        let scheme = if use_tls { "https" } else { "http" };
        Self {
            base: format!("{}://{}/api/v1", scheme, domain.trim_end_matches('/')),
        }
    }

    pub fn question(&self, question_id: i64) -> String {
        format!("{}/questions/{}", self.base, question_id)
    }

    pub fn answer(&self, question_id: i64, answer_id: i64) -> String {
        format!("{}/questions/{}#answer-{}", self.base, question_id, answer_id)
    }
}
