// Question data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::answers::models::AnswerView;
use crate::error::ApiError;
use crate::users::models::PublicUser;
use crate::validation::{normalize_tags, validate_not_blank, validate_tags};

/// Create question request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionRequest {
    #[validate(length(max = 300), custom = "validate_not_blank")]
    pub title: String,
    #[validate(custom = "validate_not_blank")]
    pub text: String,
    #[serde(default)]
    #[validate(custom = "validate_tags")]
    pub tags: Vec<String>,
}

/// Update question request DTO; only the fields present are applied
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateQuestionRequest {
    #[validate(length(max = 300), custom = "validate_not_blank")]
    pub title: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub text: Option<String>,
}

impl UpdateQuestionRequest {
    /// Validate the fields and require at least one of them
    pub fn into_changes(self) -> Result<QuestionChanges, ApiError> {
        self.validate()?;
        if self.title.is_none() && self.text.is_none() {
            return Err(ApiError::invalid(
                "body",
                "empty_update",
                "at least one of title or text is required",
            ));
        }
        Ok(QuestionChanges {
            title: self.title,
            text: self.text,
        })
    }
}

/// A validated question ready to be stored
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub text: String,
    /// Normalized tag names
    pub tags: Vec<String>,
}

impl From<CreateQuestionRequest> for NewQuestion {
    fn from(request: CreateQuestionRequest) -> Self {
        Self {
            tags: normalize_tags(&request.tags),
            title: request.title,
            text: request.text,
        }
    }
}

/// Validated partial update of a question
#[derive(Debug, Clone, Default)]
pub struct QuestionChanges {
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Question row as stored
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuestionRow {
    pub fn with_tags(self, tags: Vec<String>) -> Question {
        Question {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            text: self.text,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Question record returned from create and update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A live question with its author, tags, answers and vote counts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionView {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// `None` once the author's account is deleted
    pub author: Option<PublicUser>,
    pub tags: Vec<String>,
    pub answers: Vec<AnswerView>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub asked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vote direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Up,
    Down,
}

/// Vote counts of a question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_tags_default_to_empty() {
        let request: CreateQuestionRequest =
            serde_json::from_str(r#"{"title":"Why?","text":"Because."}"#).unwrap();
        assert!(request.tags.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let request = CreateQuestionRequest {
            title: "  ".to_string(),
            text: "Because.".to_string(),
            tags: vec![],
        };
        assert!(request.validate().unwrap_err().field_errors().contains_key("title"));
    }

    #[test]
    fn test_new_question_normalizes_tags() {
        let question = NewQuestion::from(CreateQuestionRequest {
            title: "Why?".to_string(),
            text: "Because.".to_string(),
            tags: vec!["Rust".to_string(), " rust".to_string()],
        });
        assert_eq!(question.tags, vec!["rust".to_string()]);
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(matches!(
            UpdateQuestionRequest::default().into_changes(),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_blank_field_in_update_rejected() {
        let request = UpdateQuestionRequest {
            title: Some(" ".to_string()),
            text: None,
        };
        assert!(matches!(request.into_changes(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_partial_update_accepted() {
        let changes = UpdateQuestionRequest {
            title: None,
            text: Some("Because, really.".to_string()),
        }
        .into_changes()
        .unwrap();
        assert!(changes.title.is_none());
        assert_eq!(changes.text.as_deref(), Some("Because, really."));
    }

    #[test]
    fn test_polarity_wire_format() {
        assert_eq!(serde_json::to_string(&Polarity::Up).unwrap(), r#""up""#);
        assert_eq!(serde_json::to_string(&Polarity::Down).unwrap(), r#""down""#);
    }
}
