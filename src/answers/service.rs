use std::sync::Arc;

use validator::Validate;

use crate::answers::models::{Answer, AnswerRequest};
use crate::answers::repository::AnswerRepository;
use crate::error::ApiError;
use crate::ownership::{authorize, RecordStatus};

const RESOURCE: &str = "Answer";

/// Service layer for answers
#[derive(Clone)]
pub struct AnswerService {
    repository: Arc<dyn AnswerRepository>,
}

impl AnswerService {
    pub fn new(repository: Arc<dyn AnswerRepository>) -> Self {
        Self { repository }
    }

    /// Answer a live question
    pub async fn create(
        &self,
        question_id: i64,
        author_id: i64,
        request: AnswerRequest,
    ) -> Result<Answer, ApiError> {
        request.validate()?;

        let answer = self
            .repository
            .insert(question_id, author_id, &request.text)
            .await?
            .ok_or_else(|| ApiError::not_found("Question", question_id))?;

        tracing::info!(
            "Answer {} created on question {} by user {}",
            answer.id,
            question_id,
            author_id
        );
        Ok(answer)
    }

    /// Author and deletion state; NotFound only when the answer never existed
    pub async fn status_of(&self, answer_id: i64) -> Result<RecordStatus, ApiError> {
        self.repository
            .status(answer_id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, answer_id))
    }

    /// Replace the text of the caller's own answer
    pub async fn update(
        &self,
        answer_id: i64,
        caller_id: i64,
        request: AnswerRequest,
    ) -> Result<Answer, ApiError> {
        request.validate()?;
        self.authorize(answer_id, caller_id).await?;

        match self
            .repository
            .update_authored(answer_id, caller_id, &request.text)
            .await?
        {
            Some(answer) => {
                tracing::info!("Answer {} updated by user {}", answer_id, caller_id);
                Ok(answer)
            }
            None => Err(self.lost_race(answer_id, caller_id).await),
        }
    }

    /// Soft-delete the caller's own answer; deleting twice is NotFound
    pub async fn soft_delete(&self, answer_id: i64, caller_id: i64) -> Result<(), ApiError> {
        self.authorize(answer_id, caller_id).await?;

        if !self
            .repository
            .soft_delete_authored(answer_id, caller_id)
            .await?
        {
            return Err(self.lost_race(answer_id, caller_id).await);
        }

        tracing::info!("Answer {} deleted by user {}", answer_id, caller_id);
        Ok(())
    }

    async fn authorize(&self, answer_id: i64, caller_id: i64) -> Result<RecordStatus, ApiError> {
        let status = self.repository.status(answer_id).await?;
        authorize(status, caller_id, RESOURCE, answer_id)
    }

    async fn lost_race(&self, answer_id: i64, caller_id: i64) -> ApiError {
        tracing::debug!("Answer {} changed during mutation, re-checking", answer_id);
        match self.authorize(answer_id, caller_id).await {
            Err(e) => e,
            Ok(_) => ApiError::not_found(RESOURCE, answer_id),
        }
    }
}
