use std::sync::Arc;

use validator::Validate;

use crate::error::ApiError;
use crate::ownership::{authorize, RecordStatus};
use crate::questions::models::{
    CreateQuestionRequest, NewQuestion, Polarity, Question, QuestionView, UpdateQuestionRequest,
    VoteTally,
};
use crate::questions::repository::QuestionRepository;

const RESOURCE: &str = "Question";

/// Service layer for questions and votes
#[derive(Clone)]
pub struct QuestionService {
    repository: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    pub fn new(repository: Arc<dyn QuestionRepository>) -> Self {
        Self { repository }
    }

    /// Ask a new question
    pub async fn create(&self, author_id: i64, request: CreateQuestionRequest) -> Result<Question, ApiError> {
        request.validate()?;
        self.repository.insert(author_id, &NewQuestion::from(request)).await
    }

    /// View a live question; a soft-deleted one is NotFound
    pub async fn get(&self, question_id: i64) -> Result<QuestionView, ApiError> {
        self.repository
            .find_view(question_id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, question_id))
    }

    /// Author and deletion state; NotFound only when the question never existed
    pub async fn status_of(&self, question_id: i64) -> Result<RecordStatus, ApiError> {
        self.repository
            .status(question_id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, question_id))
    }

    /// Update the caller's own question
    ///
    /// This method:
    /// 1. Validates the request (at least one non-blank field)
    /// 2. Checks existence, then authorship
    /// 3. Applies the change conditionally on the same predicate
    pub async fn update_authored(
        &self,
        question_id: i64,
        caller_id: i64,
        request: UpdateQuestionRequest,
    ) -> Result<Question, ApiError> {
        // 1. Validate request
        let changes = request.into_changes()?;

        // 2. Ownership precondition
        self.authorize(question_id, caller_id).await?;

        // 3. Conditional update
        match self
            .repository
            .update_authored(question_id, caller_id, &changes)
            .await?
        {
            Some(question) => {
                tracing::info!("Question {} updated by user {}", question_id, caller_id);
                Ok(question)
            }
            None => Err(self.lost_race(question_id, caller_id).await),
        }
    }

    /// Soft-delete the caller's own question
    pub async fn soft_delete(&self, question_id: i64, caller_id: i64) -> Result<(), ApiError> {
        self.authorize(question_id, caller_id).await?;

        if !self
            .repository
            .soft_delete_authored(question_id, caller_id)
            .await?
        {
            return Err(self.lost_race(question_id, caller_id).await);
        }

        tracing::info!("Question {} deleted by user {}", question_id, caller_id);
        Ok(())
    }

    /// Upvote or downvote someone else's question
    pub async fn vote(
        &self,
        question_id: i64,
        voter_id: i64,
        polarity: Polarity,
    ) -> Result<VoteTally, ApiError> {
        self.repository.cast_vote(question_id, voter_id, polarity).await
    }

    async fn authorize(&self, question_id: i64, caller_id: i64) -> Result<RecordStatus, ApiError> {
        let status = self.repository.status(question_id).await?;
        authorize(status, caller_id, RESOURCE, question_id)
    }

    /// Outcome for a conditional mutation that matched no row after the
    /// precondition passed: the record changed in between, so re-check it
    async fn lost_race(&self, question_id: i64, caller_id: i64) -> ApiError {
        tracing::debug!("Question {} changed during mutation, re-checking", question_id);
        match self.authorize(question_id, caller_id).await {
            Err(e) => e,
            Ok(_) => ApiError::not_found(RESOURCE, question_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    const ALICE: i64 = 1;
    const BOB: i64 = 2;

    async fn setup() -> (QuestionService, i64) {
        let store = Arc::new(InMemoryStore::new());
        store.seed_user(ALICE, "alice", "alice@x.com", "alicehandle").await;
        store.seed_user(BOB, "bob", "bob@x.com", "bobhandle").await;

        let service = QuestionService::new(store);
        let question = service
            .create(
                ALICE,
                CreateQuestionRequest {
                    title: "Why?".to_string(),
                    text: "Because.".to_string(),
                    tags: vec!["Philosophy".to_string()],
                },
            )
            .await
            .unwrap();
        (service, question.id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (service, id) = setup().await;

        let view = service.get(id).await.unwrap();
        assert_eq!(view.title, "Why?");
        assert_eq!(view.author.unwrap().handle, "@alicehandle");
        assert_eq!(view.tags, vec!["philosophy".to_string()]);
        assert!(view.answers.is_empty());
        assert_eq!((view.upvotes, view.downvotes), (0, 0));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let (service, _) = setup().await;
        let result = service
            .create(
                ALICE,
                CreateQuestionRequest {
                    title: String::new(),
                    text: "Because.".to_string(),
                    tags: vec![],
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_by_author_is_visible() {
        let (service, id) = setup().await;

        let request = UpdateQuestionRequest {
            title: Some("Why not?".to_string()),
            text: None,
        };
        let updated = service.update_authored(id, ALICE, request).await.unwrap();
        assert_eq!(updated.title, "Why not?");
        assert_eq!(updated.text, "Because.");

        assert_eq!(service.get(id).await.unwrap().title, "Why not?");
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_unauthorized() {
        let (service, id) = setup().await;

        let request = UpdateQuestionRequest {
            title: Some("Hijacked".to_string()),
            text: None,
        };
        assert!(matches!(
            service.update_authored(id, BOB, request).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert_eq!(service.get(id).await.unwrap().title, "Why?");
    }

    #[tokio::test]
    async fn test_delete_by_other_user_is_unauthorized() {
        let (service, id) = setup().await;
        assert!(matches!(
            service.soft_delete(id, BOB).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(service.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_question_is_not_found_for_author() {
        let (service, id) = setup().await;
        service.soft_delete(id, ALICE).await.unwrap();

        assert!(matches!(service.get(id).await, Err(ApiError::NotFound { .. })));

        let request = UpdateQuestionRequest {
            title: Some("Again".to_string()),
            text: None,
        };
        assert!(matches!(
            service.update_authored(id, ALICE, request).await,
            Err(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            service.soft_delete(id, ALICE).await,
            Err(ApiError::NotFound { .. })
        ));

        // status stays readable for internal checks
        assert!(service.status_of(id).await.unwrap().is_deleted());
    }

    #[tokio::test]
    async fn test_vote_rules() {
        let (service, id) = setup().await;

        assert!(matches!(
            service.vote(id, ALICE, Polarity::Up).await,
            Err(ApiError::SelfActionRejected(_))
        ));

        let tally = service.vote(id, BOB, Polarity::Up).await.unwrap();
        assert_eq!(tally, VoteTally { upvotes: 1, downvotes: 0 });

        assert!(matches!(
            service.vote(id, BOB, Polarity::Up).await,
            Err(ApiError::Conflict { code: "ALREADY_VOTED", .. })
        ));
        assert!(matches!(
            service.vote(id, BOB, Polarity::Down).await,
            Err(ApiError::Conflict { code: "ALREADY_VOTED", .. })
        ));

        let view = service.get(id).await.unwrap();
        assert_eq!((view.upvotes, view.downvotes), (1, 0));
    }

    #[tokio::test]
    async fn test_vote_on_missing_or_deleted_question() {
        let (service, id) = setup().await;
        assert!(matches!(
            service.vote(999, BOB, Polarity::Down).await,
            Err(ApiError::NotFound { .. })
        ));

        service.soft_delete(id, ALICE).await.unwrap();
        assert!(matches!(
            service.vote(id, BOB, Polarity::Down).await,
            Err(ApiError::NotFound { .. })
        ));
    }
}
