use std::sync::Arc;

use validator::Validate;

use crate::auth::{AuthError, PasswordService};
use crate::error::ApiError;
use crate::users::models::{
    AnswerSummary, LoginRequest, Links, NewUser, QuestionSummary, RegisterRequest, UserProfile,
};
use crate::users::repository::UserRepository;

/// Number of recent questions and answers shown on a profile
pub const PROFILE_RECENT_LIMIT: i64 = 10;

/// Result of checking a login attempt against stored credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(i64),
    UnknownEmail,
    WrongPassword,
}

/// Service layer for user accounts
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    passwords: PasswordService,
    links: Links,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, passwords: PasswordService, links: Links) -> Self {
        Self {
            repository,
            passwords,
            links,
        }
    }

    /// Register a new user
    ///
    /// This method:
    /// 1. Validates the request
    /// 2. Hashes the password
    /// 3. Inserts the user, surfacing a duplicate email or handle as Conflict
    pub async fn register(&self, request: RegisterRequest) -> Result<i64, ApiError> {
        // 1. Validate request
        request.validate()?;

        // 2. Hash password
        let password_hash = self.passwords.hash_password(&request.password)?;

        // 3. Insert
        let user = NewUser {
            username: request.username,
            email: request.email,
            handle: request.handle,
            password_hash,
        };
        self.repository.insert(&user).await
    }

    /// Check credentials without collapsing the failure cases
    pub async fn check_credentials(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let Some(credentials) = self.repository.find_credentials(email).await? else {
            return Ok(LoginOutcome::UnknownEmail);
        };

        if self.passwords.verify_password(password, &credentials.password_hash)? {
            Ok(LoginOutcome::Authenticated(credentials.user_id))
        } else {
            Ok(LoginOutcome::WrongPassword)
        }
    }

    /// Authenticate a login request and return the user id
    ///
    /// Unknown email and wrong password are logged apart but answer the
    /// caller with the same message.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<i64, ApiError> {
        request.validate()?;

        match self.check_credentials(&request.email, &request.password).await? {
            LoginOutcome::Authenticated(user_id) => {
                tracing::info!("User {} logged in", user_id);
                Ok(user_id)
            }
            LoginOutcome::UnknownEmail => {
                tracing::debug!("Login attempt for unknown email");
                Err(AuthError::UnknownEmail.into())
            }
            LoginOutcome::WrongPassword => {
                tracing::warn!("Login attempt with wrong password");
                Err(AuthError::WrongPassword.into())
            }
        }
    }

    /// Soft-delete the user
    pub async fn soft_delete(&self, user_id: i64) -> Result<(), ApiError> {
        if !self.repository.soft_delete(user_id).await? {
            return Err(ApiError::not_found("User", user_id));
        }

        tracing::info!("Soft-deleted user {}", user_id);
        Ok(())
    }

    /// Whether the user exists but is soft-deleted
    pub async fn is_deleted(&self, user_id: i64) -> Result<bool, ApiError> {
        let status = self
            .repository
            .status(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", user_id))?;

        Ok(status.deleted_at.is_some())
    }

    /// Reject callers whose account is gone; a valid token outlives its user otherwise
    pub async fn ensure_active(&self, user_id: i64) -> Result<(), ApiError> {
        match self.repository.status(user_id).await? {
            Some(status) if status.deleted_at.is_none() => Ok(()),
            _ => Err(ApiError::Unauthenticated(
                "account is no longer active".to_string(),
            )),
        }
    }

    /// Build the public profile of a live user
    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, ApiError> {
        let user = self
            .repository
            .find_public(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", user_id))?;

        let (questions, answers, totals) = tokio::try_join!(
            self.repository.recent_questions(user_id, PROFILE_RECENT_LIMIT),
            self.repository.recent_answers(user_id, PROFILE_RECENT_LIMIT),
            self.repository.vote_totals(user_id),
        )?;

        let last_questions = questions
            .into_iter()
            .map(|q| QuestionSummary {
                link: self.links.question(q.id),
                question_id: q.id,
                title: q.title,
                text: q.text,
                asked_at: q.created_at,
            })
            .collect();

        let last_answers = answers
            .into_iter()
            .map(|a| AnswerSummary {
                link: self.links.answer(a.question_id, a.id),
                answer_id: a.id,
                question_id: a.question_id,
                text: a.text,
                answered_at: a.created_at,
            })
            .collect();

        Ok(UserProfile {
            username: user.username,
            handle: user.handle,
            registered_at: user.registered_at,
            total_upvotes: totals.upvotes,
            total_downvotes: totals.downvotes,
            last_questions,
            last_answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::fast_password_service;
    use crate::memory::InMemoryStore;

    fn service() -> UserService {
        let store = Arc::new(InMemoryStore::new());
        UserService::new(store, fast_password_service(), Links::new("localhost:3000", false))
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "secret1".to_string(),
            handle: "alicehandle".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let users = service();
        let id = users.register(alice()).await.unwrap();

        let login = LoginRequest {
            email: "alice@x.com".to_string(),
            password: "secret1".to_string(),
        };
        assert_eq!(users.authenticate(&login).await.unwrap(), id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let users = service();
        users.register(alice()).await.unwrap();

        let mut again = alice();
        again.handle = "otherhandle".to_string();
        let err = users.register(again).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { code: "EMAIL_TAKEN", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_handle_conflicts() {
        let users = service();
        users.register(alice()).await.unwrap();

        let mut again = alice();
        again.email = "other@x.com".to_string();
        let err = users.register(again).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { code: "HANDLE_TAKEN", .. }));
    }

    #[tokio::test]
    async fn test_invalid_registration_is_validation_error() {
        let users = service();
        let mut request = alice();
        request.password = "short".to_string();
        assert!(matches!(
            users.register(request).await,
            Err(ApiError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_distinct_internally_only() {
        let users = service();
        users.register(alice()).await.unwrap();

        assert_eq!(
            users.check_credentials("nobody@x.com", "secret1").await.unwrap(),
            LoginOutcome::UnknownEmail
        );
        assert_eq!(
            users.check_credentials("alice@x.com", "wrong!!").await.unwrap(),
            LoginOutcome::WrongPassword
        );

        let unknown = users
            .authenticate(&LoginRequest {
                email: "nobody@x.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();
        let wrong = users
            .authenticate(&LoginRequest {
                email: "alice@x.com".to_string(),
                password: "wrong!!".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_soft_delete_then_login_fails() {
        let users = service();
        let id = users.register(alice()).await.unwrap();

        users.soft_delete(id).await.unwrap();
        assert!(users.is_deleted(id).await.unwrap());
        assert!(matches!(
            users.ensure_active(id).await,
            Err(ApiError::Unauthenticated(_))
        ));
        assert_eq!(
            users.check_credentials("alice@x.com", "secret1").await.unwrap(),
            LoginOutcome::UnknownEmail
        );

        // a second delete finds no live user
        assert!(matches!(
            users.soft_delete(id).await,
            Err(ApiError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleted_user_frees_email_and_handle() {
        let users = service();
        let id = users.register(alice()).await.unwrap();
        users.soft_delete(id).await.unwrap();

        let again = users.register(alice()).await.unwrap();
        assert_ne!(again, id);
    }

    #[tokio::test]
    async fn test_is_deleted_unknown_user() {
        let users = service();
        assert!(matches!(
            users.is_deleted(99).await,
            Err(ApiError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_profile_of_new_user_is_empty() {
        let users = service();
        let id = users.register(alice()).await.unwrap();

        let profile = users.profile(id).await.unwrap();
        assert_eq!(profile.handle, "@alicehandle");
        assert_eq!(profile.total_upvotes, 0);
        assert_eq!(profile.total_downvotes, 0);
        assert!(profile.last_questions.is_empty());
        assert!(profile.last_answers.is_empty());
    }
}
