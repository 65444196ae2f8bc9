// In-memory storage backend
// Implements every repository trait over a single lock, emulating the
// uniqueness and referential rules of the relational schema

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::answers::models::{Answer, AnswerView};
use crate::answers::repository::AnswerRepository;
use crate::error::ApiError;
use crate::ownership::RecordStatus;
use crate::questions::ledger::VoteLedger;
use crate::questions::models::{NewQuestion, Polarity, Question, QuestionChanges, QuestionView, VoteTally};
use crate::questions::repository::QuestionRepository;
use crate::users::models::{
    Credentials, NewUser, PublicUser, RecentAnswer, RecentQuestion, UserRow, UserStatus, VoteTotals,
};
use crate::users::repository::{duplicate_email, duplicate_handle, UserRepository};

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    email: String,
    handle: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn public(&self) -> PublicUser {
        self.row().into()
    }

    /// Author fields as shown on questions and answers
    fn as_author(&self) -> Option<PublicUser> {
        PublicUser::unless_deleted(self.row(), self.deleted_at)
    }

    fn row(&self) -> UserRow {
        UserRow {
            username: self.username.clone(),
            handle: self.handle.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
struct QuestionRecord {
    author_id: i64,
    title: String,
    text: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl QuestionRecord {
    fn to_question(&self, id: i64) -> Question {
        Question {
            id,
            author_id: self.author_id,
            title: self.title.clone(),
            text: self.text.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
struct AnswerRecord {
    question_id: i64,
    author_id: i64,
    text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl AnswerRecord {
    fn to_answer(&self, id: i64) -> Answer {
        Answer {
            id,
            question_id: self.question_id,
            author_id: self.author_id,
            text: self.text.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    last_user_id: i64,
    last_question_id: i64,
    last_answer_id: i64,
    users: BTreeMap<i64, UserRecord>,
    questions: BTreeMap<i64, QuestionRecord>,
    answers: BTreeMap<i64, AnswerRecord>,
    /// (question_id, user_id)
    upvotes: HashSet<(i64, i64)>,
    downvotes: HashSet<(i64, i64)>,
}

impl Tables {
    fn votes(&self, polarity: Polarity) -> &HashSet<(i64, i64)> {
        match polarity {
            Polarity::Up => &self.upvotes,
            Polarity::Down => &self.downvotes,
        }
    }

    fn votes_mut(&mut self, polarity: Polarity) -> &mut HashSet<(i64, i64)> {
        match polarity {
            Polarity::Up => &mut self.upvotes,
            Polarity::Down => &mut self.downvotes,
        }
    }

    fn tally(&self, question_id: i64) -> VoteTally {
        let count = |set: &HashSet<(i64, i64)>| {
            set.iter().filter(|(q, _)| *q == question_id).count() as i64
        };
        VoteTally {
            upvotes: count(&self.upvotes),
            downvotes: count(&self.downvotes),
        }
    }

    fn question_is_live(&self, question_id: i64) -> bool {
        self.questions
            .get(&question_id)
            .is_some_and(|q| q.deleted_at.is_none())
    }
}

/// Repository backend held entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with a known id and no usable password
    #[cfg(test)]
    pub(crate) async fn seed_user(&self, id: i64, username: &str, email: &str, handle: &str) {
        let mut tables = self.tables.write().await;
        tables.last_user_id = tables.last_user_id.max(id);
        tables.users.insert(
            id,
            UserRecord {
                username: username.to_string(),
                email: email.to_string(),
                handle: handle.to_string(),
                password_hash: String::new(),
                created_at: Utc::now(),
                deleted_at: None,
            },
        );
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &NewUser) -> Result<i64, ApiError> {
        let mut tables = self.tables.write().await;

        let live = tables.users.values().filter(|u| u.deleted_at.is_none());
        for existing in live {
            if existing.email.eq_ignore_ascii_case(&user.email) {
                return Err(duplicate_email());
            }
            if existing.handle == user.handle {
                return Err(duplicate_handle());
            }
        }

        tables.last_user_id += 1;
        let id = tables.last_user_id;
        tables.users.insert(
            id,
            UserRecord {
                username: user.username.clone(),
                email: user.email.clone(),
                handle: user.handle.clone(),
                password_hash: user.password_hash.clone(),
                created_at: Utc::now(),
                deleted_at: None,
            },
        );

        tracing::info!("Registered user with id: {}", id);
        Ok(id)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|(_, u)| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(email))
            .map(|(id, u)| Credentials {
                user_id: *id,
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn soft_delete(&self, user_id: i64) -> Result<bool, ApiError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user_id) {
            Some(user) if user.deleted_at.is_none() => {
                user.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn status(&self, user_id: i64) -> Result<Option<UserStatus>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|u| UserStatus {
            deleted_at: u.deleted_at,
        }))
    }

    async fn find_public(&self, user_id: i64) -> Result<Option<PublicUser>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&user_id)
            .filter(|u| u.deleted_at.is_none())
            .map(UserRecord::public))
    }

    async fn recent_questions(&self, user_id: i64, limit: i64) -> Result<Vec<RecentQuestion>, ApiError> {
        let tables = self.tables.read().await;
        let mut questions: Vec<RecentQuestion> = tables
            .questions
            .iter()
            .filter(|(_, q)| q.author_id == user_id && q.deleted_at.is_none())
            .map(|(id, q)| RecentQuestion {
                id: *id,
                title: q.title.clone(),
                text: q.text.clone(),
                created_at: q.created_at,
            })
            .collect();

        questions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        questions.truncate(limit.max(0) as usize);
        Ok(questions)
    }

    async fn recent_answers(&self, user_id: i64, limit: i64) -> Result<Vec<RecentAnswer>, ApiError> {
        let tables = self.tables.read().await;
        let mut answers: Vec<RecentAnswer> = tables
            .answers
            .iter()
            .filter(|(_, a)| {
                a.author_id == user_id
                    && a.deleted_at.is_none()
                    && tables.question_is_live(a.question_id)
            })
            .map(|(id, a)| RecentAnswer {
                id: *id,
                question_id: a.question_id,
                text: a.text.clone(),
                created_at: a.created_at,
            })
            .collect();

        answers.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        answers.truncate(limit.max(0) as usize);
        Ok(answers)
    }

    async fn vote_totals(&self, user_id: i64) -> Result<VoteTotals, ApiError> {
        let tables = self.tables.read().await;
        let authored: HashSet<i64> = tables
            .questions
            .iter()
            .filter(|(_, q)| q.author_id == user_id && q.deleted_at.is_none())
            .map(|(id, _)| *id)
            .collect();

        let count = |set: &HashSet<(i64, i64)>| {
            set.iter().filter(|(q, _)| authored.contains(q)).count() as i64
        };
        Ok(VoteTotals {
            upvotes: count(&tables.upvotes),
            downvotes: count(&tables.downvotes),
        })
    }
}

#[async_trait]
impl QuestionRepository for InMemoryStore {
    async fn insert(&self, author_id: i64, question: &NewQuestion) -> Result<Question, ApiError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&author_id) {
            return Err(ApiError::not_found("User", author_id));
        }

        tables.last_question_id += 1;
        let id = tables.last_question_id;
        let now = Utc::now();
        let record = QuestionRecord {
            author_id,
            title: question.title.clone(),
            text: question.text.clone(),
            tags: question.tags.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = record.to_question(id);
        tables.questions.insert(id, record);

        tracing::info!("Created question {} by user {}", id, author_id);
        Ok(created)
    }

    async fn status(&self, question_id: i64) -> Result<Option<RecordStatus>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.get(&question_id).map(|q| RecordStatus {
            author_id: q.author_id,
            deleted_at: q.deleted_at,
        }))
    }

    async fn find_view(&self, question_id: i64) -> Result<Option<QuestionView>, ApiError> {
        let tables = self.tables.read().await;
        let Some(question) = tables
            .questions
            .get(&question_id)
            .filter(|q| q.deleted_at.is_none())
        else {
            return Ok(None);
        };
        let Some(author) = tables.users.get(&question.author_id) else {
            return Ok(None);
        };

        let mut answers: Vec<(i64, &AnswerRecord)> = tables
            .answers
            .iter()
            .filter(|(_, a)| a.question_id == question_id && a.deleted_at.is_none())
            .map(|(id, a)| (*id, a))
            .collect();
        answers.sort_by_key(|(id, a)| (a.created_at, *id));

        let answers = answers
            .into_iter()
            .filter_map(|(id, a)| {
                tables.users.get(&a.author_id).map(|user| AnswerView {
                    id,
                    text: a.text.clone(),
                    author: user.as_author(),
                    answered_at: a.created_at,
                    updated_at: a.updated_at,
                })
            })
            .collect();

        let mut tags = question.tags.clone();
        tags.sort();
        let tally = tables.tally(question_id);

        Ok(Some(QuestionView {
            id: question_id,
            title: question.title.clone(),
            text: question.text.clone(),
            author: author.as_author(),
            tags,
            answers,
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            asked_at: question.created_at,
            updated_at: question.updated_at,
        }))
    }

    async fn update_authored(
        &self,
        question_id: i64,
        author_id: i64,
        changes: &QuestionChanges,
    ) -> Result<Option<Question>, ApiError> {
        let mut tables = self.tables.write().await;
        let Some(question) = tables
            .questions
            .get_mut(&question_id)
            .filter(|q| q.author_id == author_id && q.deleted_at.is_none())
        else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            question.title = title.clone();
        }
        if let Some(text) = &changes.text {
            question.text = text.clone();
        }
        question.updated_at = Utc::now();

        Ok(Some(question.to_question(question_id)))
    }

    async fn soft_delete_authored(&self, question_id: i64, author_id: i64) -> Result<bool, ApiError> {
        let mut tables = self.tables.write().await;
        match tables.questions.get_mut(&question_id) {
            Some(q) if q.author_id == author_id && q.deleted_at.is_none() => {
                q.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cast_vote(
        &self,
        question_id: i64,
        voter_id: i64,
        polarity: Polarity,
    ) -> Result<VoteTally, ApiError> {
        // The write guard plays the part of the row lock
        let mut tables = self.tables.write().await;

        let status = tables.questions.get(&question_id).map(|q| RecordStatus {
            author_id: q.author_id,
            deleted_at: q.deleted_at,
        });
        let key = (question_id, voter_id);
        let existing = [Polarity::Up, Polarity::Down]
            .into_iter()
            .find(|p| tables.votes(*p).contains(&key));

        VoteLedger::admit(status, question_id, voter_id, existing)?;

        if !tables.users.contains_key(&voter_id) {
            return Err(ApiError::not_found("User", voter_id));
        }
        tables.votes_mut(polarity).insert(key);

        Ok(tables.tally(question_id))
    }
}

#[async_trait]
impl AnswerRepository for InMemoryStore {
    async fn insert(&self, question_id: i64, author_id: i64, text: &str) -> Result<Option<Answer>, ApiError> {
        let mut tables = self.tables.write().await;
        if !tables.question_is_live(question_id) {
            return Ok(None);
        }
        if !tables.users.contains_key(&author_id) {
            return Err(ApiError::not_found("User", author_id));
        }

        tables.last_answer_id += 1;
        let id = tables.last_answer_id;
        let now = Utc::now();
        let record = AnswerRecord {
            question_id,
            author_id,
            text: text.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = record.to_answer(id);
        tables.answers.insert(id, record);
        Ok(Some(created))
    }

    async fn status(&self, answer_id: i64) -> Result<Option<RecordStatus>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.answers.get(&answer_id).map(|a| RecordStatus {
            author_id: a.author_id,
            deleted_at: a.deleted_at,
        }))
    }

    async fn update_authored(&self, answer_id: i64, author_id: i64, text: &str) -> Result<Option<Answer>, ApiError> {
        let mut tables = self.tables.write().await;
        match tables.answers.get_mut(&answer_id) {
            Some(a) if a.author_id == author_id && a.deleted_at.is_none() => {
                a.text = text.to_string();
                a.updated_at = Utc::now();
                Ok(Some(a.to_answer(answer_id)))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_authored(&self, answer_id: i64, author_id: i64) -> Result<bool, ApiError> {
        let mut tables = self.tables.write().await;
        match tables.answers.get_mut(&answer_id) {
            Some(a) if a.author_id == author_id && a.deleted_at.is_none() => {
                a.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
