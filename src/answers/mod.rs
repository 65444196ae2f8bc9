// Answers module
// Answers scoped to a question, with author-only edits and soft deletion

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{Answer, AnswerRequest, AnswerView};
pub use repository::{AnswerRepository, PgAnswerRepository};
pub use service::AnswerService;
