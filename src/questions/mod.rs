// Questions module
// Asking, viewing, author-only edits and the vote ledger

pub mod handlers;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod service;

pub use ledger::VoteLedger;
pub use models::{Polarity, Question, QuestionView, VoteTally};
pub use repository::{PgQuestionRepository, QuestionRepository};
pub use service::QuestionService;
