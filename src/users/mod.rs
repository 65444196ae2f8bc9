// User accounts module
// Registration, credential checks, soft deletion and public profiles

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{LoginRequest, PublicUser, RegisterRequest, UserProfile};
pub use repository::{PgUserRepository, UserRepository};
pub use service::UserService;
