// Authentication module
// Bearer token issuance and verification, password hashing, and the
// identity gate in front of protected routes

pub mod cookie;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{AuthGate, AuthenticatedUser};
pub use models::AuthResponse;
pub use password::PasswordService;
pub use token::TokenService;
