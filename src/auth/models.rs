// Authentication response DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authentication response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: i64,
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

impl AuthResponse {
    pub fn bearer(user_id: i64, access_token: String, expires_in: i64) -> Self {
        Self {
            user_id,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
