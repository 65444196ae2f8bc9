// Ownership and deletion precondition shared by every author-gated mutation

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::error::ApiError;

/// Author and deletion state of a question or answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct RecordStatus {
    pub author_id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecordStatus {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Check that `caller_id` may mutate the record
///
/// Existence is checked before authorship: an absent or soft-deleted record
/// is NotFound for everyone, and only a live record reports Unauthorized.
pub fn authorize(
    status: Option<RecordStatus>,
    caller_id: i64,
    resource: &str,
    id: i64,
) -> Result<RecordStatus, ApiError> {
    let status = match status {
        Some(status) if !status.is_deleted() => status,
        _ => return Err(ApiError::not_found(resource, id)),
    };

    if status.author_id != caller_id {
        return Err(ApiError::Unauthorized(format!(
            "user {} is not the author of {} {}",
            caller_id,
            resource.to_lowercase(),
            id
        )));
    }

    Ok(status)
}
