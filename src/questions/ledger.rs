use crate::error::ApiError;
use crate::ownership::RecordStatus;
use crate::questions::models::Polarity;

/// Rules of the vote ledger
///
/// Votes live in two disjoint sets per question, one per polarity. A voter
/// may appear in at most one of them and never on their own question.
pub struct VoteLedger;

impl VoteLedger {
    /// Storage table holding the votes of a polarity
    pub fn table(polarity: Polarity) -> &'static str {
        match polarity {
            Polarity::Up => "question_upvotes",
            Polarity::Down => "question_downvotes",
        }
    }

    /// Decide whether a vote may be recorded
    ///
    /// # Arguments
    /// * `status` - Author and deletion state of the question, `None` if absent
    /// * `question_id` - Question being voted on
    /// * `voter_id` - Authenticated caller
    /// * `existing` - The voter's current vote on the question, if any
    ///
    /// # Returns
    /// `Ok(())` when the vote may be inserted. Otherwise, checked in order:
    /// - NotFound if the question is absent or soft-deleted
    /// - SelfActionRejected if the voter authored the question
    /// - Conflict if the voter already voted in either direction
    pub fn admit(
        status: Option<RecordStatus>,
        question_id: i64,
        voter_id: i64,
        existing: Option<Polarity>,
    ) -> Result<(), ApiError> {
        let status = match status {
            Some(status) if !status.is_deleted() => status,
            _ => return Err(ApiError::not_found("Question", question_id)),
        };

        if status.author_id == voter_id {
            return Err(ApiError::SelfActionRejected(
                "cannot vote on your own question".to_string(),
            ));
        }

        if existing.is_some() {
            return Err(already_voted());
        }

        Ok(())
    }
}

/// Conflict reported for a second vote by the same user on a question
pub fn already_voted() -> ApiError {
    ApiError::Conflict {
        code: "ALREADY_VOTED",
        message: "you have already voted on this question".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const AUTHOR: i64 = 1;
    const VOTER: i64 = 2;

    fn live() -> Option<RecordStatus> {
        Some(RecordStatus {
            author_id: AUTHOR,
            deleted_at: None,
        })
    }

    #[test]
    fn test_first_vote_admitted() {
        assert!(VoteLedger::admit(live(), 10, VOTER, None).is_ok());
    }

    #[test]
    fn test_self_vote_rejected() {
        assert!(matches!(
            VoteLedger::admit(live(), 10, AUTHOR, None),
            Err(ApiError::SelfActionRejected(_))
        ));
    }

    #[test]
    fn test_second_vote_conflicts_in_either_direction() {
        for existing in [Polarity::Up, Polarity::Down] {
            assert!(matches!(
                VoteLedger::admit(live(), 10, VOTER, Some(existing)),
                Err(ApiError::Conflict { code: "ALREADY_VOTED", .. })
            ));
        }
    }

    #[test]
    fn test_deleted_question_not_found() {
        let deleted = Some(RecordStatus {
            author_id: AUTHOR,
            deleted_at: Some(Utc::now()),
        });
        assert!(matches!(
            VoteLedger::admit(deleted, 10, VOTER, None),
            Err(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            VoteLedger::admit(None, 10, VOTER, None),
            Err(ApiError::NotFound { .. })
        ));
    }

    #[test]
    fn test_tables_are_disjoint() {
        assert_ne!(VoteLedger::table(Polarity::Up), VoteLedger::table(Polarity::Down));
    }
}
