use std::fmt;

use thiserror::Error;

use super::ranking::PageError;
use crate::db::StoreError;
use crate::{ProjectId, ProjectStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotMatchableReason {
    NotOpen(ProjectStatus),
    NoRequiredSkills,
}

impl fmt::Display for NotMatchableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotMatchableReason::NotOpen(status) => {
                write!(f, "project status is {status}, only OPEN projects can be matched")
            }
            NotMatchableReason::NoRequiredSkills => {
                f.write_str("project declares no required skills")
            }
        }
    }
}

/// Failure modes of a matching request. `Clone` so one in-flight computation
/// can hand the same outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchingError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("project {project_id} is not matchable: {reason}")]
    ProjectNotMatchable {
        project_id: ProjectId,
        reason: NotMatchableReason,
    },
    #[error("invalid page parameters: {0}")]
    InvalidPageParameters(#[from] PageError),
    #[error("snapshot read failed: {0}")]
    TransientStoreError(String),
    #[error("internal matching error: {0}")]
    Internal(String),
}

impl MatchingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchingError::TransientStoreError(_))
    }
}

impl From<StoreError> for MatchingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Transient(msg) => MatchingError::TransientStoreError(msg),
            other => MatchingError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_failures_are_retryable() {
        assert!(MatchingError::TransientStoreError("timeout".into()).is_retryable());
        assert!(!MatchingError::ProjectNotFound("p".into()).is_retryable());
        assert!(!MatchingError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn maps_store_errors() {
        assert_eq!(
            MatchingError::from(StoreError::Transient("reset".into())),
            MatchingError::TransientStoreError("reset".into())
        );
        assert!(matches!(
            MatchingError::from(StoreError::Mapping("bad status".into())),
            MatchingError::Internal(_)
        ));
    }

    #[test]
    fn not_matchable_message_names_the_status() {
        let err = MatchingError::ProjectNotMatchable {
            project_id: "p1".into(),
            reason: NotMatchableReason::NotOpen(ProjectStatus::Closed),
        };
        assert!(err.to_string().contains("CLOSED"));
    }
}
