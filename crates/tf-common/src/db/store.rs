use async_trait::async_trait;
use thiserror::Error;

use crate::{Developer, Project, SkillSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection loss, pool exhaustion, timeouts. Safe to retry.
    #[error("store temporarily unavailable: {0}")]
    Transient(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("failed to map store row: {0}")]
    Mapping(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Read-only snapshot access to developers and projects. The matching core
/// never writes through this seam.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Every developer with `available = true`, skills included.
    async fn list_available_developers(&self) -> Result<Vec<Developer>, StoreError>;

    /// The project with its required skills, or `None` for an unknown id.
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StoreError>;

    /// Skills of one developer; empty for an unknown id.
    async fn get_developer_skills(&self, developer_id: &str) -> Result<SkillSet, StoreError>;

    /// Required skills of one project; empty for an unknown id.
    async fn get_project_skills(&self, project_id: &str) -> Result<SkillSet, StoreError>;

    /// Cheap liveness probe used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
