use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::store::{MatchStore, StoreError};
use crate::{Developer, DeveloperId, Project, ProjectId, ProjectStatus, Skill, SkillId, SkillSet};

#[derive(Debug, Default)]
struct MemoryState {
    skills: BTreeMap<SkillId, Skill>,
    developers: BTreeMap<DeveloperId, Developer>,
    projects: BTreeMap<ProjectId, Project>,
}

/// In-process store for tests and local runs.
///
/// Supports failure injection (`fail_next_reads`) and an artificial read delay
/// so retry, coalescing and cancellation paths can be exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    pending_failures: AtomicU32,
    snapshot_reads: AtomicU64,
    read_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(developers: Vec<Developer>, projects: Vec<Project>) -> Self {
        let store = Self::new();
        for developer in developers {
            store.upsert_developer(developer);
        }
        for project in projects {
            store.upsert_project(project);
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upsert_skill(&self, skill: Skill) {
        self.write().skills.insert(skill.id.clone(), skill);
    }

    pub fn skills(&self) -> Vec<Skill> {
        self.read().skills.values().cloned().collect()
    }

    pub fn upsert_developer(&self, developer: Developer) {
        self.write().developers.insert(developer.id.clone(), developer);
    }

    pub fn remove_developer(&self, developer_id: &str) -> Option<Developer> {
        self.write().developers.remove(developer_id)
    }

    pub fn set_developer_availability(&self, developer_id: &str, available: bool) -> bool {
        match self.write().developers.get_mut(developer_id) {
            Some(developer) => {
                developer.available = available;
                true
            }
            None => false,
        }
    }

    pub fn upsert_project(&self, project: Project) {
        self.write().projects.insert(project.id.clone(), project);
    }

    pub fn set_project_status(&self, project_id: &str, status: ProjectStatus) -> bool {
        match self.write().projects.get_mut(project_id) {
            Some(project) => {
                project.status = status;
                true
            }
            None => false,
        }
    }

    /// The next `count` reads fail with a transient error.
    pub fn fail_next_reads(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Delay applied to every developer listing.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of developer listings served so far.
    pub fn snapshot_reads(&self) -> u64 {
        self.snapshot_reads.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if injected {
            Err(StoreError::Transient("injected read failure".into()))
        } else {
            Ok(())
        }
    }

    /// Fixture mirroring the upstream seed: eight skills, ten developers and six
    /// open projects owned by three clients. Project ids are `"1"` to `"6"`.
    pub fn demo() -> Self {
        const SKILLS: [&str; 8] = [
            "node",
            "nestjs",
            "typescript",
            "postgres",
            "docker",
            "aws",
            "redis",
            "graphql",
        ];
        const DEVELOPER_SKILLS: [&[&str]; 10] = [
            &["node", "nestjs", "postgres"],
            &["node", "typescript", "docker"],
            &["nestjs", "graphql", "redis"],
            &["node", "aws"],
            &["typescript", "postgres"],
            &["node", "nestjs", "docker", "aws"],
            &["redis", "postgres"],
            &["graphql", "typescript"],
            &["node", "redis"],
            &["nestjs", "docker"],
        ];
        const PROJECT_SKILLS: [&[&str]; 5] = [
            &["node", "nestjs"],
            &["typescript", "postgres"],
            &["node", "docker"],
            &["graphql", "redis"],
            &["nestjs", "aws"],
        ];

        let store = Self::new();
        let epoch = demo_epoch();

        for name in SKILLS {
            store.upsert_skill(Skill {
                id: name.into(),
                name: name.into(),
            });
        }

        for (i, skills) in DEVELOPER_SKILLS.iter().enumerate() {
            let n = i as u32;
            store.upsert_developer(Developer {
                id: format!("dev-{:02}", i + 1),
                user_id: format!("user-dev-{}", i + 1),
                bio: Some(format!("Developer {}", i + 1)),
                experience_years: (n * 3) % 8 + 1,
                hourly_rate: 20 + n * 5,
                available: true,
                skills: skills.iter().copied().collect(),
                created_at: epoch + chrono::Duration::minutes(i as i64),
            });
        }

        let mut next_id = 1;
        for client in 0..3usize {
            for slot in 0..2usize {
                let skills = PROJECT_SKILLS[(client + slot) % PROJECT_SKILLS.len()];
                store.upsert_project(Project {
                    id: next_id.to_string(),
                    client_id: format!("client-{}", client + 1),
                    title: format!("Project {}-{}", client + 1, slot + 1),
                    description: Some("Sample hiring project".into()),
                    budget: 40 + slot as u32 * 20,
                    status: ProjectStatus::Open,
                    required_skills: skills.iter().copied().collect(),
                    created_at: epoch + chrono::Duration::hours(next_id),
                });
                next_id += 1;
            }
        }

        store
    }
}

fn demo_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn list_available_developers(&self) -> Result<Vec<Developer>, StoreError> {
        self.take_failure()?;

        let delay_ms = self.read_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        self.snapshot_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .read()
            .developers
            .values()
            .filter(|developer| developer.available)
            .cloned()
            .collect())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StoreError> {
        self.take_failure()?;
        Ok(self.read().projects.get(project_id).cloned())
    }

    async fn get_developer_skills(&self, developer_id: &str) -> Result<SkillSet, StoreError> {
        self.take_failure()?;
        Ok(self
            .read()
            .developers
            .get(developer_id)
            .map(|developer| developer.skills.clone())
            .unwrap_or_default())
    }

    async fn get_project_skills(&self, project_id: &str) -> Result<SkillSet, StoreError> {
        self.take_failure()?;
        Ok(self
            .read()
            .projects
            .get(project_id)
            .map(|project| project.required_skills.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_only_available_developers() {
        let store = MemoryStore::demo();
        assert!(store.set_developer_availability("dev-01", false));

        let developers = store.list_available_developers().await.unwrap();

        assert_eq!(developers.len(), 9);
        assert!(developers.iter().all(|d| d.id != "dev-01"));
        assert_eq!(store.snapshot_reads(), 1);
    }

    #[tokio::test]
    async fn resolves_skills_and_projects() {
        let store = MemoryStore::demo();

        let project = store.get_project("1").await.unwrap().unwrap();
        assert_eq!(project.required_skills.as_slice(), ["node", "nestjs"]);
        assert_eq!(
            store.get_project_skills("1").await.unwrap(),
            project.required_skills
        );
        assert_eq!(
            store.get_developer_skills("dev-04").await.unwrap().as_slice(),
            ["node", "aws"]
        );
        assert!(store.get_project("404").await.unwrap().is_none());
        assert!(store.get_developer_skills("nobody").await.unwrap().is_empty());
        assert_eq!(store.skills().len(), 8);
    }

    #[tokio::test]
    async fn injected_failures_are_transient_and_consumed() {
        let store = MemoryStore::demo();
        store.fail_next_reads(2);

        assert!(store.get_project("1").await.unwrap_err().is_transient());
        assert!(store.list_available_developers().await.is_err());
        assert!(store.get_project("1").await.is_ok());
    }

    #[tokio::test]
    async fn mutations_are_visible_to_reads() {
        let store = MemoryStore::demo();
        assert!(store.set_project_status("2", ProjectStatus::Closed));
        assert!(!store.set_project_status("missing", ProjectStatus::Closed));
        assert!(store.remove_developer("dev-10").is_some());

        let project = store.get_project("2").await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Closed);
        assert_eq!(store.list_available_developers().await.unwrap().len(), 9);
    }
}
