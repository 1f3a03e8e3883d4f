pub mod api;
pub mod db;
pub mod logging;
pub mod matching;

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type DeveloperId = String;
pub type ProjectId = String;
pub type SkillId = String;

/// Catalog entry for a skill. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
}

/// Duplicate-free set of skill ids that remembers insertion order for display.
///
/// Membership is what matters for matching; two sets with the same members in a
/// different order compare equal.
#[derive(Debug, Clone, Default, Eq, Serialize)]
#[serde(transparent)]
pub struct SkillSet(Vec<SkillId>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a skill. Returns `false` when it was already present.
    pub fn insert(&mut self, skill: impl Into<SkillId>) -> bool {
        let skill = skill.into();
        if self.contains(&skill) {
            return false;
        }
        self.0.push(skill);
        true
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.iter().any(|s| s == skill)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[SkillId] {
        &self.0
    }

    pub fn to_lookup(&self) -> HashSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl PartialEq for SkillSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|skill| other.contains(skill))
    }
}

impl<S: Into<SkillId>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for skill in iter {
            set.insert(skill);
        }
        set
    }
}

impl<'de> Deserialize<'de> for SkillSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<SkillId>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Open,
    InProgress,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "OPEN",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OPEN" => Some(ProjectStatus::Open),
            "IN_PROGRESS" => Some(ProjectStatus::InProgress),
            "CLOSED" => Some(ProjectStatus::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Snapshot records handed to the matching engine by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub id: DeveloperId,
    pub user_id: String,
    #[serde(default)]
    pub bio: Option<String>,
    pub experience_years: u32,
    pub hourly_rate: u32,
    pub available: bool,
    #[serde(default)]
    pub skills: SkillSet,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub budget: u32,
    pub status: ProjectStatus,
    #[serde(default)]
    pub required_skills: SkillSet,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_set_drops_duplicates_and_keeps_order() {
        let set: SkillSet = ["node", "nestjs", "node", "postgres"].into_iter().collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.as_slice(), ["node", "nestjs", "postgres"]);
    }

    #[test]
    fn skill_set_equality_ignores_order() {
        let a: SkillSet = ["node", "nestjs"].into_iter().collect();
        let b: SkillSet = ["nestjs", "node"].into_iter().collect();
        let c: SkillSet = ["node"].into_iter().collect();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn skill_set_deserialization_dedups() {
        let set: SkillSet = serde_json::from_str(r#"["aws","aws","redis"]"#).unwrap();
        assert_eq!(set.as_slice(), ["aws", "redis"]);
    }

    #[test]
    fn project_status_round_trips_wire_names() {
        for status in [
            ProjectStatus::Open,
            ProjectStatus::InProgress,
            ProjectStatus::Closed,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&ProjectStatus::InProgress).unwrap(),
            r#""IN_PROGRESS""#
        );
        assert_eq!(ProjectStatus::parse("open"), None);
    }
}
