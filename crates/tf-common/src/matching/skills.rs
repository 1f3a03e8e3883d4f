use std::collections::{BTreeSet, HashMap};

use crate::{Developer, DeveloperId, SkillId, SkillSet};

/// Intersection of a developer's skills with a project's required skills.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillOverlap {
    pub count: usize,
    /// Matched skill ids in the project's required-skill order.
    pub matched: Vec<SkillId>,
}

impl SkillOverlap {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn push(&mut self, skill: &SkillId) {
        self.matched.push(skill.clone());
        self.count += 1;
    }
}

/// Plain set intersection; `count <= min(|developer|, |project|)` holds because
/// both sides are duplicate-free.
pub fn skill_overlap(developer_skills: &SkillSet, project_skills: &SkillSet) -> SkillOverlap {
    let held = developer_skills.to_lookup();
    let mut overlap = SkillOverlap::default();

    for skill in project_skills.iter() {
        if held.contains(skill.as_str()) {
            overlap.push(skill);
        }
    }

    overlap
}

/// Reverse index skill → developers, built once per developer snapshot.
///
/// Overlap for a project is computed by walking the posting list of each
/// required skill, so the cost scales with the number of (skill, holder) pairs
/// actually touched rather than with `developers × skills`.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalogIndex {
    generation: u64,
    developer_skills: HashMap<DeveloperId, SkillSet>,
    skill_holders: HashMap<SkillId, BTreeSet<DeveloperId>>,
}

impl SkillCatalogIndex {
    pub fn build<'a>(generation: u64, developers: impl IntoIterator<Item = &'a Developer>) -> Self {
        let mut index = Self {
            generation,
            ..Self::default()
        };
        for developer in developers {
            index.insert_developer(developer);
        }
        index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn developer_count(&self) -> usize {
        self.developer_skills.len()
    }

    /// Adds or replaces a developer's skill assignment.
    pub fn insert_developer(&mut self, developer: &Developer) {
        self.remove_developer(&developer.id);

        for skill in developer.skills.iter() {
            self.skill_holders
                .entry(skill.clone())
                .or_default()
                .insert(developer.id.clone());
        }
        self.developer_skills
            .insert(developer.id.clone(), developer.skills.clone());
    }

    pub fn remove_developer(&mut self, developer_id: &str) -> bool {
        let Some(previous) = self.developer_skills.remove(developer_id) else {
            return false;
        };

        for skill in previous.iter() {
            if let Some(holders) = self.skill_holders.get_mut(skill) {
                holders.remove(developer_id);
                if holders.is_empty() {
                    self.skill_holders.remove(skill);
                }
            }
        }
        true
    }

    pub fn skills_of(&self, developer_id: &str) -> Option<&SkillSet> {
        self.developer_skills.get(developer_id)
    }

    /// Developers holding `skill`, in ascending id order.
    pub fn developers_with_skill<'a>(
        &'a self,
        skill: &str,
    ) -> impl Iterator<Item = &'a DeveloperId> + 'a {
        self.skill_holders
            .get(skill)
            .into_iter()
            .flat_map(|holders| holders.iter())
    }

    /// Overlap with `required` for every developer holding at least one of its
    /// skills. Developers with zero overlap are absent from the map.
    pub fn overlap_for_project<'a>(
        &'a self,
        required: &SkillSet,
    ) -> HashMap<&'a str, SkillOverlap> {
        let mut overlaps: HashMap<&'a str, SkillOverlap> = HashMap::new();

        for skill in required.iter() {
            for developer_id in self.developers_with_skill(skill) {
                overlaps
                    .entry(developer_id.as_str())
                    .or_default()
                    .push(skill);
            }
        }

        overlaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn skills(ids: &[&str]) -> SkillSet {
        ids.iter().copied().collect()
    }

    fn developer(id: &str, ids: &[&str]) -> Developer {
        Developer {
            id: id.into(),
            user_id: format!("user-{id}"),
            bio: None,
            experience_years: 3,
            hourly_rate: 30,
            available: true,
            skills: skills(ids),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn overlap_follows_project_order() {
        let overlap = skill_overlap(
            &skills(&["postgres", "nestjs", "node"]),
            &skills(&["node", "nestjs", "graphql"]),
        );

        assert_eq!(overlap.count, 2);
        assert_eq!(overlap.matched, vec!["node".to_string(), "nestjs".to_string()]);
    }

    #[test]
    fn overlap_count_is_bounded_by_smaller_set() {
        let dev = skills(&["node"]);
        let project = skills(&["node", "nestjs", "aws"]);

        let overlap = skill_overlap(&dev, &project);
        assert!(overlap.count <= dev.len().min(project.len()));
        assert_eq!(overlap.count, 1);
    }

    #[test]
    fn empty_project_skills_never_overlap() {
        let overlap = skill_overlap(&skills(&["node"]), &SkillSet::new());
        assert!(overlap.is_empty());
        assert!(overlap.matched.is_empty());
    }

    #[test]
    fn index_answers_holders_in_id_order() {
        let devs = [
            developer("b", &["node", "redis"]),
            developer("a", &["node"]),
            developer("c", &["redis"]),
        ];
        let index = SkillCatalogIndex::build(7, &devs);

        let holders: Vec<_> = index.developers_with_skill("node").cloned().collect();
        assert_eq!(holders, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(index.developers_with_skill("graphql").count(), 0);
        assert_eq!(index.generation(), 7);
        assert_eq!(index.developer_count(), 3);
    }

    #[test]
    fn index_overlap_matches_direct_intersection() {
        let devs = [
            developer("a", &["node", "nestjs", "postgres"]),
            developer("b", &["node"]),
            developer("c", &["graphql"]),
        ];
        let index = SkillCatalogIndex::build(1, &devs);
        let required = skills(&["node", "nestjs"]);

        let overlaps = index.overlap_for_project(&required);

        assert_eq!(overlaps.len(), 2);
        assert!(!overlaps.contains_key("c"));
        for dev in &devs[..2] {
            assert_eq!(overlaps[dev.id.as_str()], skill_overlap(&dev.skills, &required));
        }
    }

    #[test]
    fn reinserting_developer_replaces_postings() {
        let mut index = SkillCatalogIndex::build(1, &[developer("a", &["node", "aws"])]);

        index.insert_developer(&developer("a", &["redis"]));

        assert_eq!(index.developers_with_skill("node").count(), 0);
        assert_eq!(index.developers_with_skill("redis").count(), 1);
        assert_eq!(index.skills_of("a"), Some(&skills(&["redis"])));

        assert!(index.remove_developer("a"));
        assert!(!index.remove_developer("a"));
        assert_eq!(index.developer_count(), 0);
    }
}
