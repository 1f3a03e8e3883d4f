use super::{
    skills::{skill_overlap, SkillOverlap},
    snapshot::DeveloperSnapshot,
};
use crate::{Developer, Project, ProjectStatus, SkillId};

/// Optional query constraints applied on top of the project's own requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MatchConstraints {
    /// Only developers holding this skill are considered.
    pub skill: Option<SkillId>,
    /// Hourly rate ceiling; also the reference for the rate score.
    pub max_rate: Option<u32>,
    /// Minimum years of experience.
    pub min_experience: Option<u32>,
}

/// A developer that survived the filter, with the overlap the scorer reuses.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub developer: &'a Developer,
    pub overlap: SkillOverlap,
}

/// Narrows the developer population to those structurally eligible for a
/// project.
///
/// A project with no required skills yields no candidates at all: the
/// zero-overlap rule removes everyone, so a project must declare at least one
/// skill to be matchable. Non-open projects likewise yield nothing; the caller
/// is expected to reject those before filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateFilter;

impl CandidateFilter {
    pub fn new() -> Self {
        Self
    }

    /// Runs the hard filters for one developer and returns the candidate when it
    /// passes.
    pub fn evaluate_candidate<'a>(
        &self,
        project: &Project,
        developer: &'a Developer,
        constraints: &MatchConstraints,
    ) -> Option<Candidate<'a>> {
        if project.status != ProjectStatus::Open {
            return None;
        }

        let overlap = skill_overlap(&developer.skills, &project.required_skills);
        self.admit(developer, overlap, constraints)
    }

    /// Filters a whole snapshot. Output is ordered by developer id.
    pub fn filter_candidates<'a>(
        &self,
        project: &Project,
        snapshot: &'a DeveloperSnapshot,
        constraints: &MatchConstraints,
    ) -> Vec<Candidate<'a>> {
        if project.status != ProjectStatus::Open || project.required_skills.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate<'a>> = match constraints.skill.as_deref() {
            // The skill constraint's posting list is usually the smaller population.
            Some(skill) => snapshot
                .index()
                .developers_with_skill(skill)
                .filter_map(|id| snapshot.developer(id))
                .filter_map(|developer| self.evaluate_candidate(project, developer, constraints))
                .collect(),
            None => snapshot
                .index()
                .overlap_for_project(&project.required_skills)
                .into_iter()
                .filter_map(|(id, overlap)| {
                    let developer = snapshot.developer(id)?;
                    self.admit(developer, overlap, constraints)
                })
                .collect(),
        };

        candidates.sort_by(|a, b| a.developer.id.cmp(&b.developer.id));
        candidates
    }

    fn admit<'a>(
        &self,
        developer: &'a Developer,
        overlap: SkillOverlap,
        constraints: &MatchConstraints,
    ) -> Option<Candidate<'a>> {
        if !developer.available || overlap.is_empty() {
            return None;
        }

        if let Some(max_rate) = constraints.max_rate {
            if developer.hourly_rate > max_rate {
                return None;
            }
        }

        if let Some(min_experience) = constraints.min_experience {
            if developer.experience_years < min_experience {
                return None;
            }
        }

        if let Some(skill) = constraints.skill.as_deref() {
            if !developer.skills.contains(skill) {
                return None;
            }
        }

        Some(Candidate { developer, overlap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkillSet;
    use chrono::Utc;

    fn base_project() -> Project {
        Project {
            id: "p1".into(),
            client_id: "c1".into(),
            title: "API rewrite".into(),
            description: None,
            budget: 60,
            status: ProjectStatus::Open,
            required_skills: ["node", "nestjs"].into_iter().collect(),
            created_at: Utc::now(),
        }
    }

    fn developer(id: &str, skills: &[&str], rate: u32, experience: u32) -> Developer {
        Developer {
            id: id.into(),
            user_id: format!("user-{id}"),
            bio: None,
            experience_years: experience,
            hourly_rate: rate,
            available: true,
            skills: skills.iter().copied().collect::<SkillSet>(),
            created_at: Utc::now(),
        }
    }

    fn ids(candidates: &[Candidate<'_>]) -> Vec<String> {
        candidates.iter().map(|c| c.developer.id.clone()).collect()
    }

    #[test]
    fn excludes_unavailable_and_zero_overlap() {
        let mut busy = developer("busy", &["node", "nestjs"], 30, 5);
        busy.available = false;
        let snapshot = DeveloperSnapshot::new(
            1,
            vec![
                busy,
                developer("a", &["node"], 30, 5),
                developer("none", &["graphql"], 10, 9),
            ],
        );

        let result =
            CandidateFilter::new().filter_candidates(&base_project(), &snapshot, &Default::default());

        assert_eq!(ids(&result), vec!["a".to_string()]);
        assert_eq!(result[0].overlap.count, 1);
    }

    #[test]
    fn applies_rate_ceiling_and_min_experience() {
        let snapshot = DeveloperSnapshot::new(
            1,
            vec![
                developer("cheap-junior", &["node"], 20, 1),
                developer("pricey", &["node"], 80, 6),
                developer("fit", &["node", "nestjs"], 50, 4),
            ],
        );
        let constraints = MatchConstraints {
            max_rate: Some(50),
            min_experience: Some(2),
            ..Default::default()
        };

        let result = CandidateFilter::new().filter_candidates(&base_project(), &snapshot, &constraints);

        assert_eq!(ids(&result), vec!["fit".to_string()]);
    }

    #[test]
    fn rate_equal_to_ceiling_is_kept() {
        let dev = developer("edge", &["node"], 50, 1);
        let constraints = MatchConstraints {
            max_rate: Some(50),
            ..Default::default()
        };

        assert!(CandidateFilter::new()
            .evaluate_candidate(&base_project(), &dev, &constraints)
            .is_some());
    }

    #[test]
    fn skill_constraint_narrows_population() {
        let snapshot = DeveloperSnapshot::new(
            1,
            vec![
                developer("a", &["node", "docker"], 30, 3),
                developer("b", &["node"], 30, 3),
                developer("c", &["docker"], 30, 3),
            ],
        );
        let constraints = MatchConstraints {
            skill: Some("docker".into()),
            ..Default::default()
        };

        let result = CandidateFilter::new().filter_candidates(&base_project(), &snapshot, &constraints);

        // "c" holds docker but none of the required skills.
        assert_eq!(ids(&result), vec!["a".to_string()]);
    }

    #[test]
    fn project_without_required_skills_has_no_candidates() {
        let mut project = base_project();
        project.required_skills = SkillSet::new();
        let snapshot = DeveloperSnapshot::new(1, vec![developer("a", &["node"], 30, 3)]);

        let result = CandidateFilter::new().filter_candidates(&project, &snapshot, &Default::default());
        assert!(result.is_empty());
    }

    #[test]
    fn closed_project_has_no_candidates() {
        let mut project = base_project();
        project.status = ProjectStatus::Closed;
        let dev = developer("a", &["node", "nestjs"], 30, 3);
        let snapshot = DeveloperSnapshot::new(1, vec![dev.clone()]);

        let filter = CandidateFilter::new();
        assert!(filter.filter_candidates(&project, &snapshot, &Default::default()).is_empty());
        assert!(filter.evaluate_candidate(&project, &dev, &Default::default()).is_none());
    }

    #[test]
    fn output_is_sorted_by_developer_id() {
        let snapshot = DeveloperSnapshot::new(
            1,
            vec![
                developer("z", &["node"], 30, 3),
                developer("m", &["nestjs"], 30, 3),
                developer("a", &["node", "nestjs"], 30, 3),
            ],
        );

        let result =
            CandidateFilter::new().filter_candidates(&base_project(), &snapshot, &Default::default());
        assert_eq!(ids(&result), vec!["a".to_string(), "m".to_string(), "z".to_string()]);
    }
}
