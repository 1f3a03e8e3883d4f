use serde::{Deserialize, Serialize};

use super::{
    prefilter::{Candidate, MatchConstraints},
    skills::SkillOverlap,
    weights::MATCH_WEIGHTS,
};
use crate::{Developer, Project};

/// Years of experience beyond which the experience score stops growing.
pub const EXPERIENCE_CAP_YEARS: u32 = 10;
/// Rate score floor: the most expensive admissible developer still keeps half.
pub const MIN_RATE_SCORE: f64 = 0.5;

/// Per-component scores and the weighted total, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub total: f64,
    pub skills: f64,
    pub experience: f64,
    pub rate: f64,
}

/// Pure scoring of (project, developer, constraints) with the fixed
/// [`MATCH_WEIGHTS`]. Availability is a filter concern and never enters the score.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer;

impl Scorer {
    pub fn score_candidate(
        &self,
        project: &Project,
        candidate: &Candidate<'_>,
        constraints: &MatchConstraints,
    ) -> MatchScore {
        self.score(project, candidate.developer, &candidate.overlap, constraints)
    }

    pub fn score(
        &self,
        project: &Project,
        developer: &Developer,
        overlap: &SkillOverlap,
        constraints: &MatchConstraints,
    ) -> MatchScore {
        let skills = score_skills(overlap.count, project.required_skills.len());
        let experience = score_experience(developer.experience_years);
        let rate = score_rate(developer.hourly_rate, constraints.max_rate);

        let total = MATCH_WEIGHTS.skills * skills
            + MATCH_WEIGHTS.experience * experience
            + MATCH_WEIGHTS.rate * rate;

        MatchScore {
            total,
            skills,
            experience,
            rate,
        }
    }
}

/// `matched / required`; zero when nothing is required.
pub fn score_skills(matched: usize, required: usize) -> f64 {
    if required == 0 {
        return 0.0;
    }
    matched.min(required) as f64 / required as f64
}

pub fn score_experience(years: u32) -> f64 {
    years.min(EXPERIENCE_CAP_YEARS) as f64 / EXPERIENCE_CAP_YEARS as f64
}

/// Cheaper developers score higher, clamped to `[0.5, 1.0]`. Without a rate
/// ceiling every developer gets the full rate score; a zero ceiling does too
/// because only zero-rate developers pass the filter then.
pub fn score_rate(hourly_rate: u32, max_rate: Option<u32>) -> f64 {
    match max_rate {
        None | Some(0) => 1.0,
        Some(max_rate) => {
            let ratio = hourly_rate as f64 / max_rate as f64;
            (1.0 - ratio * 0.5).clamp(MIN_RATE_SCORE, 1.0)
        }
    }
}
