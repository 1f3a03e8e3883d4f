use tracing::debug;

use super::{
    error::{MatchingError, NotMatchableReason},
    prefilter::{CandidateFilter, MatchConstraints},
    ranking::{rank_candidates, RankedMatch, ScoredCandidate},
    scoring::Scorer,
    snapshot::DeveloperSnapshot,
};
use crate::{Project, ProjectStatus};

/// Filter → Scorer → Ranker over one snapshot. Pure and synchronous; all I/O
/// lives in the service layer.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    filter: CandidateFilter,
    scorer: Scorer,
}

impl MatchingEngine {
    /// Rejects projects that cannot be matched instead of letting the filter
    /// quietly return nothing for them.
    pub fn check_matchable(&self, project: &Project) -> Result<(), MatchingError> {
        let reason = if project.status != ProjectStatus::Open {
            NotMatchableReason::NotOpen(project.status)
        } else if project.required_skills.is_empty() {
            NotMatchableReason::NoRequiredSkills
        } else {
            return Ok(());
        };

        Err(MatchingError::ProjectNotMatchable {
            project_id: project.id.clone(),
            reason,
        })
    }

    /// Full ranking of every eligible developer for `project`.
    pub fn rank_developers_for_project(
        &self,
        project: &Project,
        snapshot: &DeveloperSnapshot,
        constraints: &MatchConstraints,
    ) -> Result<Vec<RankedMatch>, MatchingError> {
        self.check_matchable(project)?;

        let candidates = self.filter.filter_candidates(project, snapshot, constraints);

        let scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let score = self.scorer.score_candidate(project, &candidate, constraints);
                ScoredCandidate {
                    developer_id: candidate.developer.id.clone(),
                    developer_created_at: candidate.developer.created_at,
                    score,
                    matched_skills: candidate.overlap.matched,
                }
            })
            .collect();

        debug!(
            project_id = %project.id,
            generation = snapshot.generation(),
            taken_at = %snapshot.taken_at(),
            population = snapshot.len(),
            candidates = scored.len(),
            "ranked developers"
        );

        Ok(rank_candidates(scored))
    }
}
