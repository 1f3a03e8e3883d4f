use serde::{Deserialize, Serialize};

use crate::matching::ranking::{paginate, PageMeta, PageRequest, RankedMatch};
use crate::matching::scoring::MatchScore;
use crate::{DeveloperId, ProjectId, SkillId};

/// One ranked developer as returned over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultDto {
    pub project_id: ProjectId,
    pub developer_id: DeveloperId,
    /// Weighted total in `[0, 1]`.
    pub score: f64,
    /// Required skills the developer holds, in the project's order.
    pub matched_skills: Vec<SkillId>,
    /// 1-based position in the full ranking, stable across pages.
    pub rank: usize,
    pub score_breakdown: MatchScore,
}

impl MatchResultDto {
    pub fn from_ranked(project_id: &str, ranked: &RankedMatch) -> Self {
        Self {
            project_id: project_id.to_string(),
            developer_id: ranked.developer_id.clone(),
            score: ranked.score.total,
            matched_skills: ranked.matched_skills.clone(),
            rank: ranked.rank,
            score_breakdown: ranked.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPage {
    pub data: Vec<MatchResultDto>,
    pub meta: PageMeta,
}

impl MatchPage {
    pub fn from_ranked(project_id: &str, ranked: &[RankedMatch], request: PageRequest) -> Self {
        let page = paginate(ranked, request);
        Self {
            data: page
                .data
                .iter()
                .map(|entry| MatchResultDto::from_ranked(project_id, entry))
                .collect(),
            meta: page.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ranked(rank: usize, id: &str) -> RankedMatch {
        RankedMatch {
            rank,
            developer_id: id.into(),
            developer_created_at: Utc::now(),
            score: MatchScore {
                total: 0.8,
                skills: 1.0,
                experience: 0.5,
                rate: 0.6,
            },
            matched_skills: vec!["node".into()],
        }
    }

    #[test]
    fn serialises_camel_case_body() {
        let list = vec![ranked(1, "dev-1"), ranked(2, "dev-2"), ranked(3, "dev-3")];
        let page = MatchPage::from_ranked("p1", &list, PageRequest::new(2, 2).unwrap());

        let body = serde_json::to_value(&page).unwrap();
        assert_eq!(body["data"][0]["developerId"], "dev-3");
        assert_eq!(body["data"][0]["projectId"], "p1");
        assert_eq!(body["data"][0]["matchedSkills"][0], "node");
        assert_eq!(body["data"][0]["rank"], 3);
        assert_eq!(body["data"][0]["scoreBreakdown"]["skills"], 1.0);
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["pages"], 2);
    }
}
