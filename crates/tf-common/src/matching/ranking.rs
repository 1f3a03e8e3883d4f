use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scoring::MatchScore;
use crate::{DeveloperId, SkillId};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page must be >= 1 (got {0})")]
    Page(i64),
    #[error("limit must be between 1 and {max} (got {0})", max = MAX_LIMIT)]
    Limit(i64),
}

/// Validated 1-based page request. Any positive page is valid; pages past the
/// end of a ranking are served empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u64,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, PageError> {
        let page = u64::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(PageError::Page(page))?;
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .ok_or(PageError::Limit(limit))?;

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> usize {
        usize::try_from(self.page - 1)
            .unwrap_or(usize::MAX)
            .saturating_mul(self.limit as usize)
    }
}

/// A scored candidate before ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub developer_id: DeveloperId,
    pub developer_created_at: DateTime<Utc>,
    pub score: MatchScore,
    pub matched_skills: Vec<SkillId>,
}

/// A candidate with its 1-based position in the full ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub rank: usize,
    pub developer_id: DeveloperId,
    pub developer_created_at: DateTime<Utc>,
    pub score: MatchScore,
    pub matched_skills: Vec<SkillId>,
}

/// Total order: score descending, then earlier registration, then developer id.
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| a.developer_created_at.cmp(&b.developer_created_at))
        .then_with(|| a.developer_id.cmp(&b.developer_id))
}

pub fn rank_candidates(mut scored: Vec<ScoredCandidate>) -> Vec<RankedMatch> {
    scored.sort_by(compare_candidates);

    scored
        .into_iter()
        .enumerate()
        .map(|(pos, candidate)| RankedMatch {
            rank: pos + 1,
            developer_id: candidate.developer_id,
            developer_created_at: candidate.developer_created_at,
            score: candidate.score,
            matched_skills: candidate.matched_skills,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    pub page: u64,
    pub limit: u32,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub data: &'a [T],
    pub meta: PageMeta,
}

/// Slices `[(page-1)*limit, page*limit)`. A page past the end is empty, never an
/// error, and the metadata still describes the full sequence.
pub fn paginate<T>(ranked: &[T], request: PageRequest) -> Page<'_, T> {
    let total = ranked.len();
    let limit = request.limit() as usize;
    let start = request.offset().min(total);
    let end = start.saturating_add(limit).min(total);

    Page {
        data: &ranked[start..end],
        meta: PageMeta {
            total,
            page: request.page(),
            limit: request.limit(),
            pages: total.div_ceil(limit),
        },
    }
}
