use serde::{Deserialize, Serialize};

use crate::matching::prefilter::MatchConstraints;
use crate::matching::ranking::{PageError, PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};

/// Query string of `GET /api/projects/:id/matches`.
///
/// Every field is optional; `page` and `limit` fall back to
/// [`DEFAULT_PAGE`]/[`DEFAULT_LIMIT`] and are validated by [`PageRequest`].
/// Signed integers are accepted so that `page=0` or `limit=-1` surface as a
/// validation error rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    /// Hourly rate ceiling.
    #[serde(default)]
    pub max_rate: Option<u32>,
    /// Only developers holding this skill id.
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub min_experience: Option<u32>,
}

impl MatchQuery {
    pub fn page_request(&self) -> Result<PageRequest, PageError> {
        PageRequest::new(
            self.page.unwrap_or(DEFAULT_PAGE as i64),
            self.limit.unwrap_or(i64::from(DEFAULT_LIMIT)),
        )
    }

    pub fn constraints(&self) -> MatchConstraints {
        MatchConstraints {
            skill: self
                .skill
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            max_rate: self.max_rate,
            min_experience: self.min_experience,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let request = MatchQuery::default().page_request().unwrap();
        assert_eq!((request.page(), request.limit()), (1, 10));
        assert_eq!(MatchQuery::default().constraints(), MatchConstraints::default());
    }

    #[test]
    fn reads_camel_case_fields() {
        let query: MatchQuery = serde_json::from_value(serde_json::json!({
            "page": 2,
            "limit": 5,
            "maxRate": 50,
            "skill": " node ",
            "minExperience": 3
        }))
        .unwrap();

        let constraints = query.constraints();
        assert_eq!(constraints.max_rate, Some(50));
        assert_eq!(constraints.skill.as_deref(), Some("node"));
        assert_eq!(constraints.min_experience, Some(3));
        assert_eq!(query.page_request().unwrap().offset(), 5);
    }

    #[test]
    fn blank_skill_is_no_constraint() {
        let query = MatchQuery {
            skill: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(query.constraints().skill, None);
    }

    #[test]
    fn rejects_non_positive_values() {
        let query = MatchQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.page_request(), Err(PageError::Page(0)));

        let query = MatchQuery {
            limit: Some(-1),
            ..Default::default()
        };
        assert_eq!(query.page_request(), Err(PageError::Limit(-1)));
    }
}
