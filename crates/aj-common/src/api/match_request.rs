use serde::Deserialize;
use serde_json::Value;

use crate::matching::RelevanceFilter;
use crate::{CandidateProfile, MatchPreferences};

/// HTTP request for a matching pass.
///
/// Postings stay raw JSON so one malformed posting can be reported without
/// rejecting the whole request.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchJobsRequest {
    pub profile: CandidateProfile,
    #[serde(default)]
    pub postings: Vec<Value>,
    #[serde(default)]
    pub preferences: MatchPreferences,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_breakdown: bool,
}

impl MatchJobsRequest {
    pub fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter {
            min_score: self.min_score,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_default() {
        let request: MatchJobsRequest = serde_json::from_value(json!({
            "profile": { "name": "Jane" },
        }))
        .unwrap();

        assert!(request.postings.is_empty());
        assert_eq!(request.preferences, MatchPreferences::default());
        assert!(request.relevance_filter().is_noop());
        assert!(!request.include_breakdown);
    }

    #[test]
    fn builds_relevance_filter() {
        let request: MatchJobsRequest = serde_json::from_value(json!({
            "profile": {},
            "min_score": 0.6,
            "limit": 5,
        }))
        .unwrap();

        let filter = request.relevance_filter();
        assert_eq!(filter.min_score, Some(0.6));
        assert_eq!(filter.limit, Some(5));
    }
}
