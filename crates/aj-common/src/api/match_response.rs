use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MatchResult;
use crate::matching::{MatchReport, PostingError, ScoreBreakdown};

/// One ranked posting as returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchItem {
    #[serde(flatten)]
    pub result: MatchResult,
    /// Raw factor scores (only when requested).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPosting {
    pub index: usize,
    pub error: String,
}

impl From<&PostingError> for RejectedPosting {
    fn from(value: &PostingError) -> Self {
        Self {
            index: value.index(),
            error: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchJobsResponse {
    pub matches: Vec<MatchItem>,
    pub rejected: Vec<RejectedPosting>,
    /// Postings scored before the relevance filter was applied.
    pub scored: usize,
    pub rejected_count: usize,
    pub engine_version: String,
    pub matched_at: DateTime<Utc>,
}

impl MatchJobsResponse {
    /// `scored` is the number of postings ranked before any relevance cut.
    pub fn from_report(
        report: MatchReport,
        scored: usize,
        include_breakdown: bool,
        matched_at: DateTime<Utc>,
    ) -> Self {
        let rejected: Vec<RejectedPosting> =
            report.rejected.iter().map(RejectedPosting::from).collect();

        Self {
            matches: report
                .matches
                .into_iter()
                .map(|scored| MatchItem {
                    result: scored.result,
                    breakdown: include_breakdown.then_some(scored.breakdown),
                })
                .collect(),
            rejected_count: rejected.len(),
            rejected,
            scored,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            matched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobPosting;
    use crate::matching::ScoredPosting;

    fn report() -> MatchReport {
        MatchReport {
            matches: vec![ScoredPosting {
                result: MatchResult {
                    posting: JobPosting {
                        id: "job-1".into(),
                        title: "Rust Engineer".into(),
                        ..JobPosting::default()
                    },
                    score: 0.42,
                    reasons: vec!["Experience match: Rust Engineer".into()],
                },
                breakdown: ScoreBreakdown {
                    skills: 0.0,
                    experience: 0.7,
                    location: 1.0,
                    total: 0.42,
                },
            }],
            rejected: vec![PostingError::MissingField {
                index: 1,
                field: "title",
            }],
        }
    }

    #[test]
    fn omits_breakdown_unless_requested() {
        let response = MatchJobsResponse::from_report(report(), 1, false, Utc::now());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["matches"][0]["id"], "job-1");
        assert_eq!(json["matches"][0]["score"], 0.42);
        assert!(json["matches"][0].get("breakdown").is_none());
        assert_eq!(json["rejected_count"], 1);
        assert_eq!(json["rejected"][0]["index"], 1);
    }

    #[test]
    fn includes_breakdown_when_requested() {
        let response = MatchJobsResponse::from_report(report(), 1, true, Utc::now());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["matches"][0]["breakdown"]["experience"], 0.7);
        assert_eq!(json["scored"], 1);
    }
}
