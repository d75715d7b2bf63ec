use std::cmp::Ordering;

use crate::MatchResult;

/// Minimum score the background worker treats as worth notifying about.
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.6;

/// Stable descending sort by score. Equal scores keep their input order.
pub fn rank_by_score<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    // slice::sort_by is a stable merge sort
    items.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
}

pub fn rank(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    rank_by_score(&mut results, |result| result.score);
    results
}

/// Post-ranking cut: drop results below `min_score`, then keep the first `limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelevanceFilter {
    pub min_score: Option<f64>,
    pub limit: Option<usize>,
}

impl RelevanceFilter {
    pub fn notification_default() -> Self {
        Self {
            min_score: Some(DEFAULT_RELEVANCE_THRESHOLD),
            limit: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.min_score.is_none() && self.limit.is_none()
    }

    /// Expects `ranked` to already be in ranking order; the order is kept.
    pub fn apply<T>(&self, ranked: Vec<T>, score: impl Fn(&T) -> f64) -> Vec<T> {
        let min_score = self.min_score.unwrap_or(f64::NEG_INFINITY);
        let limit = self.limit.unwrap_or(usize::MAX);

        ranked
            .into_iter()
            .filter(|item| score(item) >= min_score)
            .take(limit)
            .collect()
    }
}
