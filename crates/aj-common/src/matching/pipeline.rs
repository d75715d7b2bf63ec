use rayon::prelude::*;
use serde_json::Value;

use super::{
    ranking::{RelevanceFilter, rank_by_score},
    scoring::{ScoredPosting, score_posting},
    validation::{PostingError, decode_postings, validate_posting},
};
use crate::{CandidateProfile, JobPosting, MatchPreferences, MatchResult};

pub const DEFAULT_PARALLEL_MIN_POSTINGS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingEngineConfig {
    /// Batches at least this large are scored on the rayon pool. 0 disables it.
    pub parallel_min_postings: usize,
}

impl Default for MatchingEngineConfig {
    fn default() -> Self {
        Self {
            parallel_min_postings: DEFAULT_PARALLEL_MIN_POSTINGS,
        }
    }
}

impl MatchingEngineConfig {
    pub fn sequential() -> Self {
        Self {
            parallel_min_postings: 0,
        }
    }

    fn runs_parallel(&self, postings: usize) -> bool {
        self.parallel_min_postings > 0 && postings >= self.parallel_min_postings
    }
}

/// Ranked matches of one pass plus the postings that could not be scored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub matches: Vec<ScoredPosting>,
    pub rejected: Vec<PostingError>,
}

impl MatchReport {
    pub fn results(&self) -> impl Iterator<Item = &MatchResult> {
        self.matches.iter().map(|scored| &scored.result)
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.matches.into_iter().map(|scored| scored.result).collect()
    }

    /// Applies a relevance cut to the already-ranked matches.
    pub fn filtered(mut self, filter: &RelevanceFilter) -> Self {
        if !filter.is_noop() {
            self.matches = filter.apply(self.matches, |scored| scored.result.score);
        }
        self
    }
}

/// Stateless matching pass: score every posting, then rank.
///
/// Holds configuration only, so a single engine can be shared across threads
/// and requests.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    config: MatchingEngineConfig,
}

impl MatchingEngine {
    pub fn new(config: MatchingEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingEngineConfig {
        &self.config
    }

    /// Scores postings in input order. The map step may run in parallel;
    /// the collected order always matches `postings`.
    pub fn score_all(
        &self,
        profile: &CandidateProfile,
        postings: &[JobPosting],
        preferences: &MatchPreferences,
    ) -> Vec<ScoredPosting> {
        if self.config.runs_parallel(postings.len()) {
            postings
                .par_iter()
                .map(|posting| score_posting(profile, posting, preferences))
                .collect()
        } else {
            postings
                .iter()
                .map(|posting| score_posting(profile, posting, preferences))
                .collect()
        }
    }

    /// Validates, scores and ranks already-typed postings.
    pub fn rank_postings(
        &self,
        profile: &CandidateProfile,
        postings: &[JobPosting],
        preferences: &MatchPreferences,
    ) -> MatchReport {
        let mut rejected = Vec::new();
        let valid: Vec<JobPosting> = postings
            .iter()
            .enumerate()
            .filter_map(|(index, posting)| match validate_posting(index, posting) {
                Ok(()) => Some(posting.clone()),
                Err(err) => {
                    rejected.push(err);
                    None
                }
            })
            .collect();

        self.finish(profile, &valid, preferences, rejected)
    }

    /// Decodes raw JSON postings, then scores and ranks the well-formed ones.
    pub fn run(
        &self,
        profile: &CandidateProfile,
        raw_postings: Vec<Value>,
        preferences: &MatchPreferences,
    ) -> MatchReport {
        let (postings, rejected) = decode_postings(raw_postings);
        self.finish(profile, &postings, preferences, rejected)
    }

    fn finish(
        &self,
        profile: &CandidateProfile,
        postings: &[JobPosting],
        preferences: &MatchPreferences,
        rejected: Vec<PostingError>,
    ) -> MatchReport {
        for err in &rejected {
            tracing::warn!(index = err.index(), error = %err, "skipping malformed posting");
        }

        let mut matches = self.score_all(profile, postings, preferences);
        // single sequential stable sort over the full set
        rank_by_score(&mut matches, |scored| scored.result.score);

        tracing::info!(
            scored = matches.len(),
            rejected = rejected.len(),
            parallel = self.config.runs_parallel(postings.len()),
            "match pass complete"
        );

        MatchReport { matches, rejected }
    }
}

/// Scores and ranks `postings` for `profile`. Malformed postings are left out.
pub fn match_jobs(
    profile: &CandidateProfile,
    postings: &[JobPosting],
    preferences: &MatchPreferences,
) -> Vec<MatchResult> {
    MatchingEngine::default()
        .rank_postings(profile, postings, preferences)
        .into_results()
}
