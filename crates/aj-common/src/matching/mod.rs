pub mod experience;
pub mod location;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod similarity;
pub mod skills;
pub mod validation;
pub mod weights;

pub use pipeline::{
    DEFAULT_PARALLEL_MIN_POSTINGS, MatchReport, MatchingEngine, MatchingEngineConfig, match_jobs,
};
pub use ranking::{DEFAULT_RELEVANCE_THRESHOLD, RelevanceFilter, rank};
pub use scoring::{ScoreBreakdown, ScoredPosting, aggregate, score_posting};
pub use validation::PostingError;
