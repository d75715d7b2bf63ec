use std::collections::HashSet;

pub const REMOTE_MATCH_SCORE: f64 = 1.0;
pub const UNKNOWN_LOCATION_SCORE: f64 = 0.5;
pub const OVERLAP_SCORE: f64 = 0.8;
pub const MISMATCH_SCORE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationEvaluation {
    pub score: f64, // 0.0..=1.0
    pub is_remote_match: bool,
}

impl LocationEvaluation {
    const fn local(score: f64) -> Self {
        Self {
            score,
            is_remote_match: false,
        }
    }
}

pub fn is_remote_posting(posting_location: &str) -> bool {
    posting_location.to_lowercase().contains("remote")
}

/// Lowercased location tokens with commas stripped ("New York, NY" -> {new, york, ny}).
pub fn location_tokens(location: &str) -> HashSet<String> {
    location
        .to_lowercase()
        .replace(',', "")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Location fit, first matching rule wins:
/// 1. remote preference + remote posting -> 1.0 (remote match)
/// 2. no candidate location -> 0.5
/// 3. any shared location token -> 0.8, otherwise 0.2
pub fn score_location(
    candidate_location: Option<&str>,
    posting_location: &str,
    remote_preference: bool,
) -> LocationEvaluation {
    if remote_preference && is_remote_posting(posting_location) {
        return LocationEvaluation {
            score: REMOTE_MATCH_SCORE,
            is_remote_match: true,
        };
    }

    let Some(candidate) = candidate_location.filter(|loc| !loc.is_empty()) else {
        return LocationEvaluation::local(UNKNOWN_LOCATION_SCORE);
    };

    let candidate_tokens = location_tokens(candidate);
    let posting_tokens = location_tokens(posting_location);

    if candidate_tokens.is_disjoint(&posting_tokens) {
        LocationEvaluation::local(MISMATCH_SCORE)
    } else {
        LocationEvaluation::local(OVERLAP_SCORE)
    }
}
