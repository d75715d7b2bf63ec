use serde::{Deserialize, Serialize};

use super::{
    experience::{ExperienceMatchResult, score_experience},
    location::{LocationEvaluation, score_location},
    skills::{SkillMatchResult, score_skills},
    weights::{LOCATION_REASON_THRESHOLD, MATCH_WEIGHTS, REASON_SKILL_LIMIT},
};
use crate::{CandidateProfile, JobPosting, MatchPreferences, MatchResult};

/// Raw factor scores behind a match. `total` is the rounded overall score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPosting {
    pub result: MatchResult,
    pub breakdown: ScoreBreakdown,
}

/// Round to two decimals, the precision scores are reported with.
///
/// Works on the exact binary value and breaks exact ties to even, so a total
/// of exactly 0.125 reports as 0.12.
pub fn round_score(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// True when the candidate asked for remote work.
pub fn prefers_remote(preferences: &MatchPreferences) -> bool {
    preferences
        .work_mode
        .as_deref()
        .is_some_and(|mode| mode.to_lowercase() == "remote")
}

/// Scores one posting against a profile and explains the result.
pub fn score_posting(
    profile: &CandidateProfile,
    posting: &JobPosting,
    preferences: &MatchPreferences,
) -> ScoredPosting {
    let skills = score_skills(&profile.skills, &posting.description);
    let experience = score_experience(&profile.experience, &posting.title, &posting.description);
    let location = score_location(
        preferences.location.as_deref(),
        &posting.location,
        prefers_remote(preferences),
    );

    let total = round_score(
        MATCH_WEIGHTS
            .combine(skills.match_percentage, experience.score, location.score)
            .clamp(0.0, 1.0),
    );
    let reasons = build_reasons(&skills, &experience, &location, posting, preferences);

    tracing::debug!(
        posting_id = %posting.id,
        score = total,
        skills = skills.match_percentage,
        experience = experience.score,
        location = location.score,
        "scored posting"
    );

    ScoredPosting {
        breakdown: ScoreBreakdown {
            skills: skills.match_percentage,
            experience: experience.score,
            location: location.score,
            total,
        },
        result: MatchResult {
            posting: posting.clone(),
            score: total,
            reasons,
        },
    }
}

/// Same as [`score_posting`] without the factor breakdown.
pub fn aggregate(
    profile: &CandidateProfile,
    posting: &JobPosting,
    preferences: &MatchPreferences,
) -> MatchResult {
    score_posting(profile, posting, preferences).result
}

/// Reasons in fixed order: skills, experience, remote/location, job type.
fn build_reasons(
    skills: &SkillMatchResult,
    experience: &ExperienceMatchResult,
    location: &LocationEvaluation,
    posting: &JobPosting,
    preferences: &MatchPreferences,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if !skills.matched_skills.is_empty() {
        let shown: Vec<&str> = skills
            .matched_skills
            .iter()
            .take(REASON_SKILL_LIMIT)
            .map(String::as_str)
            .collect();
        reasons.push(format!("Skills match: {}", shown.join(", ")));
    }

    if let Some(title) = &experience.best_title {
        reasons.push(format!("Experience match: {title}"));
    }

    if location.is_remote_match {
        reasons.push("Remote work preference match".to_string());
    } else if location.score > LOCATION_REASON_THRESHOLD {
        reasons.push("Location preference match".to_string());
    }

    let wanted = preferences.job_type.as_deref().filter(|v| !v.is_empty());
    let offered = posting.job_type.as_deref().filter(|v| !v.is_empty());
    if let (Some(wanted), Some(offered)) = (wanted, offered) {
        if offered.to_lowercase().contains(&wanted.to_lowercase()) {
            reasons.push(format!("Job type match: {offered}"));
        }
    }

    reasons
}
