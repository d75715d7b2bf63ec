use super::{
    similarity::text_similarity,
    weights::{EXPERIENCE_DESCRIPTION_WEIGHT, EXPERIENCE_TITLE_WEIGHT},
};
use crate::CandidateExperienceEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceMatchResult {
    pub score: f64,
    /// Title of the best-scoring entry. `None` only when there are no entries.
    pub best_title: Option<String>,
}

/// Similarity of one prior role to a posting.
pub fn score_entry(
    entry: &CandidateExperienceEntry,
    posting_title: &str,
    posting_description: &str,
) -> f64 {
    let title_sim = text_similarity(&entry.title, posting_title);
    let desc_sim = text_similarity(
        entry.description.as_deref().unwrap_or(""),
        posting_description,
    );

    EXPERIENCE_TITLE_WEIGHT * title_sim + EXPERIENCE_DESCRIPTION_WEIGHT * desc_sim
}

/// Best-of comparison over all prior roles.
///
/// The first entry seeds the maximum; later entries replace it only with a
/// strictly higher score, so ties keep the earliest role.
pub fn score_experience(
    entries: &[CandidateExperienceEntry],
    posting_title: &str,
    posting_description: &str,
) -> ExperienceMatchResult {
    let mut best: Option<(f64, &CandidateExperienceEntry)> = None;

    for entry in entries {
        let score = score_entry(entry, posting_title, posting_description);
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, entry)),
        }
    }

    match best {
        Some((score, entry)) => ExperienceMatchResult {
            score,
            best_title: Some(entry.title.clone()),
        },
        None => ExperienceMatchResult::default(),
    }
}
