use crate::CandidateSkill;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillMatchResult {
    pub match_percentage: f64,
    /// Skill names found in the posting, in profile order and original case.
    pub matched_skills: Vec<String>,
}

/// Fraction of the candidate's skills whose name appears in the posting text.
///
/// Matching is a literal, case-insensitive substring test on `name`; a skill
/// spelled differently in the posting ("C plus plus" for "C++") is not found.
/// An empty name is contained in every posting and so always matches.
pub fn score_skills(skills: &[CandidateSkill], posting_text: &str) -> SkillMatchResult {
    if skills.is_empty() {
        return SkillMatchResult::default();
    }

    let haystack = posting_text.to_lowercase();
    let matched_skills: Vec<String> = skills
        .iter()
        .filter(|skill| haystack.contains(&skill.name.to_lowercase()))
        .map(|skill| skill.name.clone())
        .collect();

    SkillMatchResult {
        match_percentage: matched_skills.len() as f64 / skills.len() as f64,
        matched_skills,
    }
}
