use aj_common::matching::similarity::text_similarity;
use aj_common::matching::{aggregate, rank};
use aj_common::{
    CandidateExperienceEntry, CandidateProfile, CandidateSkill, JobPosting, MatchPreferences,
    MatchResult,
};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z]{1,8}", 0..8).prop_map(|w| w.join(" "))
}

fn profile_strategy() -> impl Strategy<Value = CandidateProfile> {
    (
        prop::collection::vec("[a-zA-Z+#]{1,10}", 0..6),
        prop::collection::vec((words(), prop::option::of(words())), 0..4),
    )
        .prop_map(|(skills, experience)| CandidateProfile {
            skills: skills
                .into_iter()
                .map(|name| CandidateSkill {
                    name,
                    ..CandidateSkill::default()
                })
                .collect(),
            experience: experience
                .into_iter()
                .map(|(title, description)| CandidateExperienceEntry {
                    title,
                    company: String::new(),
                    description,
                })
                .collect(),
            ..CandidateProfile::default()
        })
}

fn posting_strategy() -> impl Strategy<Value = JobPosting> {
    (words(), words(), words(), prop::option::of(words())).prop_map(
        |(title, location, description, job_type)| JobPosting {
            id: "job".into(),
            title,
            location,
            description,
            job_type,
            ..JobPosting::default()
        },
    )
}

fn preferences_strategy() -> impl Strategy<Value = MatchPreferences> {
    (
        prop::option::of(words()),
        prop::option::of(prop_oneof![Just("remote".to_string()), words()]),
        prop::option::of(words()),
    )
        .prop_map(|(location, work_mode, job_type)| MatchPreferences {
            location,
            work_mode,
            job_type,
        })
}

proptest! {
    #[test]
    fn similarity_is_symmetric(a in ".{0,60}", b in ".{0,60}") {
        prop_assert_eq!(text_similarity(&a, &b), text_similarity(&b, &a));
    }

    #[test]
    fn similarity_with_self_is_one(a in "[a-z]{1,6}( [a-z]{1,6}){0,5}") {
        prop_assert_eq!(text_similarity(&a, &a), 1.0);
    }

    #[test]
    fn similarity_is_bounded(a in ".{0,60}", b in ".{0,60}") {
        let sim = text_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&sim));
    }

    #[test]
    fn score_is_bounded_and_rounded(
        profile in profile_strategy(),
        posting in posting_strategy(),
        prefs in preferences_strategy(),
    ) {
        let result = aggregate(&profile, &posting, &prefs);
        prop_assert!((0.0..=1.0).contains(&result.score));
        prop_assert!(((result.score * 100.0).round() - result.score * 100.0).abs() < 1e-6);
        prop_assert!(result.reasons.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn empty_skills_never_emit_skill_reason(
        posting in posting_strategy(),
        prefs in preferences_strategy(),
    ) {
        let result = aggregate(&CandidateProfile::default(), &posting, &prefs);
        prop_assert!(result.reasons.iter().all(|r| !r.starts_with("Skills match")));
        prop_assert!(result.reasons.iter().all(|r| !r.starts_with("Experience match")));
    }

    #[test]
    fn ranking_is_stable(scores in prop::collection::vec(0u8..5, 0..40)) {
        let input: Vec<MatchResult> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| MatchResult {
                posting: JobPosting {
                    id: i.to_string(),
                    title: "t".into(),
                    ..JobPosting::default()
                },
                score: f64::from(*s) / 4.0,
                reasons: Vec::new(),
            })
            .collect();

        let ranked = rank(input);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                let a: usize = pair[0].posting.id.parse().unwrap();
                let b: usize = pair[1].posting.id.parse().unwrap();
                prop_assert!(a < b);
            }
        }
    }
}
