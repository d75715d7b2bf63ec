/// Factor weights for the overall match score.
/// Skills dominate, then experience, then location.
pub const MATCH_WEIGHTS: Weights = Weights {
    skills: 0.5,
    experience: 0.3,
    location: 0.2,
};

/// Title similarity counts more than description overlap when comparing a
/// prior role against a posting.
pub const EXPERIENCE_TITLE_WEIGHT: f64 = 0.7;
pub const EXPERIENCE_DESCRIPTION_WEIGHT: f64 = 0.3;

/// Location scores above this earn a "Location preference match" reason.
pub const LOCATION_REASON_THRESHOLD: f64 = 0.7;

/// Number of matched skills cited in the skills reason.
pub const REASON_SKILL_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.location
    }

    pub fn combine(&self, skills: f64, experience: f64, location: f64) -> f64 {
        skills * self.skills + experience * self.experience + location * self.location
    }
}
