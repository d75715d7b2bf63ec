use std::collections::HashSet;
use std::hash::Hash;

/// Lowercased whitespace tokens of `text`, duplicates collapsed.
pub fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Jaccard coefficient of two sets. Empty on either side yields 0.0.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    intersection as f64 / (a.len() + b.len() - intersection) as f64
}

/// Token-set similarity of two free-text strings in `0.0..=1.0`.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(&token_set(a), &token_set(b))
}
