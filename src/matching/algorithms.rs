//! Similarity algorithms built on `strsim`.
//!
//! All scores are on a 0-100 scale. The threshold decision uses one
//! configured algorithm; every match is still annotated with all five
//! scores for downstream analysis.

use std::collections::BTreeMap;

use crate::matching::Algorithm;

impl Algorithm {
    /// Scores the similarity of `a` and `b` on a 0-100 scale.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Algorithm::Ratio => ratio(a, b),
            Algorithm::PartialRatio => partial_ratio(a, b),
            Algorithm::TokenSort => token_sort_ratio(a, b),
            Algorithm::TokenSet => token_set_ratio(a, b),
            Algorithm::Weighted => weighted_ratio(a, b),
        }
    }
}

/// Scores `a` against `b` under every algorithm, keyed by algorithm name.
pub fn all_scores(a: &str, b: &str) -> BTreeMap<String, f64> {
    Algorithm::all()
        .iter()
        .map(|alg| (alg.name().to_string(), alg.score(a, b)))
        .collect()
}

/// Plain normalized Levenshtein similarity.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best ratio of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = short.chars().count();
    if short_len == 0 {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let long_chars: Vec<char> = long.chars().collect();
    if long_chars.len() <= short_len {
        return ratio(short, long);
    }

    let mut best = 0.0f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(short, &candidate));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Ratio of the two strings with their whitespace tokens sorted.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Set-based ratio: compares the shared-token core against each side's
/// full sorted token string, taking the best outcome.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();

    let mut intersection: Vec<&str> = tokens_a
        .iter()
        .filter(|t| tokens_b.contains(t))
        .copied()
        .collect();
    intersection.sort_unstable();
    intersection.dedup();

    if intersection.is_empty() {
        return token_sort_ratio(a, b);
    }

    let core = intersection.join(" ");
    let full_a = sorted_tokens(a);
    let full_b = sorted_tokens(b);

    ratio(&core, &full_a)
        .max(ratio(&core, &full_b))
        .max(ratio(&full_a, &full_b))
}

/// Weighted blend in the manner of fuzzywuzzy's WRatio: plain ratio for
/// similar-length inputs, discounted partial ratio when lengths diverge,
/// and the token variants throughout.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let base = ratio(a, b);
    let len_a = a.chars().count().max(1) as f64;
    let len_b = b.chars().count().max(1) as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let token_best = token_sort_ratio(a, b).max(token_set_ratio(a, b)) * 0.95;

    if len_ratio > 1.5 {
        let partial_scale = if len_ratio > 8.0 { 0.6 } else { 0.9 };
        base.max(partial_ratio(a, b) * partial_scale).max(token_best)
    } else {
        base.max(token_best)
    }
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
