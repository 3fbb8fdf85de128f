//! Text normalization and candidate extraction.
//!
//! Pure function layer feeding the matching engine: Unicode/whitespace/case
//! normalization, tokenization, stop-word filtering, stemming, and bounded
//! n-gram candidate extraction.

pub mod candidates;
pub mod normalize;

pub use candidates::extract_candidates;
pub use normalize::{NormalizeMode, Normalizer, NormalizerConfig};

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Common English stop words, shared by the linguistic normalizer and the
/// frequency scoring factor.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had",
        "has", "have", "he", "her", "his", "i", "in", "is", "it", "its", "no", "not", "of", "on",
        "or", "she", "that", "the", "their", "them", "then", "there", "these", "they", "this",
        "to", "was", "we", "were", "which", "will", "with", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Returns true when `word` is a common stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word.to_lowercase().as_str())
}
