//! Candidate extraction for fuzzy comparison.
//!
//! Emits every single word plus every contiguous n-gram with n in
//! `[term_word_count - 2, term_word_count + 2]`, per sentence. Windowing
//! around the term length bounds the candidate set to
//! O(sentence length x window) instead of O(n^2) over the page.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// Extracts deduplicated match candidates from page text.
///
/// `term_word_count` is the word count of the search term being matched;
/// the n-gram window is sized around it and clamped to the words actually
/// available in each sentence.
pub fn extract_candidates(text: &str, term_word_count: usize) -> HashSet<String> {
    let mut candidates = HashSet::new();
    if text.trim().is_empty() {
        return candidates;
    }

    let lo = term_word_count.saturating_sub(2).max(2);
    let hi = term_word_count + 2;

    for sentence in text.unicode_sentences() {
        let words: Vec<&str> = sentence.unicode_words().collect();

        for word in &words {
            candidates.insert((*word).to_string());
        }

        for n in lo..=hi.min(words.len()) {
            for window in words.windows(n) {
                candidates.insert(window.join(" "));
            }
        }
    }

    candidates
}
