//! Phonetic matching via Soundex and Metaphone codes.
//!
//! A candidate matching the term on either code is a phonetic match at
//! confidence 85; matching on both codes raises it to 95.

use rphonetic::{Encoder, Metaphone, Soundex};

/// Confidence assigned when one phonetic code agrees.
pub const SINGLE_CODE_CONFIDENCE: f64 = 85.0;

/// Confidence assigned when both phonetic codes agree.
pub const BOTH_CODES_CONFIDENCE: f64 = 95.0;

/// Phonetic encoder pair shared by a matching run.
pub struct PhoneticMatcher {
    soundex: Soundex,
    metaphone: Metaphone,
}

impl Default for PhoneticMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneticMatcher {
    pub fn new() -> Self {
        Self {
            soundex: Soundex::default(),
            metaphone: Metaphone::default(),
        }
    }

    /// Returns the phonetic confidence for `candidate` against `term`, or
    /// `None` when neither code agrees.
    pub fn confidence(&self, term: &str, candidate: &str) -> Option<f64> {
        if term.is_empty() || candidate.is_empty() {
            return None;
        }

        let soundex_hit = self.codes_match(&self.soundex.encode(term), &self.soundex.encode(candidate));
        let metaphone_hit =
            self.codes_match(&self.metaphone.encode(term), &self.metaphone.encode(candidate));

        match (soundex_hit, metaphone_hit) {
            (true, true) => Some(BOTH_CODES_CONFIDENCE),
            (true, false) | (false, true) => Some(SINGLE_CODE_CONFIDENCE),
            (false, false) => None,
        }
    }

    fn codes_match(&self, a: &str, b: &str) -> bool {
        !a.is_empty() && a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homophones_match() {
        let matcher = PhoneticMatcher::new();
        let confidence = matcher.confidence("smith", "smyth");
        assert!(confidence.is_some());
        assert!(confidence.unwrap() >= SINGLE_CODE_CONFIDENCE);
    }

    #[test]
    fn test_identical_words_match_on_both_codes() {
        let matcher = PhoneticMatcher::new();
        assert_eq!(
            matcher.confidence("johnson", "johnson"),
            Some(BOTH_CODES_CONFIDENCE)
        );
    }

    #[test]
    fn test_unrelated_words_do_not_match() {
        let matcher = PhoneticMatcher::new();
        assert_eq!(matcher.confidence("smith", "viridian"), None);
    }

    #[test]
    fn test_empty_input_yields_none() {
        let matcher = PhoneticMatcher::new();
        assert_eq!(matcher.confidence("", "smith"), None);
        assert_eq!(matcher.confidence("smith", ""), None);
    }
}
