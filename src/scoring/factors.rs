//! The eight confidence factors.
//!
//! Each factor is computed independently on a 0-1 scale and degrades to a
//! neutral value when its underlying signal is absent, so a missing signal
//! never fails the whole score.

use crate::matching::{Match, MatchType};
use crate::text::is_stop_word;

/// Match-algorithm confidence. Re-weights across all recorded algorithm
/// scores when several are present, otherwise uses the raw confidence.
pub fn fuzzy_confidence(m: &Match) -> f64 {
    if m.algorithm_scores.is_empty() {
        return (m.raw_confidence / 100.0).clamp(0.0, 1.0);
    }
    // Best two algorithms dominate; a single outlier low score should not
    // sink an otherwise strong match.
    let mut scores: Vec<f64> = m.algorithm_scores.values().copied().collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top: Vec<f64> = scores.into_iter().take(2).collect();
    let avg = top.iter().sum::<f64>() / top.len() as f64;
    (avg / 100.0).clamp(0.0, 1.0)
}

/// OCR confidence. Text-layer matches carry no OCR uncertainty.
pub fn ocr_confidence(m: &Match) -> f64 {
    match m.ocr_confidence {
        Some(c) => c.clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// Pattern validation: only meaningful for validated pattern matches.
pub fn pattern_validation(m: &Match) -> f64 {
    match m.pattern_validated {
        Some(true) => 1.0,
        Some(false) => 0.2,
        None => 0.7,
    }
}

/// Context relevance heuristic around a 0.5 base.
pub fn context_relevance(m: &Match) -> f64 {
    if m.context.is_empty() {
        return 0.5;
    }

    let mut score: f64 = 0.5;

    if m.context.chars().count() >= 20 {
        score += 0.1;
    }

    // Related terms near the match: context words similar to term words.
    let term_words: Vec<String> = m.term.split_whitespace().map(str::to_lowercase).collect();
    let context_words: Vec<String> = m
        .context
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let mut related = 0usize;
    for cw in &context_words {
        for tw in &term_words {
            if cw != tw && strsim::normalized_levenshtein(cw, tw) > 0.7 {
                related += 1;
                break;
            }
        }
    }
    score += (related as f64 * 0.05).min(0.2);

    // Structural indicators suggest labeled fields.
    if m.context.contains(':') || m.context.contains('=') || m.context.contains('|') {
        score += 0.1;
    }

    // Highly repetitive context is a weak signal.
    if !context_words.is_empty() {
        let mut unique = context_words.clone();
        unique.sort_unstable();
        unique.dedup();
        if (unique.len() as f64) < context_words.len() as f64 * 0.5 {
            score -= 0.1;
        }
    }

    score.clamp(0.0, 1.0)
}

/// Average of character-confidence, coherence, and completeness of the
/// matched text.
pub fn text_quality(m: &Match) -> f64 {
    let text = m.matched_text.trim();
    if text.is_empty() {
        return 0.5;
    }

    let chars: Vec<char> = text.chars().collect();
    let clean = chars
        .iter()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .count() as f64
        / chars.len() as f64;

    // Coherence: words should contain vowels and not degenerate runs.
    let words: Vec<&str> = text.split_whitespace().collect();
    let coherent = words
        .iter()
        .filter(|w| {
            let has_vowel = w.chars().any(|c| "aeiouAEIOU".contains(c));
            let longest_run = longest_char_run(w);
            has_vowel && longest_run <= 3
        })
        .count() as f64
        / words.len().max(1) as f64;

    // Completeness: the span should not start or end mid-word.
    let completeness = {
        let starts_clean = chars.first().map(|c| c.is_alphanumeric()).unwrap_or(false);
        let ends_clean = chars.last().map(|c| c.is_alphanumeric()).unwrap_or(false);
        match (starts_clean, ends_clean) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.7,
            (false, false) => 0.4,
        }
    };

    (clean + coherent + completeness) / 3.0
}

/// Position consistency between the reported span and the matched text.
pub fn position_consistency(m: &Match) -> f64 {
    if m.end <= m.start {
        return 0.2;
    }
    let span = m.span_len() as i64;
    let text_len = m.matched_text.len() as i64;
    if (span - text_len).abs() <= 2 {
        0.9
    } else {
        0.5
    }
}

/// Length ratio between matched text and search term; [0.8, 1.5] scores
/// highest, degrading outward.
pub fn length_appropriateness(m: &Match) -> f64 {
    let term_len = m.term.chars().count();
    if term_len == 0 {
        return 0.5;
    }
    let ratio = m.matched_text.chars().count() as f64 / term_len as f64;
    if (0.8..=1.5).contains(&ratio) {
        0.9
    } else if (0.5..=2.5).contains(&ratio) {
        0.6
    } else {
        0.3
    }
}

/// Frequency heuristic: exact matches score well, common stop words are
/// penalized, everything else sits at a baseline.
pub fn frequency(m: &Match) -> f64 {
    if m.match_type == MatchType::Exact {
        return 0.8;
    }
    let baseline: f64 = 0.6;
    if m.matched_text
        .split_whitespace()
        .all(|w| is_stop_word(w))
    {
        baseline - 0.2
    } else {
        baseline
    }
}

fn longest_char_run(word: &str) -> usize {
    let mut longest = 0usize;
    let mut run = 0usize;
    let mut prev: Option<char> = None;
    for c in word.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        longest = longest.max(run);
    }
    longest
}
