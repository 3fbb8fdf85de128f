//! Matching configuration and search-term validation.

use serde::{Deserialize, Serialize};

use crate::error::{ExpungeError, ExpungeResult};
use crate::text::NormalizeMode;

/// Minimum search-term length after trimming.
pub const MIN_TERM_LENGTH: usize = 3;

/// Default similarity threshold (0-100) for fuzzy matches.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Default threshold above which a fuzzy match is considered high-confidence.
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 95.0;

/// A term to search for, with an optional per-term threshold override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub text: String,
    /// Overrides [`MatchingConfig::threshold`] for this term only.
    #[serde(default)]
    pub threshold_override: Option<f64>,
}

impl SearchTerm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            threshold_override: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold_override = Some(threshold);
        self
    }

    /// Validates the term: non-empty and at least [`MIN_TERM_LENGTH`]
    /// characters after trimming.
    pub fn validate(&self) -> ExpungeResult<()> {
        let trimmed = self.text.trim();
        if trimmed.chars().count() < MIN_TERM_LENGTH {
            return Err(ExpungeError::validation(
                "search_term",
                format!(
                    "'{}' is shorter than {} characters after trimming",
                    trimmed, MIN_TERM_LENGTH
                ),
            ));
        }
        Ok(())
    }

    /// Word count of the trimmed term, used to size the candidate window.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count().max(1)
    }
}

/// Which similarity algorithm drives the fuzzy threshold decision.
///
/// A closed enum rather than a name-to-function map, so the algorithm set
/// is statically exhaustive and cannot fail to resolve at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Ratio,
    PartialRatio,
    TokenSort,
    TokenSet,
    #[default]
    Weighted,
}

impl Algorithm {
    /// Stable name used to key per-algorithm score maps.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Ratio => "ratio",
            Algorithm::PartialRatio => "partial_ratio",
            Algorithm::TokenSort => "token_sort_ratio",
            Algorithm::TokenSet => "token_set_ratio",
            Algorithm::Weighted => "weighted_ratio",
        }
    }

    /// All algorithms, in a stable order.
    pub fn all() -> [Algorithm; 5] {
        [
            Algorithm::Ratio,
            Algorithm::PartialRatio,
            Algorithm::TokenSort,
            Algorithm::TokenSet,
            Algorithm::Weighted,
        ]
    }
}

/// Overall matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactOnly,
    FuzzyOnly,
    #[default]
    Hybrid,
    Phonetic,
}

/// Configuration for a matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub algorithm: Algorithm,
    pub strategy: MatchStrategy,
    /// Similarity threshold (0-100) a fuzzy candidate must reach.
    pub threshold: f64,
    /// Fuzzy matches at or above this score skip human approval.
    pub high_confidence_threshold: f64,
    /// Exact scanning honors case when true.
    pub case_sensitive: bool,
    /// Regex patterns excluding terms from matching. Invalid patterns are
    /// logged and skipped, never fatal.
    pub negative_patterns: Vec<String>,
    /// Normalization applied identically to terms and page text.
    pub normalize_mode: NormalizeMode,
    /// Width of the per-term worker pool.
    pub worker_threads: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            strategy: MatchStrategy::default(),
            threshold: DEFAULT_THRESHOLD,
            high_confidence_threshold: DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
            case_sensitive: false,
            negative_patterns: Vec::new(),
            normalize_mode: NormalizeMode::Basic,
            worker_threads: 4,
        }
    }
}

impl MatchingConfig {
    /// Effective threshold for a term, honoring its override.
    pub fn threshold_for(&self, term: &SearchTerm) -> f64 {
        term.threshold_override.unwrap_or(self.threshold)
    }
}
