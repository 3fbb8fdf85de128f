//! Scoring-factor weights.

use log::warn;
use serde::{Deserialize, Serialize};

const SUM_EPSILON: f64 = 1e-6;

/// Weights for the eight confidence factors. Must sum to 1.0; any other
/// sum is renormalized at construction with a warning, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub fuzzy: f64,
    pub ocr: f64,
    pub pattern_validation: f64,
    pub context_relevance: f64,
    pub text_quality: f64,
    pub position_consistency: f64,
    pub length_appropriateness: f64,
    pub frequency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fuzzy: 0.35,
            ocr: 0.20,
            pattern_validation: 0.15,
            context_relevance: 0.10,
            text_quality: 0.10,
            position_consistency: 0.05,
            length_appropriateness: 0.03,
            frequency: 0.02,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.fuzzy
            + self.ocr
            + self.pattern_validation
            + self.context_relevance
            + self.text_quality
            + self.position_consistency
            + self.length_appropriateness
            + self.frequency
    }

    /// Returns weights scaled so they sum to 1.0. A zero or negative sum
    /// falls back to the defaults.
    pub fn normalized(self) -> Self {
        let sum = self.sum();
        if (sum - 1.0).abs() <= SUM_EPSILON {
            return self;
        }
        if sum <= 0.0 {
            warn!("scoring weights sum to {sum}, falling back to defaults");
            return Self::default();
        }
        warn!("scoring weights sum to {sum}, renormalizing to 1.0");
        Self {
            fuzzy: self.fuzzy / sum,
            ocr: self.ocr / sum,
            pattern_validation: self.pattern_validation / sum,
            context_relevance: self.context_relevance / sum,
            text_quality: self.text_quality / sum,
            position_consistency: self.position_consistency / sum,
            length_appropriateness: self.length_appropriateness / sum,
            frequency: self.frequency / sum,
        }
    }
}
