//! Confidence scoring: combines per-match signals into one calibrated
//! confidence value and a discrete level.
//!
//! Scoring is stateless per match and safe to run in parallel; the shared
//! running statistics use atomics and never block the scoring path.

pub mod calibration;
pub mod factors;
pub mod metrics;
pub mod weights;

pub use calibration::{CalibrationCurve, MIN_CALIBRATION_SAMPLES};
pub use metrics::{MetricsSnapshot, ScoringMetrics};
pub use weights::ScoringWeights;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::matching::Match;

/// Discrete confidence bucket derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    /// Deterministic bucketing of a [0,1] confidence score.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Self::VeryHigh
        } else if score >= 0.85 {
            Self::High
        } else if score >= 0.70 {
            Self::Medium
        } else if score >= 0.50 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }
}

/// Every factor's raw value plus the derivation of the final confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub fuzzy: f64,
    pub ocr: f64,
    pub pattern_validation: f64,
    pub context_relevance: f64,
    pub text_quality: f64,
    pub position_consistency: f64,
    pub length_appropriateness: f64,
    pub frequency: f64,
    /// Weighted sum before calibration.
    pub weighted_sum: f64,
    /// Weighted sum after the calibration curve, when one is active.
    pub calibrated: f64,
    /// `calibrated` clamped to [0, 1].
    pub final_confidence: f64,
    pub level: ConfidenceLevel,
}

/// The confidence scorer. Weights are renormalized once, at construction.
pub struct ConfidenceScorer {
    weights: ScoringWeights,
    metrics: Arc<ScoringMetrics>,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

impl ConfidenceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights: weights.normalized(),
            metrics: Arc::new(ScoringMetrics::new()),
        }
    }

    /// Scorer sharing an externally owned metrics handle, for callers
    /// aggregating across pipelines.
    pub fn with_metrics(weights: ScoringWeights, metrics: Arc<ScoringMetrics>) -> Self {
        Self {
            weights: weights.normalized(),
            metrics,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn metrics(&self) -> &ScoringMetrics {
        &self.metrics
    }

    /// Scores a match, applying `calibration` when provided.
    pub fn score(&self, m: &Match, calibration: Option<&CalibrationCurve>) -> ConfidenceBreakdown {
        let started = Instant::now();

        let fuzzy = factors::fuzzy_confidence(m);
        let ocr = factors::ocr_confidence(m);
        let pattern_validation = factors::pattern_validation(m);
        let context_relevance = factors::context_relevance(m);
        let text_quality = factors::text_quality(m);
        let position_consistency = factors::position_consistency(m);
        let length_appropriateness = factors::length_appropriateness(m);
        let frequency = factors::frequency(m);

        let w = &self.weights;
        let weighted_sum = fuzzy * w.fuzzy
            + ocr * w.ocr
            + pattern_validation * w.pattern_validation
            + context_relevance * w.context_relevance
            + text_quality * w.text_quality
            + position_consistency * w.position_consistency
            + length_appropriateness * w.length_appropriateness
            + frequency * w.frequency;

        let calibrated = match calibration {
            Some(curve) => curve.apply(weighted_sum),
            None => weighted_sum,
        };
        let final_confidence = calibrated.clamp(0.0, 1.0);
        let level = ConfidenceLevel::from_score(final_confidence);

        self.metrics.record(level, started.elapsed());

        ConfidenceBreakdown {
            fuzzy,
            ocr,
            pattern_validation,
            context_relevance,
            text_quality,
            position_consistency,
            length_appropriateness,
            frequency,
            weighted_sum,
            calibrated,
            final_confidence,
            level,
        }
    }

    /// Scores a match and writes the calibrated confidence and level back
    /// onto it.
    pub fn score_and_apply(
        &self,
        m: &mut Match,
        calibration: Option<&CalibrationCurve>,
    ) -> ConfidenceBreakdown {
        let breakdown = self.score(m, calibration);
        m.final_confidence = Some(breakdown.final_confidence);
        m.confidence_level = Some(breakdown.level);
        breakdown
    }
}
