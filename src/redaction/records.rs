//! Approved redaction records.
//!
//! A record is a match promoted to "approved" with finalized geometry.
//! Records are never deleted; once the applier confirms removal they are
//! marked redacted with a timestamp and retained for audit.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{ExpungeError, ExpungeResult};
use crate::geometry::BoundingBox;
use crate::matching::Match;

/// How a record was approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    /// Confidence met the auto-approve threshold.
    Auto,
    /// A human approved a below-threshold match.
    Human,
}

/// An approved match with finalized page geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionRecord {
    pub term: String,
    pub matched_text: String,
    pub page_number: u32,
    /// Calibrated confidence (0-1) at approval time.
    pub confidence: f64,
    pub region: BoundingBox,
    pub approval: Approval,
    pub redacted: bool,
    pub redacted_at: Option<SystemTime>,
}

impl RedactionRecord {
    /// Promotes a match whose confidence meets `auto_approve_threshold`.
    ///
    /// Returns `None` when the match is below the threshold and therefore
    /// needs a human decision. Fails when the match has no geometry or no
    /// final confidence yet.
    pub fn auto_approve(m: &Match, auto_approve_threshold: f64) -> ExpungeResult<Option<Self>> {
        let (confidence, region) = Self::require_scored_geometry(m)?;
        if confidence < auto_approve_threshold {
            return Ok(None);
        }
        Ok(Some(Self::build(m, confidence, region, Approval::Auto)))
    }

    /// Promotes a match on explicit human approval, regardless of score.
    pub fn human_approve(m: &Match) -> ExpungeResult<Self> {
        let (confidence, region) = Self::require_scored_geometry(m)?;
        Ok(Self::build(m, confidence, region, Approval::Human))
    }

    fn require_scored_geometry(m: &Match) -> ExpungeResult<(f64, BoundingBox)> {
        let confidence = m.final_confidence.ok_or_else(|| {
            ExpungeError::validation("match", "cannot approve an unscored match")
        })?;
        let region = m.bounding_box.ok_or_else(|| {
            ExpungeError::validation("match", "cannot approve a match without geometry")
        })?;
        Ok((confidence, region))
    }

    fn build(m: &Match, confidence: f64, region: BoundingBox, approval: Approval) -> Self {
        Self {
            term: m.term.clone(),
            matched_text: m.matched_text.clone(),
            page_number: m.page_number,
            confidence,
            region,
            approval,
            redacted: false,
            redacted_at: None,
        }
    }

    /// Marks the record redacted, stamping the current time. Called only
    /// after the applier confirms removal.
    pub fn mark_redacted(&mut self) {
        self.redacted = true;
        self.redacted_at = Some(SystemTime::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchType;
    use crate::scoring::ConfidenceLevel;
    use std::collections::BTreeMap;

    fn scored_match(confidence: f64) -> Match {
        Match {
            term: "email".to_string(),
            matched_text: "EMAIL".to_string(),
            page_number: 1,
            match_type: MatchType::Exact,
            algorithm_scores: BTreeMap::new(),
            raw_confidence: 100.0,
            ocr_confidence: None,
            context: String::new(),
            start: 14,
            end: 19,
            pattern_validated: None,
            needs_approval: false,
            cluster_id: None,
            final_confidence: Some(confidence),
            confidence_level: Some(ConfidenceLevel::from_score(confidence)),
            bounding_box: Some(BoundingBox::new(10.0, 20.0, 50.0, 12.0, 1).unwrap()),
        }
    }

    #[test]
    fn test_auto_approve_respects_threshold() {
        let high = scored_match(0.9);
        assert!(RedactionRecord::auto_approve(&high, 0.85)
            .unwrap()
            .is_some());

        let low = scored_match(0.6);
        assert!(RedactionRecord::auto_approve(&low, 0.85).unwrap().is_none());
    }

    #[test]
    fn test_human_approval_ignores_threshold() {
        let low = scored_match(0.6);
        let record = RedactionRecord::human_approve(&low).unwrap();
        assert_eq!(record.approval, Approval::Human);
        assert_eq!(record.confidence, 0.6);
    }

    #[test]
    fn test_approval_requires_geometry_and_score() {
        let mut unscored = scored_match(0.9);
        unscored.final_confidence = None;
        assert!(RedactionRecord::human_approve(&unscored).is_err());

        let mut no_box = scored_match(0.9);
        no_box.bounding_box = None;
        assert!(RedactionRecord::human_approve(&no_box).is_err());
    }

    #[test]
    fn test_mark_redacted_stamps_time() {
        let mut record = RedactionRecord::human_approve(&scored_match(0.9)).unwrap();
        assert!(!record.redacted);
        record.mark_redacted();
        assert!(record.redacted);
        assert!(record.redacted_at.is_some());
    }
}
