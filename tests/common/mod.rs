//! Shared test infrastructure.
#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

use expunge::{ConfidenceScorer, MatchBatch, MatchingConfig, MatchingEngine, PageText, SearchTerm};

/// Runs the matching engine and scores every match with default weights.
pub fn find_and_score(config: MatchingConfig, terms: &[&str], pages: &[PageText]) -> MatchBatch {
    let engine = MatchingEngine::new(config).expect("engine construction");
    let terms: Vec<SearchTerm> = terms.iter().map(|t| SearchTerm::new(*t)).collect();
    let mut batch = engine.find_matches(&terms, pages);

    let scorer = ConfidenceScorer::default();
    for m in &mut batch.matches {
        scorer.score_and_apply(m, None);
    }
    batch
}
