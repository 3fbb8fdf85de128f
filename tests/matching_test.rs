//! Integration tests for the matching engine: strategies, thresholds,
//! deduplication, negative patterns, and partial-failure collection.

mod common;

use expunge::{
    ConfidenceLevel, ConfidenceScorer, MatchStrategy, MatchType, MatchingConfig, MatchingEngine,
    PageText, SearchTerm,
};

use common::{assertions::assert_has_match, find_and_score};

fn pages(text: &str) -> Vec<PageText> {
    vec![PageText::new(1, text)]
}

#[test]
fn exact_match_is_certain_and_auto_approved() {
    let batch = find_and_score(
        MatchingConfig::default(),
        &["Confidential"],
        &pages("This memo is Confidential until further notice."),
    );

    assert_has_match(&batch, "Confidential", 1);
    let m = &batch.matches[0];
    assert_eq!(m.match_type, MatchType::Exact);
    assert_eq!(m.raw_confidence, 100.0);
    assert!(!m.needs_approval);
}

#[test]
fn fuzzy_finds_case_variant_above_default_threshold() {
    // "email" vs "EMAIL" must clear the default threshold of 80 under the
    // default case-insensitive config.
    let batch = find_and_score(
        MatchingConfig::default(),
        &["email"],
        &pages("Contact me by EMAIL or by mail."),
    );

    assert_has_match(&batch, "EMAIL", 1);
    let m = batch
        .matches
        .iter()
        .find(|m| m.matched_text == "EMAIL")
        .unwrap();
    assert!(m.raw_confidence >= 80.0, "score {}", m.raw_confidence);
}

#[test]
fn multibyte_case_folds_do_not_shift_exact_spans() {
    // 'İ' grows by a byte when lowercased, so spans found in a lowercased
    // copy of the page would point at the wrong slice of the original.
    let text = "İİİ send EMAIL now";
    let batch = find_and_score(MatchingConfig::default(), &["email"], &pages(text));

    let m = batch
        .matches
        .iter()
        .find(|m| m.match_type == MatchType::Exact)
        .expect("exact hit");
    assert_eq!(m.matched_text, "EMAIL");
    assert_eq!(&text[m.start..m.end], "EMAIL");
}

#[test]
fn multibyte_case_folds_do_not_shift_fuzzy_spans() {
    let text = "İstanbul visit: Jonson attending";
    let batch = find_and_score(MatchingConfig::default(), &["Johnson"], &pages(text));

    let m = batch
        .matches
        .iter()
        .find(|m| m.matched_text == "Jonson")
        .expect("fuzzy hit");
    assert_eq!(&text[m.start..m.end], "Jonson");
}

#[test]
fn context_window_width_is_counted_in_chars() {
    let padding = "é".repeat(60);
    let text = format!("{padding} EMAIL");
    let batch = find_and_score(MatchingConfig::default(), &["EMAIL"], &pages(&text));

    let m = batch
        .matches
        .iter()
        .find(|m| m.match_type == MatchType::Exact)
        .expect("exact hit");
    // 40 chars of leading context regardless of how many bytes they take.
    assert_eq!(m.context.chars().count(), 40 + "EMAIL".len());
    assert!(m.context.ends_with("EMAIL"));
}

#[test]
fn exact_only_strategy_skips_near_misses() {
    let config = MatchingConfig {
        strategy: MatchStrategy::ExactOnly,
        ..MatchingConfig::default()
    };
    let batch = find_and_score(config, &["Johnson"], &pages("Signed, Jonson and Smith."));
    assert!(
        batch.matches.is_empty(),
        "exact-only must not match 'Jonson': {:?}",
        batch.matches
    );
}

#[test]
fn hybrid_dedupes_exact_and_fuzzy_hits_of_same_span() {
    let batch = find_and_score(
        MatchingConfig::default(),
        &["Johnson"],
        &pages("Report prepared by Johnson."),
    );

    let hits: Vec<_> = batch
        .matches
        .iter()
        .filter(|m| m.matched_text.eq_ignore_ascii_case("Johnson"))
        .collect();
    assert_eq!(hits.len(), 1, "duplicate hits: {hits:?}");
    // The exact hit wins the dedup because it carries the higher score.
    assert_eq!(hits[0].match_type, MatchType::Exact);
}

#[test]
fn per_term_threshold_override_is_honored() {
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let strict = vec![SearchTerm::new("Johnson").with_threshold(99.0)];
    let batch = engine.find_matches(&strict, &pages("Signed, Jonson."));
    assert!(batch.matches.is_empty(), "99 threshold must reject 'Jonson'");

    let lax = vec![SearchTerm::new("Johnson").with_threshold(70.0)];
    let batch = engine.find_matches(&lax, &pages("Signed, Jonson."));
    assert_has_match(&batch, "Jonson", 1);
}

#[test]
fn short_term_becomes_error_entry_without_aborting_run() {
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let terms = vec![SearchTerm::new("ab"), SearchTerm::new("Confidential")];
    let batch = engine.find_matches(&terms, &pages("A Confidential note."));

    assert!(!batch.is_complete());
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].0, "ab");
    assert_has_match(&batch, "Confidential", 1);
}

#[test]
fn negative_pattern_excludes_matching_terms() {
    let config = MatchingConfig {
        negative_patterns: vec![r"^test-".to_string()],
        ..MatchingConfig::default()
    };
    let batch = find_and_score(
        config,
        &["test-account", "Confidential"],
        &pages("The test-account is Confidential."),
    );

    assert!(
        !batch.matches.iter().any(|m| m.term == "test-account"),
        "excluded term still matched: {:?}",
        batch.matches
    );
    assert_has_match(&batch, "Confidential", 1);
}

#[test]
fn invalid_negative_pattern_is_skipped_not_fatal() {
    let config = MatchingConfig {
        negative_patterns: vec!["[unclosed".to_string()],
        ..MatchingConfig::default()
    };
    assert!(MatchingEngine::new(config).is_ok());
}

#[test]
fn phonetic_strategy_matches_homophones() {
    let config = MatchingConfig {
        strategy: MatchStrategy::Phonetic,
        ..MatchingConfig::default()
    };
    let batch = find_and_score(config, &["Smith"], &pages("Delivered to Smyth today."));

    assert_has_match(&batch, "Smyth", 1);
    let m = &batch.matches[0];
    assert_eq!(m.match_type, MatchType::Phonetic);
    assert!(m.needs_approval, "phonetic matches always need approval");
}

#[test]
fn matches_carry_context_and_cluster_ids() {
    let batch = find_and_score(
        MatchingConfig::default(),
        &["Confidential"],
        &pages("Please treat this entire document as Confidential material."),
    );

    let m = &batch.matches[0];
    assert!(m.context.contains("Confidential"));
    let cluster = m.cluster_id.as_deref().expect("cluster assigned");
    assert!(cluster.ends_with(":p1"), "cluster id '{cluster}'");
}

#[test]
fn matches_are_sorted_by_page_then_offset() {
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let terms = vec![SearchTerm::new("alpha"), SearchTerm::new("omega")];
    let pages = vec![
        PageText::new(2, "omega then alpha"),
        PageText::new(1, "alpha and omega"),
    ];
    let batch = engine.find_matches(&terms, &pages);

    let order: Vec<_> = batch
        .matches
        .iter()
        .map(|m| (m.page_number, m.start))
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted, "unsorted batch: {order:?}");
}

#[test]
fn cancelled_run_stops_scheduling_pages() {
    use expunge::CancelFlag;

    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let terms = vec![SearchTerm::new("Confidential")];
    let many_pages: Vec<PageText> = (1..=50)
        .map(|n| PageText::new(n, "A Confidential page."))
        .collect();
    let batch = engine.find_matches_with_cancel(&terms, &many_pages, &cancel);

    assert!(
        batch.matches.is_empty(),
        "pre-cancelled run still scanned: {:?}",
        batch.matches
    );
    assert!(batch.is_complete(), "cancellation is not an error");
}

#[test]
fn ocr_confidence_propagates_into_scoring() {
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let terms = vec![SearchTerm::new("Confidential")];
    let noisy = vec![PageText::new(1, "A Confidential scan.").with_ocr_confidence(0.5)];
    let clean = vec![PageText::new(1, "A Confidential scan.")];

    let scorer = ConfidenceScorer::default();
    let mut noisy_batch = engine.find_matches(&terms, &noisy);
    let mut clean_batch = engine.find_matches(&terms, &clean);
    let noisy_score = scorer
        .score_and_apply(&mut noisy_batch.matches[0], None)
        .final_confidence;
    let clean_score = scorer
        .score_and_apply(&mut clean_batch.matches[0], None)
        .final_confidence;

    assert!(
        noisy_score < clean_score,
        "low OCR confidence must lower the final score ({noisy_score} vs {clean_score})"
    );
}

#[test]
fn scored_exact_match_reaches_high_confidence_level() {
    let batch = find_and_score(
        MatchingConfig::default(),
        &["Confidential"],
        &pages("This memo is Confidential until further notice."),
    );
    let level = batch.matches[0].confidence_level.expect("scored");
    assert!(
        matches!(level, ConfidenceLevel::High | ConfidenceLevel::VeryHigh),
        "exact match scored {level:?}"
    );
}
