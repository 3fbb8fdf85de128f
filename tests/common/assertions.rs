//! Custom assertions shared across the integration suites.

use std::path::Path;

use expunge::{BoundingBox, MatchBatch, RedactionOutcome, RedactionState};

use super::fixtures::FakePdf;

/// Asserts every region of a verified outcome is empty in the output.
pub fn assert_verified(outcome: &RedactionOutcome) {
    assert!(outcome.success, "expected success, got {outcome:?}");
    assert_eq!(outcome.state, RedactionState::Verified);
    assert!(outcome.failed_records.is_empty());
    let out = outcome
        .output_path
        .as_ref()
        .expect("verified outcome carries an output path");
    assert!(out.exists(), "output file missing: {}", out.display());
}

/// Asserts the run failed closed: no output path and no file on disk.
pub fn assert_failed_closed(outcome: &RedactionOutcome, output_path: &Path) {
    assert!(!outcome.success, "expected failure, got {outcome:?}");
    assert_eq!(outcome.state, RedactionState::Failed);
    assert!(outcome.output_path.is_none());
    assert!(
        !outcome.failed_records.is_empty(),
        "failed outcome must name the regions that failed"
    );
    assert!(
        !output_path.exists(),
        "fail-closed run must not surface '{}'",
        output_path.display()
    );
}

/// Asserts the given text no longer appears anywhere on a page.
pub fn assert_text_absent(pdf: &FakePdf, page: u32, text: &str) {
    let words = pdf.words_on_page(page);
    assert!(
        !words.iter().any(|w| w.eq_ignore_ascii_case(text)),
        "'{text}' still present on page {page}: {words:?}"
    );
}

/// Asserts the given text is still present on a page.
pub fn assert_text_present(pdf: &FakePdf, page: u32, text: &str) {
    let words = pdf.words_on_page(page);
    assert!(
        words.iter().any(|w| w.eq_ignore_ascii_case(text)),
        "'{text}' missing from page {page}: {words:?}"
    );
}

/// Asserts a batch contains a match whose text equals `text` on `page`.
pub fn assert_has_match(batch: &MatchBatch, text: &str, page: u32) {
    assert!(
        batch
            .matches
            .iter()
            .any(|m| m.matched_text.eq_ignore_ascii_case(text) && m.page_number == page),
        "no match '{text}' on page {page} in {:?}",
        batch.matches
    );
}

/// Asserts two boxes are equal within a small tolerance.
pub fn assert_box_eq(actual: &BoundingBox, expected: &BoundingBox) {
    const EPS: f64 = 1e-9;
    assert!(
        (actual.x - expected.x).abs() < EPS
            && (actual.y - expected.y).abs() < EPS
            && (actual.width - expected.width).abs() < EPS
            && (actual.height - expected.height).abs() < EPS
            && actual.page_number == expected.page_number,
        "box mismatch:\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}
