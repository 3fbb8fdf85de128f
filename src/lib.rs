//! Sensitive-text search, confidence scoring, and secure PDF redaction.
//!
//! This library locates sensitive text inside paginated documents, scores
//! the confidence of each candidate match, converts matches into
//! page-geometry redaction regions, and physically removes the underlying
//! text while verifying that removal succeeded.
//!
//! # Features
//!
//! - **Fuzzy Matching**: exact, approximate (ratio, partial, token-based,
//!   weighted), and phonetic (Soundex/Metaphone) strategies over bounded
//!   candidate sets
//! - **Calibrated Confidence**: eight weighted signals combined into one
//!   score with optional linear calibration against validated samples
//! - **Page Geometry**: box validation, merging, margin expansion, DPI
//!   normalization, and coordinate-system conversion
//! - **Secure Redaction**: physical text removal via MuPDF's redaction
//!   API, with fail-closed verification that no residual text remains
//!
//! # Architecture
//!
//! - [`text`]: normalization and candidate extraction
//! - [`matching`]: the matching engine and its strategies
//! - [`scoring`]: confidence factors, calibration, and metrics
//! - [`geometry`]: bounding boxes and page-coordinate operations
//! - [`redaction`]: the access-layer boundary, applier, and verifier
//! - [`error`]: the error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use expunge::{
//!     ConfidenceScorer, MatchingConfig, MatchingEngine, MuPdfAccess, PageText, PdfAccess,
//!     RedactionService, SearchTerm,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut access = MuPdfAccess::open(Path::new("input.pdf"))?;
//! let pages: Vec<PageText> = (1..=access.page_count()?)
//!     .map(|n| Ok(PageText::new(n, access.extract_text(n, None)?)))
//!     .collect::<Result<_, expunge::ExpungeError>>()?;
//!
//! let engine = MatchingEngine::new(MatchingConfig::default())?;
//! let mut batch = engine.find_matches(&[SearchTerm::new("confidential")], &pages);
//!
//! let scorer = ConfidenceScorer::default();
//! for m in &mut batch.matches {
//!     scorer.score_and_apply(m, None);
//! }
//!
//! let service = RedactionService::default();
//! let mut plan = service.plan(&access, &mut batch.matches)?;
//! let outcome = service.redact(
//!     &mut access,
//!     &mut plan.records,
//!     Path::new("output.pdf"),
//!     |p| MuPdfAccess::open(p),
//! )?;
//! assert!(outcome.success);
//! # Ok(())
//! # }
//! ```

// Public API
pub mod error;
pub mod geometry;
pub mod matching;
pub mod redaction;
pub mod scoring;
pub mod text;

// Re-exports for convenient access
pub use error::{ExpungeError, ExpungeResult};
pub use geometry::{merge_overlapping, BoundingBox, BoxSource, CoordinateOrigin, PageDimensions};
pub use matching::{
    Algorithm, CancelFlag, Match, MatchBatch, MatchStrategy, MatchType, MatchingConfig,
    MatchingEngine, PageText, SearchTerm,
};
pub use redaction::{
    Approval, FailedRegion, MuPdfAccess, PdfAccess, RedactionOptions, RedactionOutcome,
    RedactionPlan, RedactionRecord, RedactionService, RedactionState, RegionStyle, RunStatistics,
};
pub use scoring::{
    CalibrationCurve, ConfidenceBreakdown, ConfidenceLevel, ConfidenceScorer, MetricsSnapshot,
    ScoringMetrics, ScoringWeights,
};
pub use text::{extract_candidates, NormalizeMode, Normalizer, NormalizerConfig};

use std::path::Path;

/// Extracts the full text of a PDF, handling complex encodings.
///
/// Used for quick inspection and by the CLI's `extract` subcommand; the
/// redaction pipeline itself extracts per page through [`PdfAccess`].
pub fn extract_text_from_pdf(path: &Path) -> ExpungeResult<String> {
    let bytes = std::fs::read(path).map_err(|e| ExpungeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExpungeError::TextExtraction {
        page: 0,
        reason: e.to_string(),
    })
}
