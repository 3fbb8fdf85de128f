//! Matching engine: locates search terms in page text.
//!
//! Runs one or more strategies (exact, fuzzy, phonetic) over bounded
//! candidate sets per term per page. Terms scan in parallel on a bounded
//! worker pool; a single term walks its pages sequentially so only one
//! page's candidate set is resident per worker. Per-term failures are
//! collected, never fatal for the batch.

pub mod algorithms;
pub mod config;
pub mod phonetic;

pub use algorithms::all_scores;
pub use config::{Algorithm, MatchStrategy, MatchingConfig, SearchTerm};
pub use phonetic::PhoneticMatcher;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ExpungeError, ExpungeResult};
use crate::geometry::BoundingBox;
use crate::scoring::ConfidenceLevel;
use crate::text::{extract_candidates, Normalizer, NormalizerConfig};

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Phonetic,
}

/// One page of extracted text, in page-number order.
///
/// `ocr_confidence` is present only when the page text came from OCR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    #[serde(default)]
    pub ocr_confidence: Option<f64>,
}

impl PageText {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            ocr_confidence: None,
        }
    }

    pub fn with_ocr_confidence(mut self, confidence: f64) -> Self {
        self.ocr_confidence = Some(confidence);
        self
    }
}

/// A located occurrence of a search term.
///
/// Created by the matching engine, then enriched by the confidence scorer
/// (final confidence and level) and the geometry stage (bounding box).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub term: String,
    /// Matched text with the page's original casing preserved.
    pub matched_text: String,
    pub page_number: u32,
    pub match_type: MatchType,
    /// Score under every algorithm (0-100), for downstream analysis.
    pub algorithm_scores: BTreeMap<String, f64>,
    /// Confidence (0-100) from the strategy that produced the match.
    pub raw_confidence: f64,
    /// OCR confidence (0-1) of the source page, when OCR-derived.
    pub ocr_confidence: Option<f64>,
    /// Text surrounding the match, for context-relevance scoring.
    pub context: String,
    /// Byte span within the page text.
    pub start: usize,
    pub end: usize,
    /// Whether a validator confirmed a pattern-typed match. `None` when
    /// no validator ran.
    pub pattern_validated: Option<bool>,
    /// Exact matches never need approval; fuzzy matches below the
    /// high-confidence threshold do.
    pub needs_approval: bool,
    /// UI grouping key; never affects confidence or redaction decisions.
    pub cluster_id: Option<String>,
    /// Calibrated confidence (0-1), set by the scorer.
    pub final_confidence: Option<f64>,
    pub confidence_level: Option<ConfidenceLevel>,
    /// Page geometry, set once the match is located on the page.
    pub bounding_box: Option<BoundingBox>,
}

impl Match {
    /// Length of the reported span in bytes.
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Result of a matching run: best-effort matches plus per-unit errors.
#[derive(Debug, Default)]
pub struct MatchBatch {
    pub matches: Vec<Match>,
    /// `(term text, error)` for each unit that failed.
    pub errors: Vec<(String, ExpungeError)>,
}

impl MatchBatch {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Cooperative cancellation flag.
///
/// Workers stop scheduling new pages once raised; an in-flight page is
/// always finished.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The matching engine. Construct once per configuration, then reuse
/// across documents; it holds no per-document state.
pub struct MatchingEngine {
    config: MatchingConfig,
    normalizer: Normalizer,
    negative_patterns: Vec<Regex>,
    phonetic: PhoneticMatcher,
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> ExpungeResult<Self> {
        let normalizer = Normalizer::new(NormalizerConfig {
            mode: config.normalize_mode,
            require_stemmer: false,
        })?;

        // Invalid negative patterns are logged and skipped, never fatal.
        let negative_patterns = config
            .negative_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("skipping invalid negative pattern '{p}': {e}");
                    None
                }
            })
            .collect();

        Ok(Self {
            config,
            normalizer,
            negative_patterns,
            phonetic: PhoneticMatcher::new(),
        })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Finds all matches for `terms` across `pages`.
    ///
    /// Terms scan in parallel on a pool of `worker_threads` workers. A
    /// failed term contributes an error entry instead of aborting the run.
    pub fn find_matches(&self, terms: &[SearchTerm], pages: &[PageText]) -> MatchBatch {
        self.find_matches_with_cancel(terms, pages, &CancelFlag::new())
    }

    /// [`find_matches`](Self::find_matches) with cooperative cancellation.
    pub fn find_matches_with_cancel(
        &self,
        terms: &[SearchTerm],
        pages: &[PageText],
        cancel: &CancelFlag,
    ) -> MatchBatch {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads.max(1))
            .build();

        let per_term: Vec<(String, ExpungeResult<Vec<Match>>)> = match pool {
            Ok(pool) => pool.install(|| {
                terms
                    .par_iter()
                    .map(|term| (term.text.clone(), self.scan_term(term, pages, cancel)))
                    .collect()
            }),
            Err(e) => {
                // Bounded pool could not be built; fall back to the caller's
                // thread rather than failing the run.
                warn!("worker pool unavailable ({e}), scanning sequentially");
                terms
                    .iter()
                    .map(|term| (term.text.clone(), self.scan_term(term, pages, cancel)))
                    .collect()
            }
        };

        let mut batch = MatchBatch::default();
        for (term_text, result) in per_term {
            match result {
                Ok(matches) => batch.matches.extend(matches),
                Err(e) => {
                    warn!("term '{term_text}' failed: {e}");
                    batch.errors.push((term_text, e));
                }
            }
        }

        batch.matches = deduplicate(batch.matches);
        assign_clusters(&mut batch.matches);
        batch
    }

    /// Scans one term over all pages, sequentially.
    fn scan_term(
        &self,
        term: &SearchTerm,
        pages: &[PageText],
        cancel: &CancelFlag,
    ) -> ExpungeResult<Vec<Match>> {
        term.validate()?;

        let trimmed = term.text.trim();
        if self.is_excluded(trimmed) {
            debug!("term '{trimmed}' excluded by negative pattern");
            return Ok(Vec::new());
        }

        let threshold = self.config.threshold_for(term);
        let mut matches = Vec::new();

        for page in pages {
            if cancel.is_cancelled() {
                debug!("scan of '{trimmed}' cancelled before page {}", page.page_number);
                break;
            }

            match self.config.strategy {
                MatchStrategy::ExactOnly => {
                    matches.extend(self.exact_scan(trimmed, page));
                }
                MatchStrategy::FuzzyOnly => {
                    matches.extend(self.fuzzy_scan(term, trimmed, page, threshold));
                }
                MatchStrategy::Hybrid => {
                    matches.extend(self.exact_scan(trimmed, page));
                    matches.extend(self.fuzzy_scan(term, trimmed, page, threshold));
                }
                MatchStrategy::Phonetic => {
                    matches.extend(self.phonetic_scan(term, trimmed, page));
                }
            }
        }

        Ok(matches)
    }

    /// Normalized comparison form of a string: the configured normalize
    /// mode, case-folded unless matching is case-sensitive. Terms and page
    /// candidates go through this identically.
    fn comparison_form(&self, text: &str) -> String {
        let normalized = self.normalizer.normalize_default(text);
        if self.config.case_sensitive {
            normalized
        } else {
            normalized.to_lowercase()
        }
    }

    fn is_excluded(&self, term: &str) -> bool {
        self.negative_patterns.iter().any(|re| re.is_match(term))
    }

    /// Literal scan. Case-insensitive unless configured otherwise; hits
    /// carry confidence 100 and no approval requirement.
    fn exact_scan(&self, term: &str, page: &PageText) -> Vec<Match> {
        if term.is_empty() {
            return Vec::new();
        }

        let spans = if self.config.case_sensitive {
            page.text
                .match_indices(term)
                .map(|(start, hit)| (start, start + hit.len()))
                .collect()
        } else {
            // Offsets must come from the original text: folding 'İ' and
            // friends changes byte length, so searching a lowercased copy
            // would report shifted spans.
            FoldedText::new(&page.text).find_all(&term.to_lowercase())
        };

        spans
            .into_iter()
            .map(|(start, end)| {
                let matched_text = page.text.get(start..end).unwrap_or(term).to_string();
                self.build_match(
                    term,
                    matched_text,
                    page,
                    MatchType::Exact,
                    100.0,
                    start,
                    end,
                    false,
                )
            })
            .collect()
    }

    /// Fuzzy scan over the bounded candidate set.
    fn fuzzy_scan(
        &self,
        term: &SearchTerm,
        trimmed: &str,
        page: &PageText,
        threshold: f64,
    ) -> Vec<Match> {
        let norm_term = self.comparison_form(trimmed);
        let mut matches = Vec::new();

        for candidate in extract_candidates(&page.text, term.word_count()) {
            let norm_candidate = self.comparison_form(&candidate);
            let score = self.config.algorithm.score(&norm_term, &norm_candidate);
            if score < threshold {
                continue;
            }

            let Some((start, end, matched_text)) = locate(&page.text, &candidate) else {
                continue;
            };

            let needs_approval = score < self.config.high_confidence_threshold;
            let mut m = self.build_match(
                trimmed,
                matched_text,
                page,
                MatchType::Fuzzy,
                score,
                start,
                end,
                needs_approval,
            );
            m.algorithm_scores = all_scores(&norm_term, &norm_candidate);
            matches.push(m);
        }

        matches
    }

    /// Phonetic scan: term vs candidate Soundex/Metaphone codes.
    fn phonetic_scan(&self, term: &SearchTerm, trimmed: &str, page: &PageText) -> Vec<Match> {
        let norm_term = self.comparison_form(trimmed);
        let mut matches = Vec::new();

        for candidate in extract_candidates(&page.text, term.word_count()) {
            let norm_candidate = self.comparison_form(&candidate);
            let Some(confidence) = self.phonetic.confidence(&norm_term, &norm_candidate) else {
                continue;
            };
            let Some((start, end, matched_text)) = locate(&page.text, &candidate) else {
                continue;
            };

            matches.push(self.build_match(
                trimmed,
                matched_text,
                page,
                MatchType::Phonetic,
                confidence,
                start,
                end,
                true,
            ));
        }

        matches
    }

    #[allow(clippy::too_many_arguments)]
    fn build_match(
        &self,
        term: &str,
        matched_text: String,
        page: &PageText,
        match_type: MatchType,
        raw_confidence: f64,
        start: usize,
        end: usize,
        needs_approval: bool,
    ) -> Match {
        Match {
            term: term.to_string(),
            matched_text,
            page_number: page.page_number,
            match_type,
            algorithm_scores: BTreeMap::new(),
            raw_confidence,
            ocr_confidence: page.ocr_confidence,
            context: context_window(&page.text, start, end),
            start,
            end,
            pattern_validated: None,
            needs_approval,
            cluster_id: None,
            final_confidence: None,
            confidence_level: None,
            bounding_box: None,
        }
    }
}

/// Case-folded view of a text that remembers, for every byte of the fold,
/// the original byte offset it came from. Searching the fold therefore
/// yields spans valid in the original text even when folding changes byte
/// length ('İ' folds to two code points).
struct FoldedText {
    folded: String,
    /// `offsets[i]` is the original offset of the char whose fold
    /// produced folded byte `i`; one trailing entry holds `text.len()`.
    offsets: Vec<usize>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (idx, ch) in text.char_indices() {
            for low in ch.to_lowercase() {
                folded.push(low);
                for _ in 0..low.len_utf8() {
                    offsets.push(idx);
                }
            }
        }
        offsets.push(text.len());
        Self { folded, offsets }
    }

    /// First occurrence of `needle` (already folded), as an original span.
    fn find(&self, needle: &str) -> Option<(usize, usize)> {
        let start = self.folded.find(needle)?;
        Some((self.offsets[start], self.offsets[start + needle.len()]))
    }

    /// All non-overlapping occurrences, as original spans.
    fn find_all(&self, needle: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        if needle.is_empty() {
            return spans;
        }
        let mut from = 0;
        while let Some(pos) = self.folded[from..].find(needle) {
            let start = from + pos;
            let end = start + needle.len();
            spans.push((self.offsets[start], self.offsets[end]));
            from = end;
        }
        spans
    }
}

/// Finds `candidate` in `text` case-insensitively, returning the byte span
/// and the case-preserved slice from the original text.
fn locate(text: &str, candidate: &str) -> Option<(usize, usize, String)> {
    let (start, end) = FoldedText::new(text).find(&candidate.to_lowercase())?;
    let matched = text.get(start..end).unwrap_or(candidate).to_string();
    Some((start, end, matched))
}

/// Context window of up to 40 chars on each side of a span. Counted in
/// chars so multibyte-heavy pages get the same visible width as ASCII.
fn context_window(text: &str, start: usize, end: usize) -> String {
    const WINDOW: usize = 40;
    let head = text.get(..start).unwrap_or_default();
    let tail = text.get(end..).unwrap_or_default();
    let lo = head
        .char_indices()
        .rev()
        .nth(WINDOW - 1)
        .map_or(0, |(i, _)| i);
    let hi = end
        + tail
            .char_indices()
            .nth(WINDOW)
            .map_or(tail.len(), |(i, _)| i);
    text.get(lo..hi).unwrap_or_default().to_string()
}

/// Removes duplicates keyed by `(lowercased text, page, start)`, keeping
/// the higher-confidence entry on collision.
fn deduplicate(matches: Vec<Match>) -> Vec<Match> {
    let mut by_key: HashMap<(String, u32, usize), Match> = HashMap::new();

    for m in matches {
        let key = (m.matched_text.to_lowercase(), m.page_number, m.start);
        match by_key.get(&key) {
            Some(existing) if existing.raw_confidence >= m.raw_confidence => {}
            _ => {
                by_key.insert(key, m);
            }
        }
    }

    let mut result: Vec<Match> = by_key.into_values().collect();
    result.sort_by(|a, b| (a.page_number, a.start).cmp(&(b.page_number, b.start)));
    result
}

/// Attaches a `(term, page)` cluster id to every match. Grouping only;
/// confidence is never touched.
fn assign_clusters(matches: &mut [Match]) {
    for m in matches.iter_mut() {
        let slug = m.term.to_lowercase().replace(char::is_whitespace, "-");
        m.cluster_id = Some(format!("{}:p{}", slug, m.page_number));
    }
}
