//! Redaction: geometry planning, application, and verification.
//!
//! The service turns scored matches into approved records with page
//! geometry, applies them through a [`PdfAccess`] backend, and verifies
//! that no recoverable text remains in any redacted region.

pub mod access;
pub mod apply;
pub mod records;

pub use access::{MuPdfAccess, PdfAccess, RegionStyle};
pub use apply::{
    FailedRegion, RedactionOptions, RedactionOutcome, RedactionState, RunStatistics,
};
pub use records::{Approval, RedactionRecord};

use std::path::Path;

use log::{debug, warn};

use crate::error::ExpungeResult;
use crate::geometry::{merge_overlapping, CoordinateOrigin};
use crate::matching::Match;

/// Result of planning geometry and approval for a set of scored matches.
#[derive(Debug, Default)]
pub struct RedactionPlan {
    /// Auto-approved records, ready to apply.
    pub records: Vec<RedactionRecord>,
    /// Scored matches below the auto-approve threshold, awaiting a human
    /// decision.
    pub needs_review: Vec<Match>,
    /// Matches dropped because no valid geometry could be resolved.
    pub dropped: usize,
}

/// High-level coordinator for the redaction stage.
pub struct RedactionService {
    options: RedactionOptions,
}

impl Default for RedactionService {
    fn default() -> Self {
        Self::new(RedactionOptions::default())
    }
}

impl RedactionService {
    pub fn new(options: RedactionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RedactionOptions {
        &self.options
    }

    /// Resolves page geometry for scored matches and splits them into
    /// auto-approved records and matches needing review.
    ///
    /// Every occurrence of a match's text on its page is covered: one
    /// record per merged geometry hit. Matches whose geometry cannot be
    /// resolved or validated are dropped with a warning, not escalated.
    pub fn plan<A: PdfAccess>(
        &self,
        access: &A,
        matches: &mut [Match],
    ) -> ExpungeResult<RedactionPlan> {
        let origin = access.coordinate_origin();
        let mut plan = RedactionPlan::default();

        for m in matches.iter_mut() {
            if m.final_confidence.is_none() {
                warn!(
                    "match '{}' on page {} is unscored, dropping",
                    m.matched_text, m.page_number
                );
                plan.dropped += 1;
                continue;
            }

            let dims = access.page_dimensions(m.page_number)?;
            let hits = access.search(
                m.page_number,
                &m.matched_text,
                self.options.max_search_hits,
            )?;

            // Bring backend geometry into the canonical top-left system.
            let canonical: Vec<_> = hits
                .into_iter()
                .map(|b| b.convert_origin(origin, CoordinateOrigin::TopLeft, dims.height))
                .filter(|b| {
                    let ok = b.validate(&dims);
                    if !ok {
                        warn!(
                            "dropping out-of-page box for '{}' on page {}",
                            m.matched_text, m.page_number
                        );
                    }
                    ok
                })
                .collect();

            let merged = merge_overlapping(canonical, self.options.merge_tolerance);
            let Some(first) = merged.first() else {
                debug!(
                    "no geometry found for '{}' on page {}, dropping",
                    m.matched_text, m.page_number
                );
                plan.dropped += 1;
                continue;
            };
            m.bounding_box = Some(*first);

            // Review items carry one entry per region too, otherwise a
            // later approval would cover only the first occurrence while
            // the run still reports success.
            for region in &merged {
                let mut candidate = m.clone();
                candidate.bounding_box = Some(*region);
                if m.needs_approval {
                    plan.needs_review.push(candidate);
                    continue;
                }
                match RedactionRecord::auto_approve(&candidate, self.options.auto_approve_threshold)?
                {
                    Some(record) => plan.records.push(record),
                    None => plan.needs_review.push(candidate),
                }
            }
        }

        Ok(plan)
    }

    /// Applies approved records and verifies removal. See
    /// [`apply::apply_and_verify`] for the state machine and the
    /// fail-closed guarantee.
    pub fn redact<A, R, F>(
        &self,
        access: &mut A,
        records: &mut [RedactionRecord],
        output_path: &Path,
        reopen: F,
    ) -> ExpungeResult<RedactionOutcome>
    where
        A: PdfAccess,
        R: PdfAccess,
        F: FnOnce(&Path) -> ExpungeResult<R>,
    {
        apply::apply_and_verify(access, records, &self.options, output_path, reopen)
    }
}
