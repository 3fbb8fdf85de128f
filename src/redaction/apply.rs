//! Redaction application and verification.
//!
//! Per-document state machine: `Pending -> Applying -> Verified | Failed`.
//! Every page is marked and flattened before verification runs against
//! the saved output; any residual text in a redacted region fails the
//! whole document and the modified file is never surfaced. Application is
//! single-threaded per document; concurrent mutation of one PDF is not
//! safe.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{ExpungeError, ExpungeResult};
use crate::geometry::CoordinateOrigin;
use crate::redaction::access::{PdfAccess, RegionStyle};
use crate::redaction::records::RedactionRecord;

/// Lifecycle of one redaction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionState {
    Pending,
    Applying,
    Verified,
    Failed,
}

/// Options controlling a redaction run.
#[derive(Debug, Clone)]
pub struct RedactionOptions {
    /// Matches at or above this calibrated confidence are auto-approved.
    pub auto_approve_threshold: f64,
    /// Margin added around each region before marking, clipped to the page.
    pub margin: f64,
    /// Tolerance used when merging a match's raw geometry.
    pub merge_tolerance: f64,
    pub style: RegionStyle,
    /// Maximum geometry hits resolved per match text.
    pub max_search_hits: u32,
}

impl Default for RedactionOptions {
    fn default() -> Self {
        Self {
            auto_approve_threshold: 0.85,
            margin: 1.0,
            merge_tolerance: 2.0,
            style: RegionStyle::default(),
            max_search_hits: 100,
        }
    }
}

/// Statistics for one redaction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub total_matches: usize,
    pub redactions_applied: usize,
    pub pages_affected: usize,
    pub average_confidence: f64,
    pub processing_time: Duration,
    /// Page-level apply time divided across that page's records.
    pub average_time_per_redaction: Duration,
}

/// One region that failed verification.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRegion {
    pub term: String,
    pub matched_text: String,
    pub page_number: u32,
    /// Number of residual characters extracted from the region.
    pub residual_chars: usize,
}

/// Result of a redaction run. `output_path` is present only on full
/// success; partial redaction is never surfaced.
#[derive(Debug)]
pub struct RedactionOutcome {
    pub success: bool,
    pub state: RedactionState,
    pub output_path: Option<PathBuf>,
    pub statistics: RunStatistics,
    pub failed_records: Vec<FailedRegion>,
}

/// Applies approved records to a document and verifies removal.
///
/// `reopen` opens a fresh read handle on the staged output for
/// verification; the mutated handle is never trusted to re-extract.
pub fn apply_and_verify<A, R, F>(
    access: &mut A,
    records: &mut [RedactionRecord],
    options: &RedactionOptions,
    output_path: &Path,
    reopen: F,
) -> ExpungeResult<RedactionOutcome>
where
    A: PdfAccess,
    R: PdfAccess,
    F: FnOnce(&Path) -> ExpungeResult<R>,
{
    let started = Instant::now();

    if records.is_empty() {
        return Err(ExpungeError::validation(
            "records",
            "no approved redaction records supplied",
        ));
    }

    let origin = access.coordinate_origin();
    let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        by_page.entry(record.page_number).or_default().push(idx);
    }

    // Pending -> Applying.
    debug!(
        "applying {} record(s) across {} page(s)",
        records.len(),
        by_page.len()
    );

    let mut applied = 0usize;
    let mut per_record_micros: u128 = 0;

    for (&page, indices) in &by_page {
        let page_started = Instant::now();
        let dims = access.page_dimensions(page)?;

        for &idx in indices {
            let region = records[idx]
                .region
                .expand_margins(options.margin, Some(&dims));
            // The single explicit conversion at the backend boundary.
            let translated =
                region.convert_origin(CoordinateOrigin::TopLeft, origin, dims.height);
            access.mark_region(page, &translated, &options.style)?;
            applied += 1;
        }

        // Physically rewrite this page's content stream.
        access.apply_and_flatten(page)?;

        // Page-level time is split evenly across the page's records.
        per_record_micros += page_started.elapsed().as_micros();
    }

    // Stage the output; it only becomes visible after verification.
    let staging = staging_path(output_path);
    if let Err(e) = access.save(&staging) {
        discard_staging(&staging);
        return Err(e);
    }

    // An error while verifying must also withdraw the staged file: the
    // document has been mutated and nothing has confirmed the removal.
    let failed = match verify_regions(records, options, &staging, reopen) {
        Ok(failed) => failed,
        Err(e) => {
            discard_staging(&staging);
            return Err(e);
        }
    };

    let statistics = RunStatistics {
        total_matches: records.len(),
        redactions_applied: applied,
        pages_affected: by_page.len(),
        average_confidence: records.iter().map(|r| r.confidence).sum::<f64>()
            / records.len() as f64,
        processing_time: started.elapsed(),
        average_time_per_redaction: Duration::from_micros(
            (per_record_micros / records.len().max(1) as u128) as u64,
        ),
    };

    if failed.is_empty() {
        fs::rename(&staging, output_path).map_err(|e| ExpungeError::Io {
            path: output_path.to_path_buf(),
            source: e,
        })?;
        for record in records.iter_mut() {
            record.mark_redacted();
        }
        info!(
            "verified {} redaction(s) on {} page(s)",
            applied, statistics.pages_affected
        );
        Ok(RedactionOutcome {
            success: true,
            state: RedactionState::Verified,
            output_path: Some(output_path.to_path_buf()),
            statistics,
            failed_records: Vec::new(),
        })
    } else {
        // Fail closed: the modified file is withdrawn, not surfaced.
        discard_staging(&staging);
        warn!(
            "verification failed for {} of {} region(s)",
            failed.len(),
            records.len()
        );
        Ok(RedactionOutcome {
            success: false,
            state: RedactionState::Failed,
            output_path: None,
            statistics,
            failed_records: failed,
        })
    }
}

/// Re-extracts text inside every redacted region of the staged output and
/// reports each region that still contains text.
fn verify_regions<R, F>(
    records: &[RedactionRecord],
    options: &RedactionOptions,
    staging: &Path,
    reopen: F,
) -> ExpungeResult<Vec<FailedRegion>>
where
    R: PdfAccess,
    F: FnOnce(&Path) -> ExpungeResult<R>,
{
    let reader = reopen(staging)?;
    let origin = reader.coordinate_origin();
    let mut failed = Vec::new();

    for record in records {
        let dims = reader.page_dimensions(record.page_number)?;
        let region = record
            .region
            .expand_margins(options.margin, Some(&dims))
            .convert_origin(CoordinateOrigin::TopLeft, origin, dims.height);

        let residual = reader.extract_text(record.page_number, Some(&region))?;
        let residual = residual.trim();
        if !residual.is_empty() {
            failed.push(FailedRegion {
                term: record.term.clone(),
                matched_text: record.matched_text.clone(),
                page_number: record.page_number,
                residual_chars: residual.chars().count(),
            });
        }
    }

    Ok(failed)
}

fn discard_staging(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove staged output '{}': {e}", staging.display()),
    }
}

fn staging_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".staged");
    output.with_file_name(name)
}
