//! Error types for the redaction pipeline.
//!
//! The taxonomy distinguishes errors the caller must see (validation,
//! verification) from per-unit failures that only void one term or one
//! box while the rest of the batch continues.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type ExpungeResult<T> = Result<T, ExpungeError>;

/// Error type covering every stage of the pipeline.
#[derive(Debug, Error)]
pub enum ExpungeError {
    /// Bad search term, coordinates, or weights. Always surfaced to the caller.
    #[error("validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// One term or one page failed during matching. The unit's contribution
    /// is empty; other units continue.
    #[error("matching failed for '{unit}': {reason}")]
    RecoverableMatch { unit: String, reason: String },

    /// A box failed geometric validation. The box is dropped, not escalated.
    #[error("invalid geometry: {0}")]
    Geometry(String),

    /// Residual text was found inside a redacted region. Fatal for the
    /// whole document; no partially-redacted file is surfaced.
    #[error("redaction verification failed: {failed_regions} region(s) still contain text")]
    VerificationFailure { failed_regions: usize },

    /// Invalid configuration that could not be auto-corrected.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// File system failure.
    #[error("IO error for path '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failure inside the PDF access layer (MuPDF or a test double).
    #[error("{backend} backend error: {message}")]
    PdfBackend { backend: String, message: String },

    /// Text could not be extracted from a page.
    #[error("text extraction failed on page {page}: {reason}")]
    TextExtraction { page: u32, reason: String },
}

impl ExpungeError {
    /// Convenience constructor for validation failures.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for per-unit matching failures.
    pub fn recoverable(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RecoverableMatch {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for backend failures.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PdfBackend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// True when the error only voids a single unit of work.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RecoverableMatch { .. } | Self::Geometry(_))
    }
}
