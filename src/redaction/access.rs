//! PDF access layer boundary.
//!
//! The pipeline's canonical origin is top-left; [`PdfAccess::coordinate_origin`]
//! tells the applier whether a conversion is needed, and that conversion
//! happens exactly once, at this boundary.
//!
//! The production implementation uses MuPDF's redaction API: marking a
//! region creates a redaction annotation, and apply-and-flatten physically
//! rewrites the page content stream so the text cannot be recovered.

use std::path::{Path, PathBuf};

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::{Rect as MuRect, TextPageOptions};

use crate::error::{ExpungeError, ExpungeResult};
use crate::geometry::{BoundingBox, BoxSource, CoordinateOrigin, PageDimensions};

/// Visual style of a redaction region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStyle {
    /// Fill color as RGB in [0, 1].
    pub fill: [f32; 3],
}

impl Default for RegionStyle {
    fn default() -> Self {
        Self { fill: [0.0, 0.0, 0.0] }
    }
}

/// Operations the redaction core needs from a PDF backend.
///
/// Page numbers are 1-based, matching [`crate::matching::PageText`].
pub trait PdfAccess {
    /// Backend name used in error reporting.
    fn backend_name(&self) -> &'static str;

    /// Origin convention of the backend's coordinates.
    fn coordinate_origin(&self) -> CoordinateOrigin;

    fn page_count(&self) -> ExpungeResult<u32>;

    fn page_dimensions(&self, page: u32) -> ExpungeResult<PageDimensions>;

    /// Locates literal text on a page, returning geometry in the
    /// backend's coordinate convention.
    fn search(&self, page: u32, needle: &str, max_hits: u32) -> ExpungeResult<Vec<BoundingBox>>;

    /// Marks a region for permanent removal. An annotation-based deletion,
    /// not a visual overlay; nothing is removed until
    /// [`apply_and_flatten`](Self::apply_and_flatten).
    fn mark_region(&mut self, page: u32, region: &BoundingBox, style: &RegionStyle)
        -> ExpungeResult<()>;

    /// Applies all marked regions on a page, physically rewriting its
    /// content stream.
    fn apply_and_flatten(&mut self, page: u32) -> ExpungeResult<()>;

    /// Extracts text from a page, restricted to `clip` when given.
    fn extract_text(&self, page: u32, clip: Option<&BoundingBox>) -> ExpungeResult<String>;

    fn save(&mut self, out_path: &Path) -> ExpungeResult<()>;
}

/// MuPDF-backed access layer.
///
/// MuPDF normalizes page coordinates to a y-down, top-left origin, so no
/// conversion is needed against the pipeline's canonical system.
pub struct MuPdfAccess {
    doc: PdfDocument,
    path: PathBuf,
}

impl MuPdfAccess {
    pub fn open(path: &Path) -> ExpungeResult<Self> {
        let path_str = path.to_str().ok_or_else(|| {
            ExpungeError::validation("path", "path contains invalid UTF-8")
        })?;
        let doc = PdfDocument::open(path_str).map_err(|e| {
            ExpungeError::backend("MuPDF", format!("failed to open '{}': {e}", path.display()))
        })?;
        Ok(Self {
            doc,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_page(&self, page: u32) -> ExpungeResult<mupdf::Page> {
        if page == 0 {
            return Err(ExpungeError::validation("page", "page numbers are 1-based"));
        }
        self.doc.load_page(page as i32 - 1).map_err(|e| {
            ExpungeError::backend("MuPDF", format!("failed to load page {page}: {e}"))
        })
    }

    fn load_pdf_page(&self, page: u32) -> ExpungeResult<PdfPage> {
        let raw = self.load_page(page)?;
        PdfPage::try_from(raw).map_err(|e| {
            ExpungeError::backend("MuPDF", format!("page {page} is not a PDF page: {e}"))
        })
    }
}

impl PdfAccess for MuPdfAccess {
    fn backend_name(&self) -> &'static str {
        "MuPDF"
    }

    fn coordinate_origin(&self) -> CoordinateOrigin {
        CoordinateOrigin::TopLeft
    }

    fn page_count(&self) -> ExpungeResult<u32> {
        let count = self.doc.page_count().map_err(|e| {
            ExpungeError::backend("MuPDF", format!("failed to get page count: {e}"))
        })?;
        Ok(count.max(0) as u32)
    }

    fn page_dimensions(&self, page: u32) -> ExpungeResult<PageDimensions> {
        let bounds = self.load_page(page)?.bounds().map_err(|e| {
            ExpungeError::backend("MuPDF", format!("failed to get bounds of page {page}: {e}"))
        })?;
        Ok(PageDimensions::new(
            (bounds.x1 - bounds.x0) as f64,
            (bounds.y1 - bounds.y0) as f64,
        ))
    }

    fn search(&self, page: u32, needle: &str, max_hits: u32) -> ExpungeResult<Vec<BoundingBox>> {
        let raw = self.load_page(page)?;
        let quads = raw.search(needle, max_hits).map_err(|e| {
            ExpungeError::backend("MuPDF", format!("search failed for '{needle}': {e}"))
        })?;

        let mut boxes = Vec::with_capacity(quads.len());
        for quad in quads {
            let x0 = quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x) as f64;
            let y0 = quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y) as f64;
            let x1 = quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x) as f64;
            let y1 = quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y) as f64;
            if x1 <= x0 || y1 <= y0 {
                continue;
            }
            let b = BoundingBox::new(x0.max(0.0), y0.max(0.0), x1 - x0, y1 - y0, page)?
                .with_source(BoxSource::TextLayer);
            boxes.push(b);
        }
        Ok(boxes)
    }

    fn mark_region(
        &mut self,
        page: u32,
        region: &BoundingBox,
        _style: &RegionStyle,
    ) -> ExpungeResult<()> {
        let mut pdf_page = self.load_pdf_page(page)?;
        let annot = pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| {
                ExpungeError::backend(
                    "MuPDF",
                    format!("failed to create redaction annotation on page {page}: {e}"),
                )
            })?;

        let rect = MuRect {
            x0: region.x as f32,
            y0: region.y as f32,
            x1: (region.x + region.width) as f32,
            y1: (region.y + region.height) as f32,
        };
        unsafe {
            ffi::set_annotation_rect(&annot, rect);
        }
        Ok(())
    }

    fn apply_and_flatten(&mut self, page: u32) -> ExpungeResult<()> {
        let mut pdf_page = self.load_pdf_page(page)?;
        pdf_page.redact().map_err(|e| {
            ExpungeError::backend(
                "MuPDF",
                format!("failed to apply redactions on page {page}: {e}"),
            )
        })?;
        Ok(())
    }

    fn extract_text(&self, page: u32, clip: Option<&BoundingBox>) -> ExpungeResult<String> {
        let raw = self.load_page(page)?;
        let text_page = raw
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| ExpungeError::TextExtraction {
                page,
                reason: e.to_string(),
            })?;

        let mut out = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let mut line_text = String::new();
                for ch in line.chars() {
                    let quad = ch.quad();
                    let keep = match clip {
                        None => true,
                        Some(clip) => {
                            let cx = ((quad.ul.x + quad.lr.x) / 2.0) as f64;
                            let cy = ((quad.ul.y + quad.lr.y) / 2.0) as f64;
                            cx >= clip.x
                                && cx <= clip.x + clip.width
                                && cy >= clip.y
                                && cy <= clip.y + clip.height
                        }
                    };
                    if keep {
                        if let Some(c) = ch.char() {
                            line_text.push(c);
                        }
                    }
                }
                if !line_text.trim().is_empty() {
                    out.push_str(line_text.trim_end());
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    fn save(&mut self, out_path: &Path) -> ExpungeResult<()> {
        let out_str = out_path.to_str().ok_or_else(|| {
            ExpungeError::validation("output", "path contains invalid UTF-8")
        })?;
        self.doc.save(out_str).map_err(|e| {
            ExpungeError::backend(
                "MuPDF",
                format!("failed to save '{}': {e}", out_path.display()),
            )
        })
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// Uses unsafe FFI calls into MuPDF's C API. The annotation must be
    /// valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
