//! Page geometry: axis-aligned bounding boxes for redaction regions.
//!
//! All operations are pure and thread-safe. The canonical internal origin
//! is top-left (matching on-screen and OCR conventions); conversion to a
//! backend's origin happens exactly once, at the PDF access boundary.

use serde::{Deserialize, Serialize};

use crate::error::{ExpungeError, ExpungeResult};

/// Where a box's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxSource {
    #[default]
    TextLayer,
    Ocr,
    Fallback,
}

/// Coordinate-system origin convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrigin {
    /// y grows downward from the top-left corner (screen/OCR convention).
    TopLeft,
    /// y grows upward from the bottom-left corner (PDF native convention).
    BottomLeft,
}

/// Width and height of a page, in the same units as its boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle on a specific page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page_number: u32,
    /// Confidence that the box covers the intended text.
    pub confidence: f64,
    pub source: BoxSource,
}

impl BoundingBox {
    /// Creates a box, rejecting negative origins and non-positive extents.
    pub fn new(x: f64, y: f64, width: f64, height: f64, page_number: u32) -> ExpungeResult<Self> {
        if x < 0.0 || y < 0.0 {
            return Err(ExpungeError::Geometry(format!(
                "negative origin ({x}, {y}) on page {page_number}"
            )));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(ExpungeError::Geometry(format!(
                "non-positive extent {width}x{height} on page {page_number}"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
            page_number,
            confidence: 1.0,
            source: BoxSource::default(),
        })
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_source(mut self, source: BoxSource) -> Self {
        self.source = source;
        self
    }

    /// True when the box lies entirely within the page.
    pub fn validate(&self, dims: &PageDimensions) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= dims.width
            && self.y + self.height <= dims.height
    }

    /// True when both axis projections intersect after expanding each box
    /// by `tolerance`. Boxes on different pages never overlap.
    pub fn overlaps(&self, other: &BoundingBox, tolerance: f64) -> bool {
        if self.page_number != other.page_number {
            return false;
        }
        let x_overlap = self.x - tolerance < other.x + other.width + tolerance
            && self.x + self.width + tolerance > other.x - tolerance;
        let y_overlap = self.y - tolerance < other.y + other.height + tolerance
            && self.y + self.height + tolerance > other.y - tolerance;
        x_overlap && y_overlap
    }

    /// Minimal enclosing rectangle of two same-page boxes. The merged box
    /// keeps the lower confidence of the pair.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        BoundingBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
            page_number: self.page_number,
            confidence: self.confidence.min(other.confidence),
            source: self.source,
        }
    }

    /// Grows the box symmetrically by `margin` on each side, clipping to
    /// the page when dimensions are supplied. Never produces negative
    /// coordinates.
    pub fn expand_margins(&self, margin: f64, dims: Option<&PageDimensions>) -> BoundingBox {
        let x = (self.x - margin).max(0.0);
        let y = (self.y - margin).max(0.0);
        let mut right = self.x + self.width + margin;
        let mut bottom = self.y + self.height + margin;
        if let Some(dims) = dims {
            right = right.min(dims.width);
            bottom = bottom.min(dims.height);
        }
        BoundingBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
            ..*self
        }
    }

    /// Scales all four numeric fields by `to_dpi / from_dpi`.
    pub fn normalize_dpi(&self, from_dpi: f64, to_dpi: f64) -> ExpungeResult<BoundingBox> {
        if from_dpi <= 0.0 || to_dpi <= 0.0 {
            return Err(ExpungeError::Geometry(format!(
                "invalid DPI conversion {from_dpi} -> {to_dpi}"
            )));
        }
        let scale = to_dpi / from_dpi;
        Ok(BoundingBox {
            x: self.x * scale,
            y: self.y * scale,
            width: self.width * scale,
            height: self.height * scale,
            ..*self
        })
    }

    /// Converts between top-left and bottom-left origin systems via
    /// `y' = page_height - (y + height)`. The transform is its own
    /// inverse: converting twice reproduces the original box.
    pub fn convert_origin(
        &self,
        from: CoordinateOrigin,
        to: CoordinateOrigin,
        page_height: f64,
    ) -> BoundingBox {
        if from == to {
            return *self;
        }
        BoundingBox {
            y: page_height - (self.y + self.height),
            ..*self
        }
    }
}

/// Merges overlapping same-page boxes into minimal enclosing rectangles,
/// repeating until no overlaps remain. The result has at most as many
/// boxes as the input, and the operation is idempotent.
pub fn merge_overlapping(boxes: Vec<BoundingBox>, tolerance: f64) -> Vec<BoundingBox> {
    let mut current = boxes;

    loop {
        current.sort_by(|a, b| {
            (a.page_number, a.y, a.x)
                .partial_cmp(&(b.page_number, b.y, b.x))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut merged: Vec<BoundingBox> = Vec::with_capacity(current.len());
        let mut changed = false;

        for b in current.drain(..) {
            if let Some(target) = merged.iter_mut().find(|m| m.overlaps(&b, tolerance)) {
                *target = target.union(&b);
                changed = true;
            } else {
                merged.push(b);
            }
        }

        if !changed {
            return merged;
        }
        current = merged;
    }
}
