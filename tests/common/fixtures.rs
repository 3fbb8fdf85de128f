//! Test fixtures: an in-memory PDF access double.
//!
//! `FakePdf` stands in for a real PDF backend: pages hold positioned
//! words, marking a region stages it, and apply-and-flatten removes every
//! word whose center falls inside a staged region. Saving serializes the
//! document to disk so the verifier's reopen-and-re-extract cycle works
//! against a real file, exactly as it does with MuPDF.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use expunge::{
    BoundingBox, CoordinateOrigin, ExpungeError, ExpungeResult, PageDimensions, PageText,
    PdfAccess, RegionStyle,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Word {
    text: String,
    region: BoundingBox,
    /// A sticky word survives flattening, simulating a backend that
    /// failed to scrub a region.
    sticky: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FakePage {
    dims: PageDimensions,
    words: Vec<Word>,
    #[serde(default)]
    marked: Vec<BoundingBox>,
}

/// In-memory document implementing [`PdfAccess`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakePdf {
    origin: CoordinateOrigin,
    pages: BTreeMap<u32, FakePage>,
}

/// Builder for fake documents.
///
/// # Example
///
/// ```ignore
/// let pdf = FakePdfBuilder::new()
///     .page(1, 300.0, 200.0)
///     .word(1, "EMAIL", 50.0, 20.0, 40.0, 10.0)
///     .build();
/// ```
pub struct FakePdfBuilder {
    pdf: FakePdf,
}

impl Default for FakePdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePdfBuilder {
    pub fn new() -> Self {
        Self {
            pdf: FakePdf {
                origin: CoordinateOrigin::TopLeft,
                pages: BTreeMap::new(),
            },
        }
    }

    /// Sets the document's native coordinate origin. Boxes passed to
    /// `word` are interpreted in this convention.
    pub fn origin(mut self, origin: CoordinateOrigin) -> Self {
        self.pdf.origin = origin;
        self
    }

    pub fn page(mut self, number: u32, width: f64, height: f64) -> Self {
        self.pdf.pages.insert(
            number,
            FakePage {
                dims: PageDimensions::new(width, height),
                words: Vec::new(),
                marked: Vec::new(),
            },
        );
        self
    }

    pub fn word(self, page: u32, text: &str, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.add_word(page, text, x, y, w, h, false)
    }

    /// Adds a word that survives flattening.
    pub fn sticky_word(self, page: u32, text: &str, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.add_word(page, text, x, y, w, h, true)
    }

    fn add_word(mut self, page: u32, text: &str, x: f64, y: f64, w: f64, h: f64, sticky: bool) -> Self {
        let region = BoundingBox::new(x, y, w, h, page).expect("valid word box");
        self.pdf
            .pages
            .get_mut(&page)
            .expect("page must be declared before its words")
            .words
            .push(Word {
                text: text.to_string(),
                region,
                sticky,
            });
        self
    }

    pub fn build(self) -> FakePdf {
        self.pdf
    }
}

impl FakePdf {
    /// Loads a document previously written by [`PdfAccess::save`].
    pub fn load(path: &Path) -> ExpungeResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| ExpungeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ExpungeError::PdfBackend {
                backend: "FakePdf".to_string(),
                message: format!("failed to parse '{}': {e}", path.display()),
            })
    }

    /// Page texts in reading order, for feeding the matching engine.
    pub fn page_texts(&self) -> Vec<PageText> {
        self.pages
            .iter()
            .map(|(&n, page)| {
                let text = page
                    .words
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                PageText::new(n, text)
            })
            .collect()
    }

    /// All surviving word texts on a page.
    pub fn words_on_page(&self, page: u32) -> Vec<String> {
        self.pages
            .get(&page)
            .map(|p| p.words.iter().map(|w| w.text.clone()).collect())
            .unwrap_or_default()
    }

    fn page(&self, page: u32) -> ExpungeResult<&FakePage> {
        self.pages.get(&page).ok_or_else(|| ExpungeError::PdfBackend {
            backend: "FakePdf".to_string(),
            message: format!("no such page {page}"),
        })
    }

    fn page_mut(&mut self, page: u32) -> ExpungeResult<&mut FakePage> {
        self.pages
            .get_mut(&page)
            .ok_or_else(|| ExpungeError::PdfBackend {
                backend: "FakePdf".to_string(),
                message: format!("no such page {page}"),
            })
    }
}

fn center_in(region: &BoundingBox, target: &BoundingBox) -> bool {
    let cx = region.x + region.width / 2.0;
    let cy = region.y + region.height / 2.0;
    cx >= target.x
        && cx <= target.x + target.width
        && cy >= target.y
        && cy <= target.y + target.height
}

impl PdfAccess for FakePdf {
    fn backend_name(&self) -> &'static str {
        "FakePdf"
    }

    fn coordinate_origin(&self) -> CoordinateOrigin {
        self.origin
    }

    fn page_count(&self) -> ExpungeResult<u32> {
        Ok(self.pages.keys().max().copied().unwrap_or(0))
    }

    fn page_dimensions(&self, page: u32) -> ExpungeResult<PageDimensions> {
        Ok(self.page(page)?.dims)
    }

    fn search(&self, page: u32, needle: &str, max_hits: u32) -> ExpungeResult<Vec<BoundingBox>> {
        let needle_words: Vec<String> = needle
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if needle_words.is_empty() {
            return Ok(Vec::new());
        }

        let page_ref = self.page(page)?;
        let mut hits = Vec::new();

        for window in page_ref.words.windows(needle_words.len()) {
            let matches = window
                .iter()
                .zip(&needle_words)
                .all(|(w, n)| w.text.to_lowercase().trim_matches(|c: char| !c.is_alphanumeric()) == *n
                    || w.text.to_lowercase() == *n);
            if matches {
                let merged = window
                    .iter()
                    .skip(1)
                    .fold(window[0].region, |acc, w| acc.union(&w.region));
                hits.push(merged);
                if hits.len() as u32 >= max_hits {
                    break;
                }
            }
        }

        Ok(hits)
    }

    fn mark_region(
        &mut self,
        page: u32,
        region: &BoundingBox,
        _style: &RegionStyle,
    ) -> ExpungeResult<()> {
        self.page_mut(page)?.marked.push(*region);
        Ok(())
    }

    fn apply_and_flatten(&mut self, page: u32) -> ExpungeResult<()> {
        let page_ref = self.page_mut(page)?;
        let marked = std::mem::take(&mut page_ref.marked);
        page_ref
            .words
            .retain(|w| w.sticky || !marked.iter().any(|m| center_in(&w.region, m)));
        Ok(())
    }

    fn extract_text(&self, page: u32, clip: Option<&BoundingBox>) -> ExpungeResult<String> {
        let page_ref = self.page(page)?;
        let text = page_ref
            .words
            .iter()
            .filter(|w| match clip {
                None => true,
                Some(clip) => center_in(&w.region, clip),
            })
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(text)
    }

    fn save(&mut self, out_path: &Path) -> ExpungeResult<()> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| ExpungeError::PdfBackend {
            backend: "FakePdf".to_string(),
            message: format!("serialization failed: {e}"),
        })?;
        std::fs::write(out_path, bytes).map_err(|e| ExpungeError::Io {
            path: out_path.to_path_buf(),
            source: e,
        })
    }
}
