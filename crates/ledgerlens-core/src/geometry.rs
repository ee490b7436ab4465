//! Positioned-text geometry: bounding boxes, text fragments, and logical lines.
//!
//! All coordinates are PDF user-space units with the origin at the top-left
//! of the page, so a smaller `y` is visually higher.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Axis-aligned bounding box in PDF user-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width, non-negative
    pub width: f64,
    /// Height, non-negative
    pub height: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting negative extents.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> EngineResult<Self> {
        if width < 0.0 || height < 0.0 {
            return Err(EngineError::InvalidBoundingBox { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical center.
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Width of the horizontal overlap with `[x0, x1]`.
    pub fn overlap_x(&self, x0: f64, x1: f64) -> f64 {
        (self.right().min(x1) - self.x.max(x0)).max(0.0)
    }
}

/// Origin of a text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Embedded PDF text
    Native,
    /// Recognized by OCR
    Ocr,
}

/// One positioned text run extracted from the PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Raw text content, non-empty after trim
    pub text: String,
    /// Position on the page
    pub bounding_box: BoundingBox,
    /// 1-based page number
    pub page_number: u32,
    /// OCR confidence in 0..=1, absent for native text
    pub confidence: Option<f64>,
    /// Whether the text came from the PDF text layer or OCR
    pub source: TextSource,
}

impl TextFragment {
    /// Create a native-text fragment.
    pub fn native(text: impl Into<String>, bounding_box: BoundingBox, page_number: u32) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            page_number,
            confidence: None,
            source: TextSource::Native,
        }
    }

    /// Create an OCR fragment with a recognition confidence.
    pub fn ocr(
        text: impl Into<String>,
        bounding_box: BoundingBox,
        page_number: u32,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            page_number,
            confidence: Some(confidence),
            source: TextSource::Ocr,
        }
    }

    /// Whether the fragment carries any visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Validate page number and box extents.
    pub fn validate(&self) -> EngineResult<()> {
        if self.page_number < 1 {
            return Err(EngineError::InvalidPageNumber(self.page_number));
        }
        if self.bounding_box.width < 0.0 || self.bounding_box.height < 0.0 {
            return Err(EngineError::InvalidBoundingBox {
                width: self.bounding_box.width,
                height: self.bounding_box.height,
            });
        }
        Ok(())
    }
}

/// An ordered sequence of fragments sharing a page and Y-position.
///
/// Fragments are sorted by `x` ascending; all share `page_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Fragments left to right
    pub fragments: Vec<TextFragment>,
    /// Page the line belongs to
    pub page_number: u32,
}

impl Line {
    /// Build a line from fragments, sorting them left to right.
    ///
    /// All fragments must share the same page.
    pub fn new(mut fragments: Vec<TextFragment>) -> EngineResult<Self> {
        let page_number = fragments
            .first()
            .map(|f| f.page_number)
            .ok_or_else(|| EngineError::structural("line built from zero fragments"))?;
        if fragments.iter().any(|f| f.page_number != page_number) {
            return Err(EngineError::structural(
                "line fragments span multiple pages",
            ));
        }
        fragments.sort_by(|a, b| {
            a.bounding_box
                .x
                .partial_cmp(&b.bounding_box.x)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Self {
            fragments,
            page_number,
        })
    }

    /// Topmost edge over all fragments.
    pub fn top(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.bounding_box.y)
            .fold(f64::INFINITY, f64::min)
    }

    /// Bottommost edge over all fragments.
    pub fn bottom(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.bounding_box.bottom())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Leftmost edge over all fragments.
    pub fn left(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.bounding_box.x)
            .fold(f64::INFINITY, f64::min)
    }

    /// Rightmost edge over all fragments.
    pub fn right(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.bounding_box.right())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Number of fragments in the line.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the line has no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Full line text, fragments joined by a single space.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lowest OCR confidence over the line's fragments, if any are OCR.
    pub fn min_ocr_confidence(&self) -> Option<f64> {
        self.fragments
            .iter()
            .filter_map(|f| f.confidence)
            .fold(None, |acc, c| {
                Some(match acc {
                    Some(prev) => c.min(prev),
                    None => c,
                })
            })
    }
}
