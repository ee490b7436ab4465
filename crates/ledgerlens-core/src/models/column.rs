//! Table structure models: column boundaries and table regions.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::geometry::Line;

/// Semantic role assigned to a detected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Transaction date
    Date,
    /// Narrative / payee text
    Description,
    /// Money out
    Debit,
    /// Money in
    Credit,
    /// Running balance
    Balance,
    /// Cheque / transfer / document reference
    Reference,
    /// Merged amount column disambiguated per row by DR/CR or sign
    Amount,
    /// Value date (interest date), distinct from posting date
    ValueDate,
    /// Role could not be determined
    Unknown,
}

impl ColumnType {
    /// Whether the column is expected to hold monetary values.
    pub fn is_monetary(&self) -> bool {
        matches!(
            self,
            Self::Debit | Self::Credit | Self::Balance | Self::Amount
        )
    }
}

/// A vertical strip of the page holding one column of table data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBoundary {
    /// Left edge
    pub x0: f64,
    /// Right edge, strictly greater than `x0`
    pub x1: f64,
    /// Semantic role
    pub inferred_type: ColumnType,
    /// Classification confidence in 0..=1
    pub confidence: f64,
}

impl ColumnBoundary {
    /// Create a boundary, rejecting inverted extents.
    pub fn new(x0: f64, x1: f64) -> EngineResult<Self> {
        if x0 >= x1 {
            return Err(EngineError::structural(format!(
                "column boundary with x0 {x0} >= x1 {x1}"
            )));
        }
        Ok(Self {
            x0,
            x1,
            inferred_type: ColumnType::Unknown,
            confidence: 0.0,
        })
    }

    /// Horizontal center of the column.
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Column width.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Annotate with a role and confidence.
    pub fn with_type(mut self, inferred_type: ColumnType, confidence: f64) -> Self {
        self.inferred_type = inferred_type;
        self.confidence = confidence;
        self
    }

    /// Whether a fragment belongs to this column: its center lies inside,
    /// or at least `overlap_threshold` of its width overlaps the strip.
    pub fn contains_fragment(&self, bbox: &crate::geometry::BoundingBox, overlap_threshold: f64) -> bool {
        let center = bbox.center_x();
        if center >= self.x0 && center < self.x1 {
            return true;
        }
        if bbox.width <= 0.0 {
            return false;
        }
        bbox.overlap_x(self.x0, self.x1) / bbox.width >= overlap_threshold
    }
}

/// A contiguous span of lines recognized as tabular data.
///
/// Spans multiple pages when the same boundary layout recurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Top edge over the region's lines
    pub top: f64,
    /// Bottom edge over the region's lines
    pub bottom: f64,
    /// Leftmost edge
    pub left: f64,
    /// Rightmost edge
    pub right: f64,
    /// Data lines in source order
    pub data_lines: Vec<Line>,
    /// Detected column layout, sorted left to right
    pub column_boundaries: Vec<ColumnBoundary>,
    /// Pages the region spans, ascending
    pub page_numbers: Vec<u32>,
    /// Detection confidence in 0..=1; degraded fallback regions score <= 0.3
    pub confidence: f64,
}

impl TableRegion {
    /// Build a region from its lines, deriving extents and page coverage.
    pub fn from_lines(data_lines: Vec<Line>, confidence: f64) -> EngineResult<Self> {
        if data_lines.is_empty() {
            return Err(EngineError::structural("table region with zero lines"));
        }
        let top = data_lines.iter().map(Line::top).fold(f64::INFINITY, f64::min);
        let bottom = data_lines
            .iter()
            .map(Line::bottom)
            .fold(f64::NEG_INFINITY, f64::max);
        let left = data_lines.iter().map(Line::left).fold(f64::INFINITY, f64::min);
        let right = data_lines
            .iter()
            .map(Line::right)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut page_numbers: Vec<u32> = data_lines.iter().map(|l| l.page_number).collect();
        page_numbers.sort_unstable();
        page_numbers.dedup();
        Ok(Self {
            top,
            bottom,
            left,
            right,
            data_lines,
            column_boundaries: Vec::new(),
            page_numbers,
            confidence,
        })
    }

    /// Average fragment count per line, used for density classification.
    pub fn avg_fragments_per_line(&self) -> f64 {
        if self.data_lines.is_empty() {
            return 0.0;
        }
        let total: usize = self.data_lines.iter().map(Line::len).sum();
        total as f64 / self.data_lines.len() as f64
    }
}
