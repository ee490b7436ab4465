//! Raw extracted rows: per-column source text before any parsing.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;
use crate::models::ColumnType;

/// Source geometry for one extracted cell: the union box of the fragments
/// that produced it. Feeds the provenance ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSource {
    /// Column the cell belongs to
    pub column: ColumnType,
    /// Page of the source fragments
    pub page_number: u32,
    /// Union of the source fragment boxes
    pub bounding_box: BoundingBox,
    /// Concatenated source text, untrimmed
    pub text: String,
}

/// One table line mapped to column cells.
///
/// Every field is the untrimmed concatenation of the source fragments that
/// fell inside the column, in X order. `None` means the cell was empty on
/// the page, which is distinct from a cell that failed to parse later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Page the line was read from
    pub page_number: u32,
    /// Raw date-cell text
    pub raw_date: Option<String>,
    /// Raw description-cell text
    pub raw_description: Option<String>,
    /// Raw debit-cell text
    pub raw_debit: Option<String>,
    /// Raw credit-cell text
    pub raw_credit: Option<String>,
    /// Raw merged-amount-cell text (single-amount layouts)
    pub raw_amount: Option<String>,
    /// Raw balance-cell text
    pub raw_balance: Option<String>,
    /// Raw reference-cell text
    pub raw_reference: Option<String>,
    /// Raw value-date-cell text
    pub raw_value_date: Option<String>,
    /// Lowest OCR confidence over the source line, if OCR was involved
    pub ocr_confidence: Option<f64>,
    /// Source geometry per populated cell
    pub sources: Vec<CellSource>,
    /// Full source line text, fragments joined by spaces
    pub line_text: String,
    /// Top edge of the source line, used to order rows against marker lines
    pub line_top: f64,
    /// Source line texts after stitching; non-empty iff continuations were
    /// merged in (the row's own line comes first)
    pub stitched_lines: Vec<String>,
    /// Pages contributed by merged continuation lines
    pub extra_page_numbers: Vec<u32>,
}

impl ExtractedRow {
    /// Create an empty row for a page.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }

    /// Read the raw cell for a column role.
    pub fn cell(&self, column: ColumnType) -> Option<&str> {
        match column {
            ColumnType::Date => self.raw_date.as_deref(),
            ColumnType::Description => self.raw_description.as_deref(),
            ColumnType::Debit => self.raw_debit.as_deref(),
            ColumnType::Credit => self.raw_credit.as_deref(),
            ColumnType::Amount => self.raw_amount.as_deref(),
            ColumnType::Balance => self.raw_balance.as_deref(),
            ColumnType::Reference => self.raw_reference.as_deref(),
            ColumnType::ValueDate => self.raw_value_date.as_deref(),
            ColumnType::Unknown => None,
        }
    }

    /// Append text into the cell for a column role, space-separated.
    ///
    /// Text landing in an `Unknown` column is dropped.
    pub fn push_cell(&mut self, column: ColumnType, text: &str) {
        let slot = match column {
            ColumnType::Date => &mut self.raw_date,
            ColumnType::Description => &mut self.raw_description,
            ColumnType::Debit => &mut self.raw_debit,
            ColumnType::Credit => &mut self.raw_credit,
            ColumnType::Amount => &mut self.raw_amount,
            ColumnType::Balance => &mut self.raw_balance,
            ColumnType::Reference => &mut self.raw_reference,
            ColumnType::ValueDate => &mut self.raw_value_date,
            ColumnType::Unknown => return,
        };
        match slot {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }

    /// Append text into a cell and record its source geometry.
    pub fn push_cell_with_source(
        &mut self,
        column: ColumnType,
        text: &str,
        page_number: u32,
        bounding_box: BoundingBox,
    ) {
        if column == ColumnType::Unknown {
            return;
        }
        self.push_cell(column, text);
        match self.sources.iter_mut().find(|s| s.column == column) {
            Some(source) => {
                let x0 = source.bounding_box.x.min(bounding_box.x);
                let y0 = source.bounding_box.y.min(bounding_box.y);
                let x1 = source.bounding_box.right().max(bounding_box.right());
                let y1 = source.bounding_box.bottom().max(bounding_box.bottom());
                if let Ok(merged) = BoundingBox::new(x0, y0, x1 - x0, y1 - y0) {
                    source.bounding_box = merged;
                }
                source.text.push(' ');
                source.text.push_str(text);
            }
            None => self.sources.push(CellSource {
                column,
                page_number,
                bounding_box,
                text: text.to_string(),
            }),
        }
    }

    /// Source geometry for a column's cell, when recorded.
    pub fn source_for(&self, column: ColumnType) -> Option<&CellSource> {
        self.sources.iter().find(|s| s.column == column)
    }

    /// Whether continuation lines were merged into this row.
    pub fn is_stitched(&self) -> bool {
        !self.stitched_lines.is_empty()
    }

    /// All source pages: the row's own page plus continuation pages.
    pub fn all_page_numbers(&self) -> Vec<u32> {
        let mut pages = vec![self.page_number];
        pages.extend(&self.extra_page_numbers);
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// Whether any amount cell (debit, credit, or merged) carries text.
    pub fn has_amount_text(&self) -> bool {
        self.raw_debit.is_some() || self.raw_credit.is_some() || self.raw_amount.is_some()
    }

    /// Whether every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.raw_date.is_none()
            && self.raw_description.is_none()
            && self.raw_debit.is_none()
            && self.raw_credit.is_none()
            && self.raw_amount.is_none()
            && self.raw_balance.is_none()
            && self.raw_reference.is_none()
            && self.raw_value_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_cell_concatenates_in_order() {
        let mut row = ExtractedRow::new(1);
        row.push_cell(ColumnType::Description, "STARBUCKS");
        row.push_cell(ColumnType::Description, "COFFEE");
        assert_eq!(row.raw_description.as_deref(), Some("STARBUCKS COFFEE"));
    }

    #[test]
    fn test_unknown_column_text_is_dropped() {
        let mut row = ExtractedRow::new(1);
        row.push_cell(ColumnType::Unknown, "noise");
        assert!(row.is_blank());
    }

    #[test]
    fn test_has_amount_text() {
        let mut row = ExtractedRow::new(1);
        assert!(!row.has_amount_text());
        row.push_cell(ColumnType::Amount, "120.00 CR");
        assert!(row.has_amount_text());
    }
}
