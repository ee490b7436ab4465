//! Document and segment models: the engine's final output shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{ExtractedStatementHeader, StatementPeriod, Transaction, ValidationStatus};

/// Detected ordering of dates in the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// Dates increase down the page
    Ascending,
    /// Dates decrease down the page (newest first)
    Descending,
    /// No dominant direction
    Mixed,
    /// Too few parseable dates to decide
    #[default]
    Unknown,
}

/// One logical statement inside a possibly multi-statement document.
///
/// Segments are delimited by opening-balance marker rows; most documents
/// hold exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSegment {
    /// Zero-based position within the document
    pub segment_index: usize,
    /// First source page
    pub start_page: u32,
    /// Last source page
    pub end_page: u32,
    /// Opening balance from the marker row, when present
    pub opening_balance: Option<Decimal>,
    /// Closing balance from a marker row or the last transaction
    pub closing_balance: Option<Decimal>,
    /// Masked account number, when the segment declares its own
    pub account_number: Option<String>,
    /// Statement period, when declared
    pub statement_period: Option<StatementPeriod>,
    /// Transactions in final (ascending) order
    pub transactions: Vec<Transaction>,
}

impl DocumentSegment {
    /// Create an empty segment.
    pub fn new(segment_index: usize, start_page: u32) -> Self {
        Self {
            segment_index,
            start_page,
            end_page: start_page,
            opening_balance: None,
            closing_balance: None,
            account_number: None,
            statement_period: None,
            transactions: Vec::new(),
        }
    }

    /// Sum of all credits.
    pub fn total_credits(&self) -> Decimal {
        self.transactions
            .iter()
            .filter_map(|t| t.credit)
            .sum::<Decimal>()
    }

    /// Sum of all debits.
    pub fn total_debits(&self) -> Decimal {
        self.transactions
            .iter()
            .filter_map(|t| t.debit)
            .sum::<Decimal>()
    }

    /// Worst validation status over the segment's rows, folded with the
    /// closing-balance check outcome computed by the validator.
    pub fn worst_row_status(&self) -> ValidationStatus {
        self.transactions
            .iter()
            .map(|t| t.validation_status)
            .fold(ValidationStatus::Valid, ValidationStatus::worst)
    }
}

/// Counts of transactions by validation outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// All transactions
    pub total: usize,
    /// Rows marked valid
    pub valid: usize,
    /// Rows marked warning
    pub warning: usize,
    /// Rows marked error
    pub error: usize,
}

impl DocumentTotals {
    /// Tally statuses over a transaction list.
    pub fn tally<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = Self::default();
        for tx in transactions {
            totals.total += 1;
            match tx.validation_status {
                ValidationStatus::Valid => totals.valid += 1,
                ValidationStatus::Warning => totals.warning += 1,
                ValidationStatus::Error => totals.error += 1,
                ValidationStatus::Unchecked => {}
            }
        }
        totals
    }
}

/// The fully parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Opaque caller-supplied identifier
    pub file_name: String,
    /// Page count observed in the input fragments
    pub total_pages: u32,
    /// Detected or configured locale code
    pub detected_locale: String,
    /// Logical statements in source page order
    pub segments: Vec<DocumentSegment>,
    /// Transaction counts by status
    pub totals: DocumentTotals,
    /// Worst validation status over all segments
    pub overall_validation: ValidationStatus,
    /// Date ordering observed in the source
    pub date_order: DateOrder,
    /// Whether chronology normalization reversed the document
    pub was_reversed: bool,
    /// Account metadata from the top of page 1
    pub extracted_header: ExtractedStatementHeader,
    /// Pre-segmentation transaction list, kept as a fallback view
    pub raw_transactions: Vec<Transaction>,
}

impl ParsedDocument {
    /// Create an empty document for degraded outputs.
    pub fn empty(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            total_pages: 0,
            detected_locale: "en-US".to_string(),
            segments: Vec::new(),
            totals: DocumentTotals::default(),
            overall_validation: ValidationStatus::Unchecked,
            date_order: DateOrder::Unknown,
            was_reversed: false,
            extracted_header: ExtractedStatementHeader::default(),
            raw_transactions: Vec::new(),
        }
    }

    /// All transactions across segments, in emission order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.segments.iter().flat_map(|s| s.transactions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_tally() {
        let mut a = Transaction::new("a", 0, 1);
        a.validation_status = ValidationStatus::Valid;
        let mut b = Transaction::new("b", 1, 1);
        b.validation_status = ValidationStatus::Error;
        let c = Transaction::new("c", 2, 1);

        let totals = DocumentTotals::tally([&a, &b, &c]);
        assert_eq!(totals.total, 3);
        assert_eq!(totals.valid, 1);
        assert_eq!(totals.error, 1);
        assert_eq!(totals.warning, 0);
    }

    #[test]
    fn test_segment_sums() {
        let mut segment = DocumentSegment::new(0, 1);
        let mut a = Transaction::new("a", 0, 1);
        a.credit = Some(dec!(5250.00));
        let mut b = Transaction::new("b", 1, 1);
        b.debit = Some(dec!(1200.00));
        segment.transactions = vec![a, b];
        assert_eq!(segment.total_credits(), dec!(5250.00));
        assert_eq!(segment.total_debits(), dec!(1200.00));
    }

    #[test]
    fn test_document_serde_round_trip() {
        let mut document = ParsedDocument::empty("statement.pdf");
        document.total_pages = 2;
        let mut segment = DocumentSegment::new(0, 1);
        segment.opening_balance = Some(dec!(7200.00));
        document.segments.push(segment);

        let json = serde_json::to_string(&document).unwrap();
        let back: ParsedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_worst_row_status() {
        let mut segment = DocumentSegment::new(0, 1);
        let mut a = Transaction::new("a", 0, 1);
        a.validation_status = ValidationStatus::Valid;
        let mut b = Transaction::new("b", 1, 1);
        b.validation_status = ValidationStatus::Warning;
        segment.transactions = vec![a, b];
        assert_eq!(segment.worst_row_status(), ValidationStatus::Warning);
    }
}
