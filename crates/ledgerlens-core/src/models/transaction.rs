//! Transaction model: the post-parse, post-stitch ledger entity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::confidence::TransactionConfidence;

/// Row-level validation outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Arithmetic holds within the rounding tolerance
    Valid,
    /// Arithmetic holds within the cent tolerance, or a repair was applied
    Warning,
    /// Arithmetic failed or a mandatory cell could not be parsed
    Error,
    /// Not yet validated
    #[default]
    Unchecked,
}

impl ValidationStatus {
    /// Severity ordering: error > warning > unchecked > valid.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Valid => 0,
            Self::Unchecked => 1,
            Self::Warning => 2,
            Self::Error => 3,
        }
    }

    /// The worse of two statuses.
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

/// Classified shape of a reference cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Cheque number (all digits, typically 5-8)
    Cheque,
    /// Card reference (masked PAN or trailing-4 pattern)
    Card,
    /// Bank transfer identifier (long mixed alphanumeric)
    TransferId,
    /// Invoice reference
    Invoice,
    /// Anything else
    Other,
}

/// A single ledger row after parsing, stitching, and validation.
///
/// Invariants on emitted transactions:
/// 1. `debit` and `credit` are never both present.
/// 2. `debit` and `credit`, when present, are non-negative.
/// 3. `balance` holds the extracted running balance; the engine only ever
///    writes it during chronology reversal.
/// 4. `date`, when set, is a valid calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier, unique within the document
    pub id: String,
    /// Position within the segment, stable after chronology reversal
    pub row_index: usize,
    /// Transaction date; `None` iff extraction failed
    pub date: Option<NaiveDate>,
    /// Narrative text, possibly stitched from several lines
    pub description: String,
    /// Money out, non-negative
    pub debit: Option<Decimal>,
    /// Money in, non-negative
    pub credit: Option<Decimal>,
    /// Extracted running balance
    pub balance: Option<Decimal>,
    /// Reference cell text
    pub reference: Option<String>,
    /// Classified reference shape
    pub reference_type: Option<ReferenceKind>,
    /// Spending category
    pub category: Option<String>,
    /// Category match confidence in 0..=1
    pub category_confidence: Option<f64>,
    /// Detected foreign currency, if the row was converted
    pub original_currency: Option<String>,
    /// Pre-conversion debit
    pub original_debit: Option<Decimal>,
    /// Pre-conversion credit
    pub original_credit: Option<Decimal>,
    /// Applied exchange rate (USD-pivoted)
    pub exchange_rate: Option<Decimal>,
    /// Currency the converted amounts are expressed in
    pub local_currency: Option<String>,
    /// Row validation outcome
    pub validation_status: ValidationStatus,
    /// Human-readable validation detail
    pub validation_message: Option<String>,
    /// Extraction confidence breakdown
    pub confidence: TransactionConfidence,
    /// Pages the row's source lines came from, non-empty
    pub source_page_numbers: Vec<u32>,
    /// Whether continuation lines were merged into this row
    pub is_stitched: bool,
    /// Source line texts, populated iff `is_stitched`
    pub original_lines: Vec<String>,
}

impl Transaction {
    /// Create a bare transaction with unchecked status.
    pub fn new(id: impl Into<String>, row_index: usize, page_number: u32) -> Self {
        Self {
            id: id.into(),
            row_index,
            date: None,
            description: String::new(),
            debit: None,
            credit: None,
            balance: None,
            reference: None,
            reference_type: None,
            category: None,
            category_confidence: None,
            original_currency: None,
            original_debit: None,
            original_credit: None,
            exchange_rate: None,
            local_currency: None,
            validation_status: ValidationStatus::Unchecked,
            validation_message: None,
            confidence: TransactionConfidence::default(),
            source_page_numbers: vec![page_number],
            is_stitched: false,
            original_lines: Vec::new(),
        }
    }

    /// The signed effect on the balance: credit minus debit.
    pub fn delta(&self) -> Decimal {
        self.credit.unwrap_or_default() - self.debit.unwrap_or_default()
    }

    /// Whether the row carries any amount.
    pub fn has_amount(&self) -> bool {
        self.debit.is_some() || self.credit.is_some()
    }

    /// A copy with debit and credit swapped.
    ///
    /// This is the only classification change safe repair may make; the
    /// magnitudes are untouched.
    pub fn with_flipped_amounts(&self) -> Self {
        let mut flipped = self.clone();
        std::mem::swap(&mut flipped.debit, &mut flipped.credit);
        flipped
    }

    /// Schema-gate violations for the mandatory report.
    ///
    /// Returns one message per violated invariant; empty means the row
    /// passes the gate.
    pub fn schema_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.debit.is_some() && self.credit.is_some() {
            violations.push(format!("row {}: both debit and credit set", self.row_index));
        }
        if let Some(d) = self.debit {
            if d < Decimal::ZERO {
                violations.push(format!("row {}: negative debit {d}", self.row_index));
            }
        }
        if let Some(c) = self.credit {
            if c < Decimal::ZERO {
                violations.push(format!("row {}: negative credit {c}", self.row_index));
            }
        }
        if self.date.is_none() && self.has_amount() {
            violations.push(format!("row {}: missing mandatory date", self.row_index));
        }
        if self.source_page_numbers.is_empty() {
            violations.push(format!("row {}: no source pages", self.row_index));
        }
        violations
    }
}
