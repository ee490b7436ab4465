//! Cell-level provenance: every emitted value traces back to source text.
//!
//! The ledger is constructed fresh for each pipeline run and passed through
//! the stages explicitly; there is no global state. A `Provenance` can only
//! be built from a source fragment's text and position, which makes
//! fabricated values unrepresentable: a cell without a source cannot get a
//! provenance record, and the validator reports it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// A transformation applied between source text and emitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTransform {
    /// Whitespace trimmed / collapsed
    Trimmed,
    /// Text parsed as a locale-formatted number
    ParsedNumber,
    /// Text parsed as a date
    ParsedDate,
    /// Continuation lines merged in
    Stitched,
    /// Negative amount moved to the opposite column
    NegativeNormalized,
    /// Safe repair swapped debit and credit
    RepairFlipped,
    /// Amount converted from a detected foreign currency
    CurrencyConverted,
    /// Account number masked to last four digits
    Masked,
    /// Balance rewritten from the delta series during chronology reversal
    ReversalRecomputed,
}

/// Why an emitted cell is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// Source text existed but could not be parsed
    ParseFailed,
    /// The cell was empty on the page
    Absent,
}

/// Transaction fields that carry provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellField {
    /// Transaction date
    Date,
    /// Narrative text
    Description,
    /// Money out
    Debit,
    /// Money in
    Credit,
    /// Running balance
    Balance,
    /// Reference cell
    Reference,
}

impl CellField {
    fn key_part(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Description => "description",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Balance => "balance",
            Self::Reference => "reference",
        }
    }
}

/// Traceable link from an emitted cell to its source fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Emitted value, rendered as text
    pub value: String,
    /// Source fragment text, untrimmed
    pub source_text: String,
    /// Page the source fragment sits on
    pub source_page_number: u32,
    /// Position of the source fragment
    pub source_bounding_box: BoundingBox,
    /// Transformations applied, in order
    pub transformations: Vec<CellTransform>,
    /// Confidence in the traced value, 0..=1
    pub confidence: f64,
}

impl Provenance {
    /// Create a provenance record from a source fragment.
    pub fn from_source(
        value: impl Into<String>,
        source_text: impl Into<String>,
        source_page_number: u32,
        source_bounding_box: BoundingBox,
    ) -> Self {
        Self {
            value: value.into(),
            source_text: source_text.into(),
            source_page_number,
            source_bounding_box,
            transformations: Vec::new(),
            confidence: 1.0,
        }
    }

    /// Append a transformation.
    pub fn transformed(mut self, transform: CellTransform) -> Self {
        self.transformations.push(transform);
        self
    }

    /// Lower the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// One ledger entry: either a traced value or a recorded gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRecord {
    /// The cell's value traces to a source fragment
    Traced(Provenance),
    /// The cell is empty, with the reason recorded
    Missing {
        /// Why the cell is empty
        reason: MissingReason,
    },
}

/// Per-run recorder of cell provenance, keyed by transaction id and field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceLedger {
    entries: BTreeMap<String, CellRecord>,
}

impl ProvenanceLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(transaction_id: &str, field: CellField) -> String {
        format!("{}/{}", transaction_id, field.key_part())
    }

    /// Record a traced cell.
    pub fn record(&mut self, transaction_id: &str, field: CellField, provenance: Provenance) {
        self.entries
            .insert(Self::key(transaction_id, field), CellRecord::Traced(provenance));
    }

    /// Record an empty cell with its reason. Never overwrites a traced cell.
    pub fn record_missing(&mut self, transaction_id: &str, field: CellField, reason: MissingReason) {
        self.entries
            .entry(Self::key(transaction_id, field))
            .or_insert(CellRecord::Missing { reason });
    }

    /// Append a transformation to an already-traced cell.
    pub fn append_transform(
        &mut self,
        transaction_id: &str,
        field: CellField,
        transform: CellTransform,
    ) {
        if let Some(CellRecord::Traced(p)) = self.entries.get_mut(&Self::key(transaction_id, field))
        {
            p.transformations.push(transform);
        }
    }

    /// Swap the debit and credit records for a transaction, marking both
    /// with the given transform. Used by negative normalization and repair.
    pub fn swap_amounts(&mut self, transaction_id: &str, transform: CellTransform) {
        let debit_key = Self::key(transaction_id, CellField::Debit);
        let credit_key = Self::key(transaction_id, CellField::Credit);
        let debit = self.entries.remove(&debit_key);
        let credit = self.entries.remove(&credit_key);
        for (key, record) in [(debit_key, credit), (credit_key, debit)] {
            if let Some(mut record) = record {
                if let CellRecord::Traced(ref mut p) = record {
                    p.transformations.push(transform);
                }
                self.entries.insert(key, record);
            }
        }
    }

    /// Look up a cell record.
    pub fn get(&self, transaction_id: &str, field: CellField) -> Option<&CellRecord> {
        self.entries.get(&Self::key(transaction_id, field))
    }

    /// Whether the cell has a traced source fragment.
    pub fn has_source(&self, transaction_id: &str, field: CellField) -> bool {
        matches!(
            self.get(transaction_id, field),
            Some(CellRecord::Traced(_))
        )
    }

    /// Number of ledger entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellRecord)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(10.0, 20.0, 40.0, 10.0).unwrap()
    }

    #[test]
    fn test_record_and_query() {
        let mut ledger = ProvenanceLedger::new();
        let p = Provenance::from_source("1234.56", " 1,234.56 ", 1, bbox())
            .transformed(CellTransform::Trimmed)
            .transformed(CellTransform::ParsedNumber);
        ledger.record("tx-1", CellField::Debit, p);
        assert!(ledger.has_source("tx-1", CellField::Debit));
        assert!(!ledger.has_source("tx-1", CellField::Credit));
    }

    #[test]
    fn test_missing_never_overwrites_traced() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record(
            "tx-1",
            CellField::Balance,
            Provenance::from_source("5.00", "5.00", 1, bbox()),
        );
        ledger.record_missing("tx-1", CellField::Balance, MissingReason::ParseFailed);
        assert!(ledger.has_source("tx-1", CellField::Balance));
    }

    #[test]
    fn test_swap_amounts_moves_records() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record(
            "tx-1",
            CellField::Credit,
            Provenance::from_source("1200.00", "1,200.00", 1, bbox()),
        );
        ledger.swap_amounts("tx-1", CellTransform::RepairFlipped);
        assert!(ledger.has_source("tx-1", CellField::Debit));
        assert!(!ledger.has_source("tx-1", CellField::Credit));
        match ledger.get("tx-1", CellField::Debit) {
            Some(CellRecord::Traced(p)) => {
                assert!(p.transformations.contains(&CellTransform::RepairFlipped));
            }
            other => panic!("expected traced record, got {other:?}"),
        }
    }
}
