//! Export round-trip validation.
//!
//! Given the rows an export layer produced, verify that every extracted
//! transaction survived intact: first exact matching, then tolerant
//! matching (±1 day, ±1 unit) that flags corruption, including
//! digit-truncation where one value is a prefix of the other.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgerlens_core::{Transaction, ValidationStatus};

/// The uniform five-column schema an export row carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRow {
    /// Transaction date
    pub date: Option<NaiveDate>,
    /// Narrative text
    pub description: String,
    /// Money out
    pub debit: Option<Decimal>,
    /// Money in
    pub credit: Option<Decimal>,
    /// Running balance
    pub balance: Option<Decimal>,
}

impl From<&Transaction> for ExportedRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date,
            description: tx.description.clone(),
            debit: tx.debit,
            credit: tx.credit,
            balance: tx.balance,
        }
    }
}

/// Round-trip verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportVerdict {
    /// Every transaction matched an export row exactly
    ExportComplete,
    /// Some rows matched only tolerantly or are missing
    ExportPartial,
    /// The export lost or corrupted most of the data
    ExportFailed,
}

/// One detected problem with an export row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportIssue {
    /// Index of the source transaction
    pub transaction_index: usize,
    /// What went wrong
    pub detail: String,
}

/// Report from [`validate_export`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportValidationReport {
    /// Round-trip verdict
    pub verdict: ExportVerdict,
    /// Share of transactions matched exactly, 0..=1
    pub confidence: f64,
    /// Transactions matched exactly
    pub matched_exact: usize,
    /// Transactions matched only within tolerance
    pub matched_tolerant: usize,
    /// Transactions with no matching export row
    pub missing: Vec<ExportIssue>,
    /// Transactions whose export rows show corruption
    pub corrupted: Vec<ExportIssue>,
    /// Export rows that duplicate one another
    pub duplicate_rows: usize,
    /// Export rows matched by no transaction
    pub unmatched_rows: usize,
    /// Page count of the source document, for context
    pub total_pages: u32,
}

const DATE_TOLERANCE_DAYS: i64 = 1;
const AMOUNT_TOLERANCE: Decimal = dec!(1.0);

/// Verify that exported rows faithfully reproduce the extracted
/// transactions.
///
/// Each transaction matches at most one export row: exact first, then
/// tolerant (±1 day, ±1 unit per amount). Tolerant matches are flagged as
/// corrupted, with digit-truncation called out specifically. Duplicate
/// export rows are counted.
pub fn validate_export(
    transactions: &[Transaction],
    exported: &[ExportedRow],
    total_pages: u32,
) -> ExportValidationReport {
    let mut used = vec![false; exported.len()];
    let mut matched_exact = 0usize;
    let mut matched_tolerant = 0usize;
    let mut missing = Vec::new();
    let mut corrupted = Vec::new();

    for (index, tx) in transactions.iter().enumerate() {
        // Exact pass
        if let Some(pos) = exported
            .iter()
            .enumerate()
            .position(|(i, row)| !used[i] && is_exact_match(tx, row))
        {
            used[pos] = true;
            matched_exact += 1;
            continue;
        }
        // Tolerant pass
        if let Some(pos) = exported
            .iter()
            .enumerate()
            .position(|(i, row)| !used[i] && is_tolerant_match(tx, row))
        {
            used[pos] = true;
            matched_tolerant += 1;
            corrupted.push(ExportIssue {
                transaction_index: index,
                detail: describe_corruption(tx, &exported[pos]),
            });
            continue;
        }
        missing.push(ExportIssue {
            transaction_index: index,
            detail: format!(
                "transaction {} ({}) has no export row",
                tx.id,
                tx.date.map(|d| d.to_string()).unwrap_or_else(|| "undated".into())
            ),
        });
    }

    let unmatched_rows = used.iter().filter(|&&u| !u).count();
    let duplicate_rows = count_duplicates(exported);

    let total = transactions.len().max(1);
    let confidence = matched_exact as f64 / total as f64;
    let verdict = if missing.is_empty()
        && corrupted.is_empty()
        && duplicate_rows == 0
        && matched_exact == transactions.len()
    {
        ExportVerdict::ExportComplete
    } else if confidence >= 0.5 {
        ExportVerdict::ExportPartial
    } else {
        ExportVerdict::ExportFailed
    };

    debug!(?verdict, matched_exact, matched_tolerant, "validated export round-trip");
    ExportValidationReport {
        verdict,
        confidence,
        matched_exact,
        matched_tolerant,
        missing,
        corrupted,
        duplicate_rows,
        unmatched_rows,
        total_pages,
    }
}

/// Pre-export gate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreExportCheck {
    /// Whether export may proceed
    pub can_export: bool,
    /// Why not, when blocked
    pub reason: Option<String>,
    /// Exportable transaction count
    pub count: usize,
}

/// Gate an export: refuse empty documents and documents with row errors.
pub fn pre_export_check(transactions: &[Transaction]) -> PreExportCheck {
    if transactions.is_empty() {
        return PreExportCheck {
            can_export: false,
            reason: Some("no transactions to export".to_string()),
            count: 0,
        };
    }
    let errors = transactions
        .iter()
        .filter(|t| t.validation_status == ValidationStatus::Error)
        .count();
    if errors > 0 {
        return PreExportCheck {
            can_export: false,
            reason: Some(format!(
                "{errors} row(s) failed validation; review before export"
            )),
            count: transactions.len(),
        };
    }
    PreExportCheck {
        can_export: true,
        reason: None,
        count: transactions.len(),
    }
}

fn is_exact_match(tx: &Transaction, row: &ExportedRow) -> bool {
    tx.date == row.date
        && tx.debit == row.debit
        && tx.credit == row.credit
        && tx.balance == row.balance
}

fn is_tolerant_match(tx: &Transaction, row: &ExportedRow) -> bool {
    let date_ok = match (tx.date, row.date) {
        (Some(a), Some(b)) => (a - b).num_days().abs() <= DATE_TOLERANCE_DAYS,
        (None, None) => true,
        _ => false,
    };
    date_ok
        && amount_close(tx.debit, row.debit)
        && amount_close(tx.credit, row.credit)
        && amount_close(tx.balance, row.balance)
}

fn amount_close(a: Option<Decimal>, b: Option<Decimal>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() <= AMOUNT_TOLERANCE || is_truncation(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Digit truncation: one value's canonical digits are a proper prefix of
/// the other's (`1234.56` exported as `1234.5` or `123`).
fn is_truncation(a: Decimal, b: Decimal) -> bool {
    if a == b {
        return false;
    }
    let a_digits = a.abs().to_string().replace('.', "");
    let b_digits = b.abs().to_string().replace('.', "");
    a_digits.starts_with(&b_digits) || b_digits.starts_with(&a_digits)
}

fn describe_corruption(tx: &Transaction, row: &ExportedRow) -> String {
    let mut problems = Vec::new();
    if tx.date != row.date {
        problems.push(format!("date {:?} exported as {:?}", tx.date, row.date));
    }
    for (label, a, b) in [
        ("debit", tx.debit, row.debit),
        ("credit", tx.credit, row.credit),
        ("balance", tx.balance, row.balance),
    ] {
        if a != b {
            let truncated = matches!((a, b), (Some(x), Some(y)) if is_truncation(x, y));
            if truncated {
                problems.push(format!("{label} {a:?} digit-truncated to {b:?}"));
            } else {
                problems.push(format!("{label} {a:?} exported as {b:?}"));
            }
        }
    }
    problems.join("; ")
}

fn count_duplicates(exported: &[ExportedRow]) -> usize {
    let mut duplicates = 0usize;
    for (i, row) in exported.iter().enumerate() {
        if exported[..i].contains(row) {
            duplicates += 1;
        }
    }
    duplicates
}
