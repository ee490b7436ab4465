//! Description categorization and reference classification.

use once_cell::sync::Lazy;
use regex::Regex;

use ledgerlens_core::catalog::categories;
use ledgerlens_core::ReferenceKind;

/// Score a description against the fixed category library.
///
/// Returns `(category, confidence)`; highest confidence wins, ties go to
/// the longer match.
pub fn categorize(description: &str) -> Option<(String, f64)> {
    categories::best_match(description).map(|(name, confidence)| (name.to_string(), confidence))
}

static CHEQUE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5,8}$").expect("cheque shape regex"));
static CARD_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:x{2,}|\*{2,})\d{4}$|^\d{4}$").expect("card shape regex")
});
static INVOICE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^inv[-/]?\d+$").expect("invoice shape regex"));
static TRANSFER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{10,22}$").expect("transfer shape regex"));

/// Classify a reference cell by its shape.
pub fn classify_reference(text: &str) -> ReferenceKind {
    let trimmed = text.trim();
    if CHEQUE_SHAPE.is_match(trimmed) {
        ReferenceKind::Cheque
    } else if CARD_SHAPE.is_match(trimmed) {
        ReferenceKind::Card
    } else if INVOICE_SHAPE.is_match(trimmed) {
        ReferenceKind::Invoice
    } else if TRANSFER_SHAPE.is_match(trimmed) {
        ReferenceKind::TransferId
    } else {
        ReferenceKind::Other
    }
}
