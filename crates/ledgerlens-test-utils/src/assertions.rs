//! Shared assertions for parsed documents.

use rust_decimal::Decimal;

use ledgerlens_core::{ParsedDocument, ValidationStatus};

/// Assert the schema invariants every emitted document must satisfy:
/// debit/credit exclusivity, non-negative amounts, and stitching metadata
/// consistency.
pub fn assert_schema_invariants(document: &ParsedDocument) {
    for tx in document.transactions() {
        assert!(
            !(tx.debit.is_some() && tx.credit.is_some()),
            "transaction {} has both debit and credit",
            tx.id
        );
        if let Some(debit) = tx.debit {
            assert!(debit >= Decimal::ZERO, "transaction {} has negative debit", tx.id);
        }
        if let Some(credit) = tx.credit {
            assert!(credit >= Decimal::ZERO, "transaction {} has negative credit", tx.id);
        }
        assert!(
            !tx.source_page_numbers.is_empty(),
            "transaction {} has no source pages",
            tx.id
        );
        assert_eq!(
            tx.is_stitched,
            !tx.original_lines.is_empty(),
            "transaction {} stitching metadata inconsistent",
            tx.id
        );
    }
}

/// Assert the arithmetic invariant on a segment known to be valid:
/// opening + credits - debits lands on the closing balance.
pub fn assert_segment_balanced(document: &ParsedDocument, segment_index: usize, epsilon: Decimal) {
    let segment = &document.segments[segment_index];
    let (Some(opening), Some(closing)) = (segment.opening_balance, segment.closing_balance) else {
        panic!("segment {segment_index} lacks opening/closing balances");
    };
    let computed = opening + segment.total_credits() - segment.total_debits();
    assert!(
        (computed - closing).abs() <= epsilon,
        "segment {segment_index}: {opening} + credits - debits = {computed}, closing is {closing}"
    );
}

/// Assert transactions in every non-error segment are date-ordered
/// non-decreasingly.
pub fn assert_chronological(document: &ParsedDocument) {
    for segment in &document.segments {
        let any_error = segment
            .transactions
            .iter()
            .any(|t| t.validation_status == ValidationStatus::Error);
        if any_error {
            continue;
        }
        let dates: Vec<_> = segment.transactions.iter().filter_map(|t| t.date).collect();
        for pair in dates.windows(2) {
            assert!(
                pair[0] <= pair[1],
                "segment {} not chronological: {} after {}",
                segment.segment_index,
                pair[1],
                pair[0]
            );
        }
    }
}
