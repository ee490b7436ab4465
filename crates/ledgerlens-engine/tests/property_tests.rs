//! Universal invariants over engine output.
//!
//! These cover the document-level laws that must hold for every emitted
//! document regardless of layout: amount exclusivity, provenance
//! traceability, determinism, masking, and export round-trips.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use ledgerlens_core::provenance::CellField;
use ledgerlens_core::ValidationStatus;
use ledgerlens_engine::{
    pre_export_check, quick_validate, validate_export, Engine, ExportVerdict, ExportedRow,
};
use ledgerlens_test_utils::{assert_schema_invariants, minimal_statement, StatementFixture};

/// P1 + P2: amount exclusivity and non-negativity on a realistic document.
#[test]
fn test_amount_invariants() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("minimal.pdf", &minimal_statement());
    let document = result.document.expect("document");
    assert_schema_invariants(&document);
    assert!(result.schema_violations.is_empty());
}

/// P3: every non-empty cell has a traced source fragment.
#[test]
fn test_provenance_covers_every_cell() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("minimal.pdf", &minimal_statement());
    let ledger = result.provenance.expect("ledger");
    let document = result.document.expect("document");

    for tx in document.transactions() {
        if tx.date.is_some() {
            assert!(ledger.has_source(&tx.id, CellField::Date), "date untraced");
        }
        if !tx.description.is_empty() {
            assert!(
                ledger.has_source(&tx.id, CellField::Description),
                "description untraced"
            );
        }
        if tx.debit.is_some() {
            assert!(ledger.has_source(&tx.id, CellField::Debit), "debit untraced");
        }
        if tx.credit.is_some() {
            assert!(ledger.has_source(&tx.id, CellField::Credit), "credit untraced");
        }
        if tx.balance.is_some() {
            assert!(ledger.has_source(&tx.id, CellField::Balance), "balance untraced");
        }
    }
}

/// P4 + P9: segment arithmetic holds on valid documents.
#[test]
fn test_balance_equation_on_valid_document() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("minimal.pdf", &minimal_statement());
    let document = result.document.expect("document");
    let segment = &document.segments[0];

    let opening = segment.opening_balance.unwrap();
    let closing = segment.closing_balance.unwrap();
    assert_eq!(
        opening + segment.total_credits() - segment.total_debits(),
        closing
    );

    let mut prev = opening;
    for tx in &segment.transactions {
        if tx.validation_status == ValidationStatus::Valid {
            let expected = prev + tx.delta();
            assert!((expected - tx.balance.unwrap()).abs() <= dec!(0.01));
        }
        prev = tx.balance.unwrap();
    }
}

/// P6: the account number is masked everywhere, including serialization.
#[test]
fn test_account_number_masking() {
    let fragments = StatementFixture::new()
        .free_line("Account Number: 123456789012")
        .free_line("Opening Balance 7,200.00")
        .header_row()
        .row("2025-01-15", "Salary", None, Some("5,250.00"), Some("12,450.00"))
        .row("2025-01-16", "Transfer", Some("1,200.00"), None, Some("11,250.00"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("masked.pdf", &fragments);
    let document = result.document.expect("document");
    assert_eq!(
        document.extracted_header.account_number_masked.as_deref(),
        Some("****9012")
    );

    let serialized = serde_json::to_string(&document).unwrap();
    assert!(
        !serialized.contains("123456789012"),
        "full account number leaked into output"
    );
}

/// P8: processing is deterministic.
#[test]
fn test_determinism() {
    let engine = Engine::with_defaults();
    let fragments = minimal_statement();
    let first = engine.process_document("same.pdf", &fragments);
    let second = engine.process_document("same.pdf", &fragments);
    assert_eq!(first.document, second.document);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.schema_violations, second.schema_violations);
}

/// P10: the engine's own rows round-trip as a complete export.
#[test]
fn test_export_round_trip_complete() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("minimal.pdf", &minimal_statement());
    let document = result.document.expect("document");

    let transactions: Vec<_> = document.transactions().cloned().collect();
    let rows: Vec<ExportedRow> = transactions.iter().map(ExportedRow::from).collect();
    let report = validate_export(&transactions, &rows, document.total_pages);
    assert_eq!(report.verdict, ExportVerdict::ExportComplete);

    let check = pre_export_check(&transactions);
    assert!(check.can_export);
    assert_eq!(check.count, 3);
}

/// The quick check agrees with full validation on the same rows.
#[test]
fn test_quick_validate_agrees_with_pipeline() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("minimal.pdf", &minimal_statement());
    let document = result.document.expect("document");
    let segment = &document.segments[0];

    let mut prev = segment.opening_balance.unwrap();
    for tx in &segment.transactions {
        assert!(quick_validate(prev, tx.debit, tx.credit, tx.balance.unwrap()));
        prev = tx.balance.unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// P8 generalized: arbitrary well-formed two-row statements process
    /// deterministically and never violate amount exclusivity.
    #[test]
    fn prop_arbitrary_amounts_deterministic(
        credit_units in 1u64..1_000_000,
        debit_units in 1u64..1_000_000,
        opening_units in 0u64..1_000_000,
    ) {
        let opening = Decimal::from(opening_units);
        let credit = Decimal::from(credit_units);
        let debit = Decimal::from(debit_units);
        let after_credit = opening + credit;
        let closing = after_credit - debit;

        let fragments = StatementFixture::new()
            .free_line(&format!("Opening Balance {opening}"))
            .header_row()
            .row(
                "2025-01-15",
                "Deposit",
                None,
                Some(&credit.to_string()),
                Some(&after_credit.to_string()),
            )
            .row(
                "2025-01-16",
                "Withdrawal",
                Some(&debit.to_string()),
                None,
                Some(&closing.to_string()),
            )
            .build();

        let engine = Engine::with_defaults();
        let first = engine.process_document("prop.pdf", &fragments);
        let second = engine.process_document("prop.pdf", &fragments);
        prop_assert_eq!(&first.document, &second.document);

        let document = first.document.expect("document");
        for tx in document.transactions() {
            prop_assert!(!(tx.debit.is_some() && tx.credit.is_some()));
        }
    }
}
