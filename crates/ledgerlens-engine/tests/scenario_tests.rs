//! End-to-end scenarios over the full pipeline.
//!
//! Each test feeds positioned fragments through `process_document` and
//! checks the emitted document, mirroring the statements the engine meets
//! in production: clean US layouts, reversed layouts, misclassified
//! columns, wrapped descriptions, European formats, and broken inputs.

use rust_decimal_macros::dec;

use ledgerlens_config::{LocaleDetection, ProcessingConfig};
use ledgerlens_core::provenance::{CellField, CellRecord, MissingReason};
use ledgerlens_core::{DateOrder, ValidationStatus};
use ledgerlens_engine::Engine;
use ledgerlens_test_utils::{
    assert_chronological, assert_schema_invariants, assert_segment_balanced, minimal_statement,
    StatementFixture,
};

// =============================================================================
// Concrete scenarios
// =============================================================================

/// A minimal valid US document with an opening-balance marker.
#[test]
fn test_minimal_valid_document() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("minimal.pdf", &minimal_statement());

    assert!(result.success, "errors: {:?}", result.errors);
    let document = result.document.expect("document");
    assert_eq!(document.segments.len(), 1);

    let segment = &document.segments[0];
    assert_eq!(segment.opening_balance, Some(dec!(7200.00)));
    assert_eq!(segment.transactions.len(), 3);
    assert!(segment
        .transactions
        .iter()
        .all(|t| t.validation_status == ValidationStatus::Valid));
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    assert_eq!(document.date_order, DateOrder::Ascending);
    assert!(!document.was_reversed);
    assert_eq!(document.detected_locale, "en-US");

    let salary = &segment.transactions[0];
    assert_eq!(salary.credit, Some(dec!(5250.00)));
    assert_eq!(salary.debit, None);
    assert_eq!(salary.balance, Some(dec!(12450.00)));

    assert_schema_invariants(&document);
    assert_chronological(&document);
    assert_segment_balanced(&document, 0, dec!(0.01));
}

/// The same transactions in reverse visual order (newest first).
#[test]
fn test_descending_document_is_reversed() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 7,200.00")
        .header_row()
        .row("2025-01-17", "Purchase", Some("89.99"), None, Some("11,160.01"))
        .row("2025-01-16", "Transfer", Some("1,200.00"), None, Some("11,250.00"))
        .row("2025-01-15", "Salary", None, Some("5,250.00"), Some("12,450.00"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("descending.pdf", &fragments);
    let document = result.document.expect("document");

    assert!(document.was_reversed);
    assert_eq!(document.date_order, DateOrder::Descending);
    let segment = &document.segments[0];
    // Emitted in ascending order with balances recomputed from the opening
    assert_eq!(
        segment.transactions[0].date,
        chrono::NaiveDate::from_ymd_opt(2025, 1, 15)
    );
    assert_eq!(segment.transactions[0].balance, Some(dec!(12450.00)));
    assert_eq!(segment.transactions[2].balance, Some(dec!(11160.01)));
    assert_eq!(
        segment.transactions.iter().map(|t| t.row_index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(result.warnings.iter().any(|w| w.contains("reversed")));
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    assert_chronological(&document);
}

/// A debit that landed in the credit column; safe repair flips it back.
#[test]
fn test_safe_repair_flips_misclassified_row() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 7,200.00")
        .header_row()
        .row("2025-01-15", "Salary", None, Some("5,250.00"), Some("12,450.00"))
        .row("2025-01-16", "Transfer", None, Some("1,200.00"), Some("11,250.00"))
        .row("2025-01-17", "Purchase", Some("89.99"), None, Some("11,160.01"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("misclassified.pdf", &fragments);
    let document = result.document.expect("document");
    let segment = &document.segments[0];

    let transfer = &segment.transactions[1];
    assert_eq!(transfer.debit, Some(dec!(1200.00)), "repair should flip the row");
    assert_eq!(transfer.credit, None);
    assert_eq!(transfer.validation_status, ValidationStatus::Valid);
    assert!(transfer.confidence.flags.iter().any(|f| f == "repaired"));
    assert!(result.warnings.iter().any(|w| w.contains("safe repair")));
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    assert_segment_balanced(&document, 0, dec!(0.01));
}

/// A wrapped description line merges into its transaction.
#[test]
fn test_multi_line_description_stitched() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 11,160.01")
        .header_row()
        .row(
            "2025-01-18",
            "STARBUCKS COFFEE - CARD",
            Some("12.50"),
            None,
            Some("11,147.51"),
        )
        .continuation("ENDING 7890")
        .row("2025-01-19", "Groceries", Some("47.51"), None, Some("11,100.00"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("stitched.pdf", &fragments);
    let document = result.document.expect("document");
    let segment = &document.segments[0];

    assert_eq!(segment.transactions.len(), 2);
    let coffee = &segment.transactions[0];
    assert_eq!(coffee.description, "STARBUCKS COFFEE - CARD ENDING 7890");
    assert!(coffee.is_stitched);
    assert_eq!(coffee.original_lines.len(), 2);
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    assert_schema_invariants(&document);
}

/// German locale, European number format.
#[test]
fn test_european_format_document() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 1.000,00")
        .header_row_titled(&["Buchungstag", "Verwendungszweck", "Soll", "Haben", "Saldo"])
        .row("15.01.2025", "Gehalt Januar", None, Some("1.234,56"), Some("2.234,56"))
        .row("16.01.2025", "Miete", Some("1.000,00"), None, Some("1.234,56"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("german.pdf", &fragments);
    let document = result.document.expect("document");

    assert_eq!(document.detected_locale, "de-DE");
    let segment = &document.segments[0];
    assert_eq!(segment.transactions[0].credit, Some(dec!(1234.56)));
    assert_eq!(segment.transactions[1].debit, Some(dec!(1000.00)));
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    assert_segment_balanced(&document, 0, dec!(0.01));
}

/// A missing balance cell is an error, never a guess.
#[test]
fn test_missing_balance_is_error_not_guessed() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 7,200.00")
        .header_row()
        .row("2025-01-15", "Salary", None, Some("5,250.00"), Some("12,450.00"))
        .row("2025-01-16", "Transfer", Some("1,200.00"), None, None) // no balance
        .row("2025-01-17", "Purchase", Some("89.99"), None, Some("11,160.01"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("gap.pdf", &fragments);
    let document = result.document.expect("document");
    let segment = &document.segments[0];

    let broken = &segment.transactions[1];
    assert_eq!(broken.balance, None, "balance must never be computed");
    assert_eq!(broken.validation_status, ValidationStatus::Error);
    assert_eq!(document.overall_validation, ValidationStatus::Error);

    // Provenance records the gap instead of a fabricated value
    let ledger = result.provenance.expect("provenance ledger");
    match ledger.get(&broken.id, CellField::Balance) {
        Some(CellRecord::Missing { reason }) => {
            assert_eq!(*reason, MissingReason::Absent);
        }
        other => panic!("expected missing-balance record, got {other:?}"),
    }
}

// =============================================================================
// Boundary behaviors
// =============================================================================

/// Zero fragments still succeed, with warnings.
#[test]
fn test_zero_fragments() {
    let engine = Engine::with_defaults();
    let result = engine.process_document("empty.pdf", &[]);
    assert!(result.success);
    assert!(!result.warnings.is_empty());
    let document = result.document.expect("document");
    assert_eq!(document.totals.total, 0);
}

/// A header-only document yields zero transactions.
#[test]
fn test_header_only_document() {
    let fragments = StatementFixture::new()
        .free_line("First National Bank")
        .free_line("Statement of Account")
        .header_row()
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("header_only.pdf", &fragments);
    assert!(result.success);
    let document = result.document.expect("document");
    assert_eq!(document.totals.total, 0);
}

/// Date and amount without any balance column errors every row.
#[test]
fn test_no_balance_column() {
    let fragments = StatementFixture::new()
        .header_row()
        .row("2025-01-15", "Salary", None, Some("5,250.00"), None)
        .row("2025-01-16", "Transfer", Some("1,200.00"), None, None)
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("no_balance.pdf", &fragments);
    let document = result.document.expect("document");
    assert!(document
        .transactions()
        .all(|t| t.validation_status == ValidationStatus::Error));
    assert_eq!(document.overall_validation, ValidationStatus::Error);
}

/// Repeated runs on a descending document behave identically.
#[test]
fn test_reversal_deterministic_across_runs() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 7,200.00")
        .header_row()
        .row("2025-01-17", "Purchase", Some("89.99"), None, Some("11,160.01"))
        .row("2025-01-16", "Transfer", Some("1,200.00"), None, Some("11,250.00"))
        .row("2025-01-15", "Salary", None, Some("5,250.00"), Some("12,450.00"))
        .build();

    let engine = Engine::with_defaults();
    let first = engine.process_document("descending.pdf", &fragments);
    let second = engine.process_document("descending.pdf", &fragments);
    assert_eq!(first.document, second.document);
    assert!(first.document.unwrap().was_reversed);
}

/// Two concatenated statements split into two segments.
#[test]
fn test_merged_pdf_splits_into_segments() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 1,000.00")
        .header_row()
        .row("2025-01-15", "Groceries", Some("100.00"), None, Some("900.00"))
        .row("2025-01-16", "Salary", None, Some("2,000.00"), Some("2,900.00"))
        .gap(40.0)
        .free_line("Opening Balance 500.00")
        .header_row()
        .row("2025-02-10", "Rent", Some("450.00"), None, Some("50.00"))
        .row("2025-02-12", "Deposit", None, Some("100.00"), Some("150.00"))
        .build();

    let engine = Engine::with_defaults();
    let result = engine.process_document("merged.pdf", &fragments);
    let document = result.document.expect("document");

    assert_eq!(document.segments.len(), 2);
    assert_eq!(document.segments[0].opening_balance, Some(dec!(1000.00)));
    assert_eq!(document.segments[1].opening_balance, Some(dec!(500.00)));
    assert_eq!(document.segments[0].transactions.len(), 2);
    assert_eq!(document.segments[1].transactions.len(), 2);
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    assert_segment_balanced(&document, 0, dec!(0.01));
    assert_segment_balanced(&document, 1, dec!(0.01));
}

/// Merged-PDF splitting can be disabled.
#[test]
fn test_merged_pdf_splitting_disabled() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 1,000.00")
        .header_row()
        .row("2025-01-15", "Groceries", Some("100.00"), None, Some("900.00"))
        .free_line("Opening Balance 500.00")
        .header_row()
        .row("2025-02-10", "Rent", Some("450.00"), None, Some("50.00"))
        .build();

    let config = ProcessingConfig {
        detect_merged_pdfs: false,
        ..ProcessingConfig::default()
    };
    let engine = Engine::new(config).unwrap();
    let result = engine.process_document("merged.pdf", &fragments);
    let document = result.document.expect("document");
    assert_eq!(document.segments.len(), 1);
}

/// An explicit locale skips detection entirely.
#[test]
fn test_explicit_locale_configuration() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 1.000,00")
        .header_row() // English headers, but the caller knows better
        .row("15.01.2025", "Lohn", None, Some("1.234,56"), Some("2.234,56"))
        .row("16.01.2025", "Miete", Some("234,56"), None, Some("2.000,00"))
        .build();

    let config = ProcessingConfig {
        locale_detection: LocaleDetection::Explicit("de-DE".to_string()),
        ..ProcessingConfig::default()
    };
    let engine = Engine::new(config).unwrap();
    let result = engine.process_document("explicit.pdf", &fragments);
    let document = result.document.expect("document");
    assert_eq!(document.detected_locale, "de-DE");
    assert_eq!(
        document.segments[0].transactions[0].credit,
        Some(dec!(1234.56))
    );
}

/// Anchor mode locks header-keyword boxes as column strips.
#[test]
fn test_anchor_column_detection() {
    let config = ProcessingConfig {
        column_detection: ledgerlens_config::ColumnDetectionMode::Anchor,
        ..ProcessingConfig::default()
    };
    let engine = Engine::new(config).unwrap();
    let result = engine.process_document("anchored.pdf", &minimal_statement());
    let document = result.document.expect("document");
    assert_eq!(document.segments[0].transactions.len(), 3);
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
    let boundaries = result.column_boundaries.expect("boundaries");
    assert!(boundaries.iter().all(|b| b.confidence >= 0.95));
}

/// Fixed mode reuses the first table's layout for every region.
#[test]
fn test_fixed_column_detection() {
    let fragments = StatementFixture::new()
        .free_line("Opening Balance 1,000.00")
        .header_row()
        .row("2025-01-15", "Groceries", Some("100.00"), None, Some("900.00"))
        .row("2025-01-16", "Salary", None, Some("2,000.00"), Some("2,900.00"))
        .gap(40.0)
        .header_row()
        .row("2025-01-17", "Rent", Some("450.00"), None, Some("2,450.00"))
        .row("2025-01-18", "Fuel", Some("50.00"), None, Some("2,400.00"))
        .build();

    let config = ProcessingConfig {
        column_detection: ledgerlens_config::ColumnDetectionMode::Fixed,
        ..ProcessingConfig::default()
    };
    let engine = Engine::new(config).unwrap();
    let result = engine.process_document("fixed.pdf", &fragments);
    let document = result.document.expect("document");
    assert_eq!(document.segments[0].transactions.len(), 4);
    assert_eq!(document.overall_validation, ValidationStatus::Valid);
}

/// A negative-width bounding box is a fatal structural error.
#[test]
fn test_structural_error_fails_document() {
    use ledgerlens_core::{BoundingBox, TextFragment};
    let bad = TextFragment {
        text: "x".to_string(),
        bounding_box: BoundingBox {
            x: 0.0,
            y: 0.0,
            width: -5.0,
            height: 10.0,
        },
        page_number: 1,
        confidence: None,
        source: ledgerlens_core::TextSource::Native,
    };
    let engine = Engine::with_defaults();
    let result = engine.process_document("bad.pdf", &[bad]);
    assert!(!result.success);
    assert!(result.document.is_none());
    assert!(!result.errors.is_empty());
}
