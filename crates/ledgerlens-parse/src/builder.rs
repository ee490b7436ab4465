//! Transaction building: turn stitched raw rows into typed transactions.
//!
//! This is where every cell either parses or is recorded as a gap. No
//! value is ever synthesized: a failed parse leaves the cell empty with a
//! `parse_failed` provenance record and an `error` status on the row.

use rust_decimal::Decimal;
use tracing::debug;

use ledgerlens_config::ProcessingConfig;
use ledgerlens_core::provenance::{CellField, CellTransform, MissingReason, Provenance};
use ledgerlens_core::{
    ColumnType, ConfidenceFactors, ExtractedRow, ProvenanceLedger, RowIdFactory, StageOutcome,
    Transaction, TransactionConfidence, ValidationStatus,
};

use crate::category;
use crate::currency;
use crate::dates;
use crate::locale::LocaleProfile;
use crate::numbers::{self, AmountSuffix};

/// Build transactions from stitched rows, recording provenance per cell.
///
/// `reference_year` (from the statement period) resolves year-less dates.
#[allow(clippy::too_many_arguments)]
pub fn build_transactions(
    rows: &[ExtractedRow],
    profile: &LocaleProfile,
    config: &ProcessingConfig,
    reference_year: Option<i32>,
    ids: &mut RowIdFactory,
    ledger: &mut ProvenanceLedger,
) -> StageOutcome<Vec<Transaction>> {
    let mut warnings = Vec::new();
    let mut transactions = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let id = ids.next_id();
        let mut tx = Transaction::new(id, index, row.page_number);
        let mut factors = ConfidenceFactors::default();
        let mut flags = Vec::new();
        let mut status = ValidationStatus::Unchecked;
        let mut message: Option<String> = None;

        tx.source_page_numbers = row.all_page_numbers();
        if row.is_stitched() {
            tx.is_stitched = true;
            tx.original_lines = row.stitched_lines.clone();
            flags.push("stitched".to_string());
        }
        if let Some(ocr) = row.ocr_confidence {
            factors.ocr = Some((ocr * 100.0).clamp(0.0, 100.0));
            if ocr < config.confidence_threshold {
                flags.push("low_ocr_confidence".to_string());
            }
        }

        parse_date_cell(row, profile, reference_year, &mut tx, &mut factors, &mut status, &mut message, ledger);
        parse_description_cell(row, config, &mut tx, &mut factors, ledger);
        parse_amount_cells(row, profile, &mut tx, &mut factors, &mut status, &mut message, &mut flags, ledger);
        parse_balance_cell(row, profile, &mut tx, &mut factors, &mut status, &mut message, ledger);
        parse_reference_cell(row, &mut tx, ledger);

        if config.enable_currency_detection {
            apply_currency_conversion(row, config, &mut tx, &mut flags, &mut warnings, ledger);
        }

        tx.validation_status = status;
        tx.validation_message = message;
        tx.confidence = TransactionConfidence::from_factors(factors, flags);
        transactions.push(tx);
    }

    debug!(rows = rows.len(), transactions = transactions.len(), "built transactions");
    StageOutcome::with_warnings(transactions, warnings)
}

#[allow(clippy::too_many_arguments)]
fn parse_date_cell(
    row: &ExtractedRow,
    profile: &LocaleProfile,
    reference_year: Option<i32>,
    tx: &mut Transaction,
    factors: &mut ConfidenceFactors,
    status: &mut ValidationStatus,
    message: &mut Option<String>,
    ledger: &mut ProvenanceLedger,
) {
    match row.raw_date.as_deref() {
        Some(raw) => match dates::parse_date(raw, profile, reference_year) {
            Ok(date) => {
                tx.date = Some(date);
                if let Some(source) = row.source_for(ColumnType::Date) {
                    ledger.record(
                        &tx.id,
                        CellField::Date,
                        Provenance::from_source(
                            dates::to_iso(date),
                            &source.text,
                            source.page_number,
                            source.bounding_box,
                        )
                        .transformed(CellTransform::Trimmed)
                        .transformed(CellTransform::ParsedDate),
                    );
                }
            }
            Err(e) => {
                factors.date = 0.0;
                *status = status.worst(ValidationStatus::Error);
                *message = Some(e.to_string());
                ledger.record_missing(&tx.id, CellField::Date, MissingReason::ParseFailed);
            }
        },
        None => {
            factors.date = 0.0;
            ledger.record_missing(&tx.id, CellField::Date, MissingReason::Absent);
        }
    }
}

fn parse_description_cell(
    row: &ExtractedRow,
    config: &ProcessingConfig,
    tx: &mut Transaction,
    factors: &mut ConfidenceFactors,
    ledger: &mut ProvenanceLedger,
) {
    match row.raw_description.as_deref() {
        Some(raw) => {
            let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            tx.description = collapsed.clone();
            if let Some(source) = row.source_for(ColumnType::Description) {
                let mut provenance = Provenance::from_source(
                    collapsed,
                    &source.text,
                    source.page_number,
                    source.bounding_box,
                )
                .transformed(CellTransform::Trimmed);
                if row.is_stitched() {
                    provenance = provenance.transformed(CellTransform::Stitched);
                }
                ledger.record(&tx.id, CellField::Description, provenance);
            }
            if config.enable_categorization {
                if let Some((name, confidence)) = category::categorize(&tx.description) {
                    tx.category = Some(name);
                    tx.category_confidence = Some(confidence);
                }
            }
        }
        None => {
            factors.description = 0.0;
            ledger.record_missing(&tx.id, CellField::Description, MissingReason::Absent);
        }
    }
}

/// Parse debit, credit, and merged-amount cells. Negatives land in the
/// opposite column; magnitudes never change.
#[allow(clippy::too_many_arguments)]
fn parse_amount_cells(
    row: &ExtractedRow,
    profile: &LocaleProfile,
    tx: &mut Transaction,
    factors: &mut ConfidenceFactors,
    status: &mut ValidationStatus,
    message: &mut Option<String>,
    flags: &mut Vec<String>,
    ledger: &mut ProvenanceLedger,
) {
    let format = &profile.number_format;
    let mut any_failure = false;

    // Dedicated debit column
    if let Some(raw) = row.raw_debit.as_deref() {
        match numbers::parse_amount(raw, format) {
            Ok(parsed) if !parsed.value.is_zero() => {
                let (field, column) = if parsed.negative {
                    flags.push("negative_normalized".to_string());
                    (CellField::Credit, ColumnType::Debit)
                } else {
                    (CellField::Debit, ColumnType::Debit)
                };
                set_amount(tx, field, parsed.value);
                record_amount(row, column, field, parsed.value, parsed.negative, &tx.id, ledger);
            }
            Ok(_) => {}
            Err(e) => {
                any_failure = true;
                *message = Some(e.to_string());
                ledger.record_missing(&tx.id, CellField::Debit, MissingReason::ParseFailed);
            }
        }
    }

    // Dedicated credit column
    if let Some(raw) = row.raw_credit.as_deref() {
        match numbers::parse_amount(raw, format) {
            Ok(parsed) if !parsed.value.is_zero() => {
                let (field, column) = if parsed.negative {
                    flags.push("negative_normalized".to_string());
                    (CellField::Debit, ColumnType::Credit)
                } else {
                    (CellField::Credit, ColumnType::Credit)
                };
                set_amount(tx, field, parsed.value);
                record_amount(row, column, field, parsed.value, parsed.negative, &tx.id, ledger);
            }
            Ok(_) => {}
            Err(e) => {
                any_failure = true;
                *message = Some(e.to_string());
                ledger.record_missing(&tx.id, CellField::Credit, MissingReason::ParseFailed);
            }
        }
    }

    // Merged amount column: DR/CR suffix wins, then sign
    if let Some(raw) = row.raw_amount.as_deref() {
        match numbers::parse_amount(raw, format) {
            Ok(parsed) if !parsed.value.is_zero() => {
                let field = match (parsed.suffix, parsed.negative) {
                    (Some(AmountSuffix::Dr), _) => CellField::Debit,
                    (Some(AmountSuffix::Cr), _) => CellField::Credit,
                    (None, true) => CellField::Debit,
                    (None, false) => CellField::Credit,
                };
                set_amount(tx, field, parsed.value);
                record_amount(row, ColumnType::Amount, field, parsed.value, parsed.negative, &tx.id, ledger);
            }
            Ok(_) => {}
            Err(e) => {
                any_failure = true;
                *message = Some(e.to_string());
                ledger.record_missing(&tx.id, CellField::Debit, MissingReason::ParseFailed);
            }
        }
    }

    if any_failure {
        factors.amount = 0.0;
        *status = status.worst(ValidationStatus::Error);
    } else if !tx.has_amount() {
        factors.amount = 50.0;
        ledger.record_missing(&tx.id, CellField::Debit, MissingReason::Absent);
        ledger.record_missing(&tx.id, CellField::Credit, MissingReason::Absent);
    }
}

fn set_amount(tx: &mut Transaction, field: CellField, value: Decimal) {
    match field {
        CellField::Debit => tx.debit = Some(value),
        CellField::Credit => tx.credit = Some(value),
        _ => {}
    }
}

fn record_amount(
    row: &ExtractedRow,
    column: ColumnType,
    field: CellField,
    value: Decimal,
    negated: bool,
    tx_id: &str,
    ledger: &mut ProvenanceLedger,
) {
    if let Some(source) = row.source_for(column) {
        let mut provenance = Provenance::from_source(
            value.to_string(),
            &source.text,
            source.page_number,
            source.bounding_box,
        )
        .transformed(CellTransform::Trimmed)
        .transformed(CellTransform::ParsedNumber);
        if negated {
            provenance = provenance.transformed(CellTransform::NegativeNormalized);
        }
        ledger.record(tx_id, field, provenance);
    }
}

#[allow(clippy::too_many_arguments)]
fn parse_balance_cell(
    row: &ExtractedRow,
    profile: &LocaleProfile,
    tx: &mut Transaction,
    factors: &mut ConfidenceFactors,
    status: &mut ValidationStatus,
    message: &mut Option<String>,
    ledger: &mut ProvenanceLedger,
) {
    match row.raw_balance.as_deref() {
        Some(raw) => match numbers::parse_amount(raw, &profile.number_format) {
            Ok(parsed) => {
                let value = if parsed.negative {
                    -parsed.value
                } else {
                    parsed.value
                };
                tx.balance = Some(value);
                if let Some(source) = row.source_for(ColumnType::Balance) {
                    ledger.record(
                        &tx.id,
                        CellField::Balance,
                        Provenance::from_source(
                            value.to_string(),
                            &source.text,
                            source.page_number,
                            source.bounding_box,
                        )
                        .transformed(CellTransform::Trimmed)
                        .transformed(CellTransform::ParsedNumber),
                    );
                }
            }
            Err(e) => {
                factors.balance = 0.0;
                *status = status.worst(ValidationStatus::Error);
                *message = Some(e.to_string());
                ledger.record_missing(&tx.id, CellField::Balance, MissingReason::ParseFailed);
            }
        },
        None => {
            // Balance is mandatory; a missing cell is an error and is
            // never computed here
            factors.balance = 0.0;
            *status = status.worst(ValidationStatus::Error);
            if message.is_none() {
                *message = Some("balance cell missing".to_string());
            }
            ledger.record_missing(&tx.id, CellField::Balance, MissingReason::Absent);
        }
    }
}

fn parse_reference_cell(row: &ExtractedRow, tx: &mut Transaction, ledger: &mut ProvenanceLedger) {
    if let Some(raw) = row.raw_reference.as_deref() {
        let trimmed = raw.trim().to_string();
        if trimmed.is_empty() {
            return;
        }
        tx.reference_type = Some(category::classify_reference(&trimmed));
        tx.reference = Some(trimmed.clone());
        if let Some(source) = row.source_for(ColumnType::Reference) {
            ledger.record(
                &tx.id,
                CellField::Reference,
                Provenance::from_source(trimmed, &source.text, source.page_number, source.bounding_box)
                    .transformed(CellTransform::Trimmed),
            );
        }
    }
}

fn apply_currency_conversion(
    row: &ExtractedRow,
    config: &ProcessingConfig,
    tx: &mut Transaction,
    flags: &mut Vec<String>,
    warnings: &mut Vec<String>,
    ledger: &mut ProvenanceLedger,
) {
    if !tx.has_amount() {
        return;
    }
    let Some(conversion) = currency::conversion_for_row(&tx.description, &config.local_currency)
    else {
        return;
    };

    tx.original_currency = Some(conversion.original_currency.clone());
    tx.exchange_rate = Some(conversion.rate);
    tx.local_currency = Some(config.local_currency.clone());
    tx.original_debit = tx.debit;
    tx.original_credit = tx.credit;

    if let Some(debit) = tx.debit {
        if let Some((converted, _)) =
            currency::convert(debit, &conversion.original_currency, &config.local_currency)
        {
            tx.debit = Some(converted);
            ledger.append_transform(&tx.id, CellField::Debit, CellTransform::CurrencyConverted);
        }
    }
    if let Some(credit) = tx.credit {
        if let Some((converted, _)) =
            currency::convert(credit, &conversion.original_currency, &config.local_currency)
        {
            tx.credit = Some(converted);
            ledger.append_transform(&tx.id, CellField::Credit, CellTransform::CurrencyConverted);
        }
    }

    flags.push("currency_converted".to_string());
    warnings.push(format!(
        "row {} converted from {} at USD-pivot rate {} (balance left in source currency)",
        row.page_number, conversion.original_currency, conversion.rate
    ));
}
