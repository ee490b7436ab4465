//! Row-by-row balance validation with tiered tolerances.
//!
//! The invariant per row: `previous_balance + credit - debit = balance`,
//! where the previous balance is the opening balance for the first row.
//! Differences land in one of three tiers (exact / rounding / cent); the
//! tier decides the row's validation status.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use ledgerlens_config::ToleranceConfig;
use ledgerlens_core::{Transaction, ValidationStatus};

/// Default tolerance for the standalone quick check.
const QUICK_EPSILON: Decimal = dec!(0.01);

/// Standalone single-row check: does the balance equation hold within the
/// default tolerance?
pub fn quick_validate(
    prev_balance: Decimal,
    debit: Option<Decimal>,
    credit: Option<Decimal>,
    current_balance: Decimal,
) -> bool {
    let expected = prev_balance + credit.unwrap_or_default() - debit.unwrap_or_default();
    (expected - current_balance).abs() <= QUICK_EPSILON
}

/// Outcome of validating one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentValidation {
    /// Worst status over the segment
    pub status: ValidationStatus,
    /// Whether the closing balance matched the last row
    pub closing_matched: Option<bool>,
    /// Sum of absolute row-level imbalances plus the closing gap
    pub total_imbalance: Decimal,
    /// Messages describing each violation
    pub messages: Vec<String>,
}

/// Validate a segment's rows in place, assigning statuses and messages.
///
/// `opening_balance` seeds the chain; without it the first row anchors the
/// chain unchecked. `closing_balance` (from a marker) is compared against
/// the last row within `tolerances.epsilon`.
pub fn validate_segment(
    transactions: &mut [Transaction],
    opening_balance: Option<Decimal>,
    closing_balance: Option<Decimal>,
    tolerances: &ToleranceConfig,
) -> SegmentValidation {
    let mut messages = Vec::new();
    let mut total_imbalance = Decimal::ZERO;
    let mut prev: Option<Decimal> = opening_balance;

    for tx in transactions.iter_mut() {
        // Rows already in error (parse failures, missing balance) stay
        // errors; they still break the chain
        if tx.validation_status == ValidationStatus::Error || tx.balance.is_none() {
            if tx.balance.is_none() && tx.validation_message.is_none() {
                tx.validation_message = Some("balance missing; row cannot be verified".to_string());
            }
            tx.validation_status = ValidationStatus::Error;
            tx.confidence.factors.balance = 0.0;
            tx.confidence = ledgerlens_core::TransactionConfidence::from_factors(
                tx.confidence.factors.clone(),
                tx.confidence.flags.clone(),
            );
            prev = None;
            continue;
        }
        let balance = tx.balance.expect("checked above");

        let Some(previous) = prev else {
            // No chain to check against; this row anchors it
            tx.validation_status = ValidationStatus::Valid;
            prev = Some(balance);
            continue;
        };

        let expected = previous + tx.delta();
        let diff = (expected - balance).abs();
        total_imbalance += diff;

        let (status, message) = if diff <= tolerances.rounding {
            (ValidationStatus::Valid, None)
        } else if diff <= tolerances.cent {
            (
                ValidationStatus::Warning,
                Some(format!("balance off by {diff} (within cent tolerance)")),
            )
        } else {
            (
                ValidationStatus::Error,
                Some(format!(
                    "balance mismatch: expected {expected}, extracted {balance} (off by {diff})"
                )),
            )
        };
        tx.validation_status = status;
        match message {
            Some(ref message) => {
                messages.push(format!("row {}: {message}", tx.row_index));
                tx.validation_message = Some(message.clone());
            }
            None => tx.validation_message = None,
        }
        if status != ValidationStatus::Valid {
            tx.confidence.factors.balance = if status == ValidationStatus::Warning {
                50.0
            } else {
                0.0
            };
            tx.confidence = ledgerlens_core::TransactionConfidence::from_factors(
                tx.confidence.factors.clone(),
                tx.confidence.flags.clone(),
            );
        }
        prev = Some(balance);
    }

    // Closing-balance check against the last row with a balance
    let closing_matched = match (closing_balance, last_balance(transactions)) {
        (Some(declared), Some(last)) => {
            let gap = (declared - last).abs();
            total_imbalance += gap;
            if gap > tolerances.epsilon {
                messages.push(format!(
                    "closing balance {declared} does not match last row balance {last}"
                ));
                Some(false)
            } else {
                Some(true)
            }
        }
        _ => None,
    };

    let row_status = transactions
        .iter()
        .map(|t| t.validation_status)
        .fold(ValidationStatus::Valid, ValidationStatus::worst);
    let status = match closing_matched {
        Some(false) => row_status.worst(ValidationStatus::Error),
        _ => row_status,
    };

    debug!(
        rows = transactions.len(),
        ?status,
        %total_imbalance,
        "validated segment"
    );
    SegmentValidation {
        status,
        closing_matched,
        total_imbalance,
        messages,
    }
}

/// Total imbalance of a candidate transaction ordering, used by repair to
/// compare states without mutating statuses.
pub fn measure_imbalance(
    transactions: &[Transaction],
    opening_balance: Decimal,
    closing_balance: Decimal,
) -> Decimal {
    let mut total = Decimal::ZERO;
    let mut prev = Some(opening_balance);
    for tx in transactions {
        let Some(balance) = tx.balance else {
            // A balance gap breaks the chain; the next balanced row
            // re-anchors it, mirroring validate_segment
            prev = None;
            continue;
        };
        if let Some(previous) = prev {
            let expected = previous + tx.delta();
            total += (expected - balance).abs();
        }
        prev = Some(balance);
    }
    if let Some(last) = last_balance(transactions) {
        total += (closing_balance - last).abs();
    }
    total
}

fn last_balance(transactions: &[Transaction]) -> Option<Decimal> {
    transactions.iter().rev().find_map(|t| t.balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(index: usize, debit: Option<Decimal>, credit: Option<Decimal>, balance: Decimal) -> Transaction {
        let mut tx = Transaction::new(format!("t{index}"), index, 1);
        tx.date = NaiveDate::from_ymd_opt(2025, 1, 15 + index as u32);
        tx.debit = debit;
        tx.credit = credit;
        tx.balance = Some(balance);
        tx
    }

    #[test]
    fn test_quick_validate() {
        assert!(quick_validate(dec!(7200.00), None, Some(dec!(5250.00)), dec!(12450.00)));
        assert!(quick_validate(dec!(12450.00), Some(dec!(1200.00)), None, dec!(11250.00)));
        assert!(!quick_validate(dec!(12450.00), None, Some(dec!(1200.00)), dec!(11250.00)));
        // Tolerance boundary
        assert!(quick_validate(dec!(100.00), None, None, dec!(100.01)));
        assert!(!quick_validate(dec!(100.00), None, None, dec!(100.02)));
    }

    #[test]
    fn test_all_rows_valid() {
        let mut txs = vec![
            tx(0, None, Some(dec!(5250.00)), dec!(12450.00)),
            tx(1, Some(dec!(1200.00)), None, dec!(11250.00)),
            tx(2, Some(dec!(89.99)), None, dec!(11160.01)),
        ];
        let validation = validate_segment(
            &mut txs,
            Some(dec!(7200.00)),
            None,
            &ToleranceConfig::default(),
        );
        assert_eq!(validation.status, ValidationStatus::Valid);
        assert!(txs.iter().all(|t| t.validation_status == ValidationStatus::Valid));
        assert_eq!(validation.total_imbalance, Decimal::ZERO);
    }

    #[test]
    fn test_tolerance_tiers() {
        let tolerances = ToleranceConfig::default();
        // Off by exactly one cent: valid (rounding tier)
        let mut txs = vec![tx(0, None, Some(dec!(10.00)), dec!(110.01))];
        let v = validate_segment(&mut txs, Some(dec!(100.00)), None, &tolerances);
        assert_eq!(v.status, ValidationStatus::Valid);

        // Off by three cents: warning (cent tier)
        let mut txs = vec![tx(0, None, Some(dec!(10.00)), dec!(110.03))];
        let v = validate_segment(&mut txs, Some(dec!(100.00)), None, &tolerances);
        assert_eq!(v.status, ValidationStatus::Warning);

        // Off by a unit: error
        let mut txs = vec![tx(0, None, Some(dec!(10.00)), dec!(111.00))];
        let v = validate_segment(&mut txs, Some(dec!(100.00)), None, &tolerances);
        assert_eq!(v.status, ValidationStatus::Error);
    }

    #[test]
    fn test_missing_balance_breaks_chain() {
        let mut txs = vec![
            tx(0, None, Some(dec!(10.00)), dec!(110.00)),
            {
                let mut t = tx(1, Some(dec!(5.00)), None, dec!(0.00));
                t.balance = None;
                t
            },
            tx(2, Some(dec!(5.00)), None, dec!(100.00)),
        ];
        let v = validate_segment(&mut txs, Some(dec!(100.00)), None, &ToleranceConfig::default());
        assert_eq!(txs[1].validation_status, ValidationStatus::Error);
        // Row 2 re-anchors the chain rather than checking against row 0
        assert_eq!(txs[2].validation_status, ValidationStatus::Valid);
        assert_eq!(v.status, ValidationStatus::Error);
    }

    #[test]
    fn test_closing_balance_mismatch_is_error() {
        let mut txs = vec![tx(0, None, Some(dec!(10.00)), dec!(110.00))];
        let v = validate_segment(
            &mut txs,
            Some(dec!(100.00)),
            Some(dec!(200.00)),
            &ToleranceConfig::default(),
        );
        assert_eq!(v.closing_matched, Some(false));
        assert_eq!(v.status, ValidationStatus::Error);
    }

    #[test]
    fn test_no_opening_balance_anchors_first_row() {
        let mut txs = vec![
            tx(0, None, Some(dec!(10.00)), dec!(110.00)),
            tx(1, Some(dec!(10.00)), None, dec!(100.00)),
        ];
        let v = validate_segment(&mut txs, None, None, &ToleranceConfig::default());
        assert_eq!(v.status, ValidationStatus::Valid);
    }

    #[test]
    fn test_measure_imbalance() {
        let txs = vec![
            tx(0, None, Some(dec!(10.00)), dec!(110.00)),
            tx(1, None, Some(dec!(20.00)), dec!(110.00)), // should be 130
        ];
        let imbalance = measure_imbalance(&txs, dec!(100.00), dec!(110.00));
        assert_eq!(imbalance, dec!(20.00));
    }
}
