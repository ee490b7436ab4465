//! Chronology normalization: detect date order and reverse newest-first
//! documents into ascending order.
//!
//! Reversal is the only place the engine writes the balance column: the
//! reversed rows get balances recomputed from the opening balance through
//! the delta series. A December-to-January guard keeps year rollovers in
//! year-less documents from masquerading as descents.

use rust_decimal::Decimal;
use tracing::debug;

use ledgerlens_core::provenance::CellTransform;
use ledgerlens_core::{DateOrder, ProvenanceLedger, StageOutcome, Transaction};

/// Minimum confidence before a descending document is reversed.
const REVERSAL_CONFIDENCE: f64 = 0.8;

/// Classify the date ordering of a transaction sequence.
///
/// Returns the order and a confidence: the dominant direction's share of
/// all unequal transitions. Rows without parseable dates are skipped.
pub fn detect_date_order(transactions: &[Transaction]) -> (DateOrder, f64) {
    let dates: Vec<_> = transactions.iter().filter_map(|t| t.date).collect();
    if dates.len() < 2 {
        return (DateOrder::Unknown, 0.0);
    }

    let mut ascending = 0usize;
    let mut descending = 0usize;
    for pair in dates.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next > prev {
            ascending += 1;
        } else if next < prev {
            // Year-rollover guard: a same-year December -> January step is
            // an ascent whose year was inferred too early, not a descent
            if is_year_rollover(prev, next) {
                ascending += 1;
            } else {
                descending += 1;
            }
        }
    }

    let unequal = ascending + descending;
    if unequal == 0 {
        return (DateOrder::Unknown, 0.0);
    }
    let confidence = ascending.max(descending) as f64 / unequal as f64;
    let order = if ascending == unequal {
        DateOrder::Ascending
    } else if descending == unequal {
        DateOrder::Descending
    } else if confidence >= REVERSAL_CONFIDENCE {
        if ascending > descending {
            DateOrder::Ascending
        } else {
            DateOrder::Descending
        }
    } else {
        DateOrder::Mixed
    };
    (order, confidence)
}

fn is_year_rollover(prev: chrono::NaiveDate, next: chrono::NaiveDate) -> bool {
    use chrono::Datelike;
    prev.year() == next.year() && prev.month() == 12 && next.month() == 1
}

/// Reverse a descending segment into ascending order.
///
/// When the order is descending with confidence at or above 0.8 (and
/// `auto_reverse` allows), the list reverses, row indices are reassigned,
/// and balances are recomputed from the opening balance through the delta
/// series. With no opening balance the earliest row's extracted balance
/// anchors the chain and is itself left untouched.
pub fn normalize_chronology(
    transactions: Vec<Transaction>,
    opening_balance: Option<Decimal>,
    auto_reverse: bool,
    ledger: &mut ProvenanceLedger,
) -> StageOutcome<(Vec<Transaction>, DateOrder, bool)> {
    let mut warnings = Vec::new();
    let (order, confidence) = detect_date_order(&transactions);

    let should_reverse =
        auto_reverse && order == DateOrder::Descending && confidence >= REVERSAL_CONFIDENCE;
    if !should_reverse {
        if order == DateOrder::Descending && !auto_reverse {
            warnings.push("descending date order detected; auto-reversal disabled".to_string());
        }
        return StageOutcome::with_warnings((transactions, order, false), warnings);
    }

    let mut reversed: Vec<Transaction> = transactions.into_iter().rev().collect();
    for (index, tx) in reversed.iter_mut().enumerate() {
        tx.row_index = index;
    }

    recompute_balances(&mut reversed, opening_balance, ledger, &mut warnings);

    warnings.push(format!(
        "document reversed into chronological order (descending confidence {confidence:.2})"
    ));
    debug!(rows = reversed.len(), "reversed descending document");
    StageOutcome::with_warnings((reversed, DateOrder::Descending, true), warnings)
}

/// Recompute the balance chain after reversal.
///
/// Each row's balance becomes `previous + credit - debit`. Rows whose
/// recomputed balance differs from the extracted one get a provenance
/// transform and a confidence flag; rows without amounts keep their
/// extracted balance and re-anchor the chain.
fn recompute_balances(
    transactions: &mut [Transaction],
    opening_balance: Option<Decimal>,
    ledger: &mut ProvenanceLedger,
    warnings: &mut Vec<String>,
) {
    let mut running = match opening_balance {
        Some(opening) => opening,
        None => {
            // Anchor on the earliest row's extracted balance
            let Some(first) = transactions.first() else {
                return;
            };
            let Some(balance) = first.balance else {
                warnings.push(
                    "cannot recompute balances after reversal: no opening balance and first row has none"
                        .to_string(),
                );
                return;
            };
            warnings.push(
                "no opening balance; reversal anchored on the earliest row's balance".to_string(),
            );
            balance
        }
    };

    let anchored_without_opening = opening_balance.is_none();
    let mut recomputed_differs = 0usize;
    for (index, tx) in transactions.iter_mut().enumerate() {
        if anchored_without_opening && index == 0 {
            // The anchor row keeps its extracted balance untouched
            continue;
        }
        if !tx.has_amount() {
            if let Some(balance) = tx.balance {
                running = balance;
            }
            continue;
        }
        running += tx.delta();
        if tx.balance != Some(running) {
            recomputed_differs += 1;
            tx.confidence.flag("balance_recomputed_on_reversal");
            ledger.append_transform(
                &tx.id,
                ledgerlens_core::provenance::CellField::Balance,
                CellTransform::ReversalRecomputed,
            );
        }
        tx.balance = Some(running);
    }
    if recomputed_differs > 0 {
        warnings.push(format!(
            "{recomputed_differs} balances recomputed to new values during reversal"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(index: usize, date: (i32, u32, u32), debit: Option<Decimal>, credit: Option<Decimal>, balance: Decimal) -> Transaction {
        let mut tx = Transaction::new(format!("t{index}"), index, 1);
        tx.date = NaiveDate::from_ymd_opt(date.0, date.1, date.2);
        tx.debit = debit;
        tx.credit = credit;
        tx.balance = Some(balance);
        tx
    }

    fn ascending_set() -> Vec<Transaction> {
        vec![
            tx(0, (2025, 1, 15), None, Some(dec!(5250.00)), dec!(12450.00)),
            tx(1, (2025, 1, 16), Some(dec!(1200.00)), None, dec!(11250.00)),
            tx(2, (2025, 1, 17), Some(dec!(89.99)), None, dec!(11160.01)),
        ]
    }

    #[test]
    fn test_detect_ascending() {
        let (order, confidence) = detect_date_order(&ascending_set());
        assert_eq!(order, DateOrder::Ascending);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn test_detect_descending() {
        let mut txs = ascending_set();
        txs.reverse();
        let (order, confidence) = detect_date_order(&txs);
        assert_eq!(order, DateOrder::Descending);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn test_too_few_dates_unknown() {
        let txs = vec![tx(0, (2025, 1, 15), None, None, dec!(1.00))];
        assert_eq!(detect_date_order(&txs).0, DateOrder::Unknown);
    }

    #[test]
    fn test_year_rollover_not_a_descent() {
        // Dec 28 then Jan 3, both carrying the same inferred year
        let txs = vec![
            tx(0, (2025, 12, 28), Some(dec!(10.00)), None, dec!(90.00)),
            tx(1, (2025, 1, 3), Some(dec!(5.00)), None, dec!(85.00)),
        ];
        let (order, _) = detect_date_order(&txs);
        assert_eq!(order, DateOrder::Ascending);
    }

    #[test]
    fn test_reversal_recomputes_balances() {
        let mut descending = ascending_set();
        descending.reverse();
        for (index, tx) in descending.iter_mut().enumerate() {
            tx.row_index = index;
        }
        let mut ledger = ProvenanceLedger::new();
        let outcome =
            normalize_chronology(descending, Some(dec!(7200.00)), true, &mut ledger);
        let (reversed, order, was_reversed) = outcome.output;
        assert!(was_reversed);
        assert_eq!(order, DateOrder::Descending);
        // Ascending emission order with reassigned indices
        assert_eq!(reversed[0].date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(reversed[2].date, NaiveDate::from_ymd_opt(2025, 1, 17));
        assert_eq!(
            reversed.iter().map(|t| t.row_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Balance chain from the opening balance; closing matches source
        assert_eq!(reversed[0].balance, Some(dec!(12450.00)));
        assert_eq!(reversed[1].balance, Some(dec!(11250.00)));
        assert_eq!(reversed[2].balance, Some(dec!(11160.01)));
    }

    #[test]
    fn test_ascending_document_untouched() {
        let txs = ascending_set();
        let mut ledger = ProvenanceLedger::new();
        let outcome = normalize_chronology(txs.clone(), Some(dec!(7200.00)), true, &mut ledger);
        let (result, order, was_reversed) = outcome.output;
        assert!(!was_reversed);
        assert_eq!(order, DateOrder::Ascending);
        assert_eq!(result, txs);
    }

    #[test]
    fn test_reversal_idempotent() {
        // Reversing a descending document once yields ascending; running
        // normalization again changes nothing
        let mut descending = ascending_set();
        descending.reverse();
        let mut ledger = ProvenanceLedger::new();
        let first =
            normalize_chronology(descending, Some(dec!(7200.00)), true, &mut ledger).output;
        let second =
            normalize_chronology(first.0.clone(), Some(dec!(7200.00)), true, &mut ledger).output;
        assert!(!second.2);
        assert_eq!(second.0, first.0);
    }

    #[test]
    fn test_auto_reverse_disabled_warns() {
        let mut descending = ascending_set();
        descending.reverse();
        let mut ledger = ProvenanceLedger::new();
        let outcome = normalize_chronology(descending, None, false, &mut ledger);
        assert!(!outcome.output.2);
        assert!(outcome.warnings.iter().any(|w| w.contains("disabled")));
    }
}
