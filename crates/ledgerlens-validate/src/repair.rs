//! Safe repair: bounded debit/credit classification fixes.
//!
//! Repair may only swap a row's debit and credit values; magnitudes,
//! balances, dates, and descriptions are untouchable. Each step must
//! strictly reduce the total imbalance, and a two-row flip is adopted only
//! when it lands the segment inside the closing tolerance.

use rust_decimal::Decimal;
use tracing::debug;

use ledgerlens_config::RepairConfig;
use ledgerlens_core::provenance::CellTransform;
use ledgerlens_core::{ProvenanceLedger, Transaction};

use crate::balance::measure_imbalance;

/// What a repair pass did.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairReport {
    /// Row indices whose debit/credit were swapped
    pub flipped_rows: Vec<usize>,
    /// Imbalance before repair
    pub imbalance_before: Decimal,
    /// Imbalance after repair
    pub imbalance_after: Decimal,
}

impl RepairReport {
    /// Human-readable summary for the document warnings.
    pub fn summary(&self) -> String {
        format!(
            "safe repair flipped debit/credit on row(s) {:?}; imbalance {} -> {}",
            self.flipped_rows, self.imbalance_before, self.imbalance_after
        )
    }
}

/// Attempt a bounded repair of a segment.
///
/// Preconditions: opening and closing balances known, and at least
/// `min_amount_coverage` of the rows carrying an amount. Returns the
/// repaired transactions and a report when a repair was adopted; `None`
/// leaves the caller's data untouched.
pub fn attempt_repair(
    transactions: &[Transaction],
    opening_balance: Option<Decimal>,
    closing_balance: Option<Decimal>,
    config: &RepairConfig,
    epsilon: Decimal,
    ledger: &mut ProvenanceLedger,
) -> Option<(Vec<Transaction>, RepairReport)> {
    if !config.enabled {
        return None;
    }
    let (opening, closing) = (opening_balance?, closing_balance?);
    if transactions.is_empty() {
        return None;
    }
    let with_amount = transactions.iter().filter(|t| t.has_amount()).count();
    let coverage = with_amount as f64 / transactions.len() as f64;
    if coverage < config.min_amount_coverage {
        debug!(coverage, "repair skipped: amount coverage below threshold");
        return None;
    }

    let imbalance_before = measure_imbalance(transactions, opening, closing);
    if imbalance_before == Decimal::ZERO {
        return None;
    }

    // Single-row flip: the candidate that reduces imbalance the most
    let mut best_single: Option<(usize, Vec<Transaction>, Decimal)> = None;
    for (index, tx) in transactions.iter().enumerate() {
        if !tx.has_amount() {
            continue;
        }
        let mut candidate = transactions.to_vec();
        candidate[index] = tx.with_flipped_amounts();
        let imbalance = measure_imbalance(&candidate, opening, closing);
        if imbalance < imbalance_before
            && best_single
                .as_ref()
                .map(|(_, _, b)| imbalance < *b)
                .unwrap_or(true)
        {
            best_single = Some((index, candidate, imbalance));
        }
    }

    let mut best: Option<(Vec<usize>, Vec<Transaction>, Decimal)> = None;
    match best_single {
        // A single flip that fully heals the segment wins outright
        Some((index, candidate, imbalance)) if imbalance < epsilon => {
            best = Some((vec![index], candidate, imbalance));
        }
        other => {
            // Two-row flip: bounded pair search, adopted only when the
            // result lands within the closing tolerance
            let amount_rows: Vec<usize> = transactions
                .iter()
                .enumerate()
                .filter(|(_, t)| t.has_amount())
                .map(|(i, _)| i)
                .collect();
            let mut tried = 0usize;
            'outer: for (a_pos, &a) in amount_rows.iter().enumerate() {
                for &b in amount_rows.iter().skip(a_pos + 1) {
                    if tried >= config.max_pair_candidates {
                        break 'outer;
                    }
                    tried += 1;
                    let mut candidate = transactions.to_vec();
                    candidate[a] = candidate[a].with_flipped_amounts();
                    candidate[b] = candidate[b].with_flipped_amounts();
                    let imbalance = measure_imbalance(&candidate, opening, closing);
                    if imbalance < epsilon && imbalance < imbalance_before {
                        best = Some((vec![a, b], candidate, imbalance));
                        break 'outer;
                    }
                }
            }
            // Fall back to a partially-healing single flip
            if best.is_none() {
                if let Some((index, candidate, imbalance)) = other {
                    best = Some((vec![index], candidate, imbalance));
                }
            }
        }
    }

    let (flipped_rows, mut repaired, imbalance_after) = best?;
    // Adopted only if the final state strictly improved
    if imbalance_after >= imbalance_before {
        return None;
    }

    for &index in &flipped_rows {
        let tx = &mut repaired[index];
        tx.confidence.flag("repaired");
        ledger.swap_amounts(&tx.id, CellTransform::RepairFlipped);
    }

    let report = RepairReport {
        flipped_rows,
        imbalance_before,
        imbalance_after,
    };
    debug!(flipped = ?report.flipped_rows, "safe repair adopted");
    Some((repaired, report))
}
