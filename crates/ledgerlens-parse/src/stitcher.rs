//! Multi-line stitching: merge continuation rows into their transactions.
//!
//! A continuation lacks a parseable date and any parseable amount but
//! carries description text. It merges into the most recent full row,
//! bounded at `max_continuations` per transaction. A dated row without an
//! amount stands alone as an incomplete row.

use tracing::debug;

use ledgerlens_core::{ExtractedRow, StageOutcome};

use crate::dates;
use crate::locale::LocaleProfile;
use crate::numbers;

/// Merge continuation rows into their preceding transactions.
pub fn stitch_rows(
    rows: Vec<ExtractedRow>,
    profile: &LocaleProfile,
    max_continuations: usize,
) -> StageOutcome<Vec<ExtractedRow>> {
    let mut warnings = Vec::new();
    let mut stitched: Vec<ExtractedRow> = Vec::new();
    let mut continuations_on_last = 0usize;
    let mut merged_count = 0usize;
    let mut dropped_leading = 0usize;

    for row in rows {
        if !is_continuation(&row, profile) {
            stitched.push(row);
            continuations_on_last = 0;
            continue;
        }

        let Some(parent) = stitched.last_mut() else {
            // A continuation with no preceding transaction has nothing to
            // attach to; drop it and say so
            dropped_leading += 1;
            continue;
        };
        if continuations_on_last >= max_continuations {
            warnings.push(format!(
                "continuation limit ({max_continuations}) reached on page {}; line kept separate",
                row.page_number
            ));
            stitched.push(row);
            continuations_on_last = 0;
            continue;
        }

        merge_into(parent, &row);
        continuations_on_last += 1;
        merged_count += 1;
    }

    if dropped_leading > 0 {
        warnings.push(format!(
            "dropped {dropped_leading} continuation lines with no preceding transaction"
        ));
    }

    debug!(merged = merged_count, rows = stitched.len(), "stitched continuation rows");
    StageOutcome::with_warnings(stitched, warnings)
}

/// Continuation: no parseable date, no parseable amount anywhere, but
/// description text present.
fn is_continuation(row: &ExtractedRow, profile: &LocaleProfile) -> bool {
    let has_date = row
        .raw_date
        .as_deref()
        .map(dates::is_date)
        .unwrap_or(false);
    if has_date {
        return false;
    }
    let amount_cells = [
        row.raw_debit.as_deref(),
        row.raw_credit.as_deref(),
        row.raw_amount.as_deref(),
        row.raw_balance.as_deref(),
    ];
    let has_amount = amount_cells
        .iter()
        .flatten()
        .any(|text| numbers::is_amount(text, &profile.number_format));
    if has_amount {
        return false;
    }
    row.raw_description
        .as_deref()
        .map(|d| !d.trim().is_empty())
        .unwrap_or(false)
}

/// Append a continuation's description into the parent, collapsing
/// whitespace and recording audit lines and pages.
fn merge_into(parent: &mut ExtractedRow, continuation: &ExtractedRow) {
    if parent.stitched_lines.is_empty() {
        parent.stitched_lines.push(parent.line_text.clone());
    }
    parent.stitched_lines.push(continuation.line_text.clone());

    if let Some(extra) = continuation.raw_description.as_deref() {
        let collapsed = extra.split_whitespace().collect::<Vec<_>>().join(" ");
        match &mut parent.raw_description {
            Some(description) => {
                description.push(' ');
                description.push_str(&collapsed);
            }
            None => parent.raw_description = Some(collapsed),
        }
    }
    if continuation.page_number != parent.page_number {
        parent.extra_page_numbers.push(continuation.page_number);
    }
    // Keep the worst OCR confidence of the merged lines
    parent.ocr_confidence = match (parent.ocr_confidence, continuation.ocr_confidence) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
}
