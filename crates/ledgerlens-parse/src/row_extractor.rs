//! Row extraction: map each line's fragments to column cells.

use tracing::debug;

use ledgerlens_core::catalog::headers;
use ledgerlens_core::{ColumnBoundary, ExtractedRow, Line, StageOutcome, TableRegion};

/// Extract one raw row per data line.
///
/// Each fragment lands in the column whose strip contains it (center
/// inside, or at least `overlap_threshold` of its width overlapping);
/// per-column text concatenates in X order. Lines that look like header
/// rows (a majority of cells match the header dictionary) are skipped.
pub fn extract_rows(
    region: &TableRegion,
    boundaries: &[ColumnBoundary],
    overlap_threshold: f64,
) -> StageOutcome<Vec<ExtractedRow>> {
    let mut warnings = Vec::new();
    if boundaries.is_empty() {
        warnings.push("no column boundaries; no rows extracted".to_string());
        return StageOutcome::with_warnings(Vec::new(), warnings);
    }

    let mut rows = Vec::new();
    let mut skipped_headers = 0usize;
    let mut unassigned_fragments = 0usize;

    for line in &region.data_lines {
        if is_header_line(line, boundaries, overlap_threshold) {
            skipped_headers += 1;
            continue;
        }
        let mut row = ExtractedRow::new(line.page_number);
        row.ocr_confidence = line.min_ocr_confidence();
        row.line_text = line.text();
        row.line_top = line.top();
        for fragment in &line.fragments {
            let column = boundaries
                .iter()
                .find(|b| b.contains_fragment(&fragment.bounding_box, overlap_threshold));
            match column {
                Some(boundary) => row.push_cell_with_source(
                    boundary.inferred_type,
                    &fragment.text,
                    fragment.page_number,
                    fragment.bounding_box,
                ),
                None => unassigned_fragments += 1,
            }
        }
        if !row.is_blank() {
            rows.push(row);
        }
    }

    if skipped_headers > 1 {
        warnings.push(format!("skipped {skipped_headers} repeated header lines"));
    }
    if unassigned_fragments > 0 {
        warnings.push(format!(
            "{unassigned_fragments} fragments fell outside every column"
        ));
    }

    debug!(
        lines = region.data_lines.len(),
        rows = rows.len(),
        skipped_headers,
        "extracted raw rows"
    );
    StageOutcome::with_warnings(rows, warnings)
}

/// A line is a header iff at least half its fragments match the header
/// dictionary.
fn is_header_line(line: &Line, boundaries: &[ColumnBoundary], overlap_threshold: f64) -> bool {
    let in_table: Vec<&str> = line
        .fragments
        .iter()
        .filter(|f| {
            boundaries
                .iter()
                .any(|b| b.contains_fragment(&f.bounding_box, overlap_threshold))
        })
        .map(|f| f.text.as_str())
        .collect();
    if in_table.is_empty() {
        return false;
    }
    let keyword_hits = in_table
        .iter()
        .filter(|t| headers::lookup_fuzzy(t).is_some())
        .count();
    keyword_hits * 2 >= in_table.len()
}
