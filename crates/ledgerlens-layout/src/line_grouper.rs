//! Line grouping: cluster positioned fragments into logical lines.

use tracing::debug;

use ledgerlens_core::{Line, StageOutcome, TextFragment};

/// Cluster fragments into lines by Y-proximity per page.
///
/// Fragments are sorted by `(page, y, x)`; a fragment joins the current
/// line iff its page matches and its `y` lies within `y_tolerance` of the
/// line's anchor (the first fragment's top). Blank fragments are dropped
/// before grouping. Within each line, fragments end up in left-to-right
/// order.
pub fn group_into_lines(fragments: &[TextFragment], y_tolerance: f64) -> StageOutcome<Vec<Line>> {
    let mut warnings = Vec::new();

    let mut sorted: Vec<&TextFragment> = fragments.iter().filter(|f| !f.is_blank()).collect();
    let dropped = fragments.len() - sorted.len();
    if dropped > 0 {
        warnings.push(format!("dropped {dropped} blank fragments"));
    }
    sorted.sort_by(|a, b| {
        (a.page_number, a.bounding_box.y, a.bounding_box.x)
            .partial_cmp(&(b.page_number, b.bounding_box.y, b.bounding_box.x))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<TextFragment> = Vec::new();
    let mut anchor_y = f64::NEG_INFINITY;
    let mut anchor_page = 0u32;

    for fragment in sorted {
        let joins = fragment.page_number == anchor_page
            && (fragment.bounding_box.y - anchor_y).abs() <= y_tolerance;
        if !joins {
            if let Some(line) = flush(&mut current) {
                lines.push(line);
            }
            anchor_y = fragment.bounding_box.y;
            anchor_page = fragment.page_number;
        }
        current.push(fragment.clone());
    }
    if let Some(line) = flush(&mut current) {
        lines.push(line);
    }

    debug!(
        fragments = fragments.len(),
        lines = lines.len(),
        "grouped fragments into lines"
    );
    StageOutcome::with_warnings(lines, warnings)
}

fn flush(current: &mut Vec<TextFragment>) -> Option<Line> {
    if current.is_empty() {
        return None;
    }
    // Line::new only fails on mixed pages, which grouping rules out
    Line::new(std::mem::take(current)).ok()
}
