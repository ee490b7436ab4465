//! Segmentation: split a document on opening-balance marker rows.
//!
//! Several statements concatenated into one PDF repeat their opening
//! balance marker; each repetition starts a new independent segment with
//! its own opening and closing balances. Marker lines are consumed (they
//! are not transactions).

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use ledgerlens_core::{ExtractedRow, Line, StageOutcome};
use ledgerlens_parse::locale::LocaleProfile;
use ledgerlens_parse::numbers;

static OPENING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(opening balance|balance brought forward|brought forward|beginning balance|b/f)\b")
        .expect("opening marker regex")
});
static CLOSING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(closing balance|balance carried forward|carried forward|c/f)\b")
        .expect("closing marker regex")
});

/// How close a row's line must sit to a marker line to be the same line.
const SAME_LINE_TOLERANCE: f64 = 0.5;

/// One segment's raw rows plus its declared balances.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSegment {
    /// Rows belonging to the segment, in source order
    pub rows: Vec<ExtractedRow>,
    /// Opening balance from the segment's marker, when present
    pub opening_balance: Option<Decimal>,
    /// Closing balance from a marker, when present
    pub closing_balance: Option<Decimal>,
    /// First source page
    pub start_page: u32,
    /// Last source page
    pub end_page: u32,
}

impl RowSegment {
    fn new(start_page: u32) -> Self {
        Self {
            rows: Vec::new(),
            opening_balance: None,
            closing_balance: None,
            start_page,
            end_page: start_page,
        }
    }
}

#[derive(Debug)]
struct Marker {
    opening: bool,
    amount: Option<Decimal>,
    page: u32,
    top: f64,
}

/// Split rows into segments using opening/closing balance markers found in
/// the full line stream.
///
/// With `split_on_repeats` off (config `detect_merged_pdfs = false`), only
/// the first opening marker is honored and repeats are reported.
pub fn split_into_segments(
    rows: Vec<ExtractedRow>,
    lines: &[Line],
    profile: &LocaleProfile,
    split_on_repeats: bool,
) -> StageOutcome<Vec<RowSegment>> {
    let mut warnings = Vec::new();

    let markers: Vec<Marker> = lines
        .iter()
        .filter_map(|line| {
            let text = line.text();
            let opening = OPENING_MARKER.is_match(&text);
            let closing = CLOSING_MARKER.is_match(&text);
            if !opening && !closing {
                return None;
            }
            Some(Marker {
                opening,
                amount: trailing_amount(&text, profile),
                page: line.page_number,
                top: line.top(),
            })
        })
        .collect();

    let mut segments: Vec<RowSegment> = Vec::new();
    let mut current: Option<RowSegment> = None;
    let mut marker_iter = markers.iter().peekable();

    for row in rows {
        // Apply markers positioned at or before this row
        while let Some(marker) = marker_iter.peek() {
            if is_before_or_same(marker, &row) {
                let marker = marker_iter.next().expect("peeked marker");
                apply_marker(marker, &mut current, &mut segments, split_on_repeats, &mut warnings);
            } else {
                break;
            }
        }
        // Skip the row if it is the marker line itself
        if markers.iter().any(|m| {
            m.page == row.page_number && (m.top - row.line_top).abs() <= SAME_LINE_TOLERANCE
        }) {
            continue;
        }
        let segment = current.get_or_insert_with(|| RowSegment::new(row.page_number));
        segment.end_page = segment.end_page.max(row.page_number);
        segment.rows.push(row);
    }
    // Trailing markers (e.g. a closing balance after the last row)
    for marker in marker_iter {
        apply_marker(marker, &mut current, &mut segments, split_on_repeats, &mut warnings);
    }
    if let Some(segment) = current.take() {
        segments.push(segment);
    }

    if segments.len() > 1 {
        warnings.push(format!(
            "document split into {} segments on repeated opening-balance markers",
            segments.len()
        ));
    }

    debug!(segments = segments.len(), "segmented document");
    StageOutcome::with_warnings(segments, warnings)
}

fn apply_marker(
    marker: &Marker,
    current: &mut Option<RowSegment>,
    segments: &mut Vec<RowSegment>,
    split_on_repeats: bool,
    warnings: &mut Vec<String>,
) {
    if marker.opening {
        match current {
            Some(segment) if segment.opening_balance.is_some() || !segment.rows.is_empty() => {
                if split_on_repeats {
                    segments.push(current.take().expect("current segment"));
                    let mut next = RowSegment::new(marker.page);
                    next.opening_balance = marker.amount;
                    *current = Some(next);
                } else {
                    warnings.push(format!(
                        "repeated opening-balance marker on page {} ignored (merged-PDF splitting disabled)",
                        marker.page
                    ));
                }
            }
            Some(segment) => segment.opening_balance = marker.amount,
            None => {
                let mut segment = RowSegment::new(marker.page);
                segment.opening_balance = marker.amount;
                *current = Some(segment);
            }
        }
    } else if let Some(segment) = current {
        segment.closing_balance = marker.amount;
    }
}

fn is_before_or_same(marker: &Marker, row: &ExtractedRow) -> bool {
    (marker.page, marker.top) <= (row.page_number, row.line_top + SAME_LINE_TOLERANCE)
}

/// Last amount-shaped token in a marker line, e.g. the `7,200.00` of
/// `Opening Balance 7,200.00`.
fn trailing_amount(text: &str, profile: &LocaleProfile) -> Option<Decimal> {
    text.split_whitespace()
        .rev()
        .find_map(|token| numbers::parse_amount(token, &profile.number_format).ok())
        .map(|parsed| if parsed.negative { -parsed.value } else { parsed.value })
}
