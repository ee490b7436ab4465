//! Column classification: semantic roles from headers and content.
//!
//! Header keywords outrank content scores when present. Content rules run
//! in a fixed order: date shape, right-aligned numeric ranking, wide text,
//! short alphanumeric reference. A post-pass guarantees the date, balance,
//! and description roles exist and recognizes merged-amount columns.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use ledgerlens_core::catalog::{dates, headers};
use ledgerlens_core::{ColumnBoundary, ColumnType, Line, StageOutcome, TableRegion};

/// Overlap used when sampling cells for classification: a fragment is in
/// a column when its center lies inside or half its width overlaps.
const CLASSIFY_OVERLAP: f64 = 0.5;

static DR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdr\.?\s*$").expect("dr suffix regex"));
static CR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcr\.?\s*$").expect("cr suffix regex"));
static MIXED_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9/#-]+$").expect("mixed alnum regex"));

/// Per-column sampled statistics.
#[derive(Debug)]
struct ColumnStats {
    header: Option<String>,
    cells: Vec<String>,
    date_score: f64,
    numeric_score: f64,
    text_score: f64,
    right_aligned: bool,
    avg_width: f64,
    has_dr_suffix: bool,
    has_cr_suffix: bool,
}

/// Classify each boundary's semantic role from headers and cell content.
///
/// The first sampled line is treated as the header row candidate. Returns
/// the boundaries re-annotated; the order is preserved.
pub fn classify_columns(
    region: &TableRegion,
    boundaries: &[ColumnBoundary],
) -> StageOutcome<Vec<ColumnBoundary>> {
    let mut warnings = Vec::new();
    if boundaries.is_empty() {
        warnings.push("no boundaries to classify".to_string());
        return StageOutcome::with_warnings(Vec::new(), warnings);
    }

    let stats: Vec<ColumnStats> = boundaries
        .iter()
        .map(|b| sample_column(&region.data_lines, b))
        .collect();

    let mut assigned: Vec<Option<(ColumnType, f64)>> = vec![None; boundaries.len()];

    // Rule 1: header keywords outrank content. The first sampled line only
    // counts as a header row when a majority of its cells hit the
    // dictionary; otherwise it is data and content rules decide.
    let header_hits = stats
        .iter()
        .filter(|s| {
            s.header
                .as_deref()
                .and_then(headers::lookup_fuzzy)
                .is_some()
        })
        .count();
    if header_hits * 2 >= boundaries.len() {
        for (i, stat) in stats.iter().enumerate() {
            if let Some(header) = &stat.header {
                if let Some(column_type) = headers::is_debit_credit_keyword(header) {
                    assigned[i] = Some((column_type, 0.95));
                } else if let Some(entry) = headers::lookup_fuzzy(header) {
                    assigned[i] = Some((entry.column_type, 0.9));
                }
            }
        }
    }

    // Rule 2: date shape
    for (i, stat) in stats.iter().enumerate() {
        if assigned[i].is_none() && stat.date_score > 0.5 {
            assigned[i] = Some((ColumnType::Date, stat.date_score.min(0.95)));
        }
    }

    // Rule 3: right-aligned numeric columns ranked from the right:
    // balance, credit, debit
    let mut numeric_unassigned: Vec<usize> = (0..stats.len())
        .filter(|&i| {
            assigned[i].is_none() && stats[i].numeric_score > 0.3 && stats[i].right_aligned
        })
        .collect();
    numeric_unassigned.sort_by(|&a, &b| {
        boundaries[b]
            .center_x()
            .partial_cmp(&boundaries[a].center_x())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let numeric_roles = [ColumnType::Balance, ColumnType::Credit, ColumnType::Debit];
    for (rank, &i) in numeric_unassigned.iter().enumerate() {
        if let Some(&role) = numeric_roles.get(rank) {
            // Skip roles a header already claimed
            let taken = assigned
                .iter()
                .flatten()
                .any(|&(t, _)| t == role);
            let role = if taken { ColumnType::Amount } else { role };
            assigned[i] = Some((role, stats[i].numeric_score.min(0.85)));
        }
    }

    // Rule 4: widest text column is the description
    let max_avg_width = stats.iter().map(|s| s.avg_width).fold(0.0, f64::max);
    for (i, stat) in stats.iter().enumerate() {
        if assigned[i].is_none()
            && stat.text_score > 0.3
            && max_avg_width > 0.0
            && stat.avg_width >= 0.7 * max_avg_width
        {
            assigned[i] = Some((ColumnType::Description, stat.text_score.min(0.85)));
        }
    }

    // Rule 5: short mixed-alphanumeric cells are references
    for (i, stat) in stats.iter().enumerate() {
        if assigned[i].is_none() && is_reference_shaped(stat) {
            assigned[i] = Some((ColumnType::Reference, 0.6));
        }
    }

    let mut annotated: Vec<ColumnBoundary> = boundaries
        .iter()
        .zip(&assigned)
        .map(|(boundary, assignment)| match assignment {
            Some((column_type, confidence)) => {
                boundary.clone().with_type(*column_type, *confidence)
            }
            None => boundary.clone().with_type(ColumnType::Unknown, 0.0),
        })
        .collect();

    post_process(&mut annotated, &stats, &mut warnings);

    debug!(
        columns = annotated.len(),
        roles = ?annotated.iter().map(|b| b.inferred_type).collect::<Vec<_>>(),
        "classified columns"
    );
    StageOutcome::with_warnings(annotated, warnings)
}

/// Collect per-line cell text and shape statistics for one column.
fn sample_column(lines: &[Line], boundary: &ColumnBoundary) -> ColumnStats {
    let mut cells: Vec<String> = Vec::new();
    let mut lefts: Vec<f64> = Vec::new();
    let mut rights: Vec<f64> = Vec::new();

    for line in lines {
        let mut text = String::new();
        let mut left = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        for fragment in &line.fragments {
            if boundary.contains_fragment(&fragment.bounding_box, CLASSIFY_OVERLAP) {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(fragment.text.trim());
                left = left.min(fragment.bounding_box.x);
                right = right.max(fragment.bounding_box.right());
            }
        }
        if !text.is_empty() {
            cells.push(text);
            lefts.push(left);
            rights.push(right);
        }
    }

    let header = cells.first().cloned();
    let body: &[String] = if cells.len() > 1 { &cells[1..] } else { &cells[..] };
    let non_empty = body.len().max(1) as f64;

    let date_score = body.iter().filter(|c| dates::matches_any(c)).count() as f64 / non_empty;
    let numeric_score = body.iter().filter(|c| looks_numeric(c)).count() as f64 / non_empty;
    let text_score = body
        .iter()
        .filter(|c| !looks_numeric(c) && c.trim().len() >= 4)
        .count() as f64
        / non_empty;
    let has_dr_suffix = body.iter().any(|c| DR_SUFFIX.is_match(c));
    let has_cr_suffix = body.iter().any(|c| CR_SUFFIX.is_match(c));
    let avg_width = if body.is_empty() {
        0.0
    } else {
        body.iter().map(|c| c.len()).sum::<usize>() as f64 / body.len() as f64
    };

    ColumnStats {
        header,
        cells,
        date_score,
        numeric_score,
        text_score,
        right_aligned: is_right_aligned(&lefts, &rights),
        avg_width,
        has_dr_suffix,
        has_cr_suffix,
    }
}

/// Numeric-shaped cell: after removing sign, currency, separators and
/// DR/CR suffixes, at least half the remaining characters are digits and
/// at least one digit exists.
fn looks_numeric(text: &str) -> bool {
    let stripped: String = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '.')
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '₹' | '(' | ')' | '+' | '-' | ' '))
        .collect();
    if stripped.is_empty() {
        return false;
    }
    let digits = stripped.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 1 && digits * 2 >= stripped.chars().count()
}

/// Right-aligned: right edges cluster tighter than left edges, or sit
/// within a couple of units of each other outright.
fn is_right_aligned(lefts: &[f64], rights: &[f64]) -> bool {
    if rights.len() < 2 {
        return false;
    }
    spread(rights) <= 2.0 || spread(rights) < spread(lefts)
}

fn spread(values: &[f64]) -> f64 {
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    max - min
}

fn is_reference_shaped(stat: &ColumnStats) -> bool {
    if stat.cells.len() < 2 {
        return false;
    }
    let body = &stat.cells[1..];
    if body.is_empty() {
        return false;
    }
    let short_alnum = body
        .iter()
        .filter(|c| c.len() <= 16 && MIXED_ALNUM.is_match(c) && !looks_numeric(c))
        .count();
    short_alnum * 2 > body.len()
}

/// Guarantee date, balance, and description roles; recognize merged-amount
/// columns; promote unknowns between date and balance to debit/credit.
fn post_process(
    boundaries: &mut [ColumnBoundary],
    stats: &[ColumnStats],
    warnings: &mut Vec<String>,
) {
    // Merged-amount column: one numeric column carrying both DR and CR
    // suffixes; later parsing splits it per row
    for (i, stat) in stats.iter().enumerate() {
        if boundaries[i].inferred_type.is_monetary()
            && boundaries[i].inferred_type != ColumnType::Balance
            && stat.has_dr_suffix
            && stat.has_cr_suffix
        {
            boundaries[i].inferred_type = ColumnType::Amount;
            warnings.push("merged debit/credit column recognized by DR/CR suffixes".to_string());
        }
    }

    let has = |boundaries: &[ColumnBoundary], t: ColumnType| {
        boundaries.iter().any(|b| b.inferred_type == t)
    };

    if !has(boundaries, ColumnType::Date) {
        if let Some((i, _)) = stats
            .iter()
            .enumerate()
            .filter(|(i, s)| boundaries[*i].inferred_type == ColumnType::Unknown && s.date_score > 0.0)
            .max_by(|(_, a), (_, b)| {
                a.date_score
                    .partial_cmp(&b.date_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        {
            boundaries[i].inferred_type = ColumnType::Date;
            boundaries[i].confidence = stats[i].date_score.min(0.5);
            warnings.push("date column inferred statistically".to_string());
        }
    }

    if !has(boundaries, ColumnType::Balance) {
        // Rightmost numeric-shaped column that is not already an amount role
        if let Some(i) = (0..boundaries.len())
            .rev()
            .find(|&i| {
                boundaries[i].inferred_type == ColumnType::Unknown && stats[i].numeric_score > 0.3
            })
        {
            boundaries[i].inferred_type = ColumnType::Balance;
            boundaries[i].confidence = stats[i].numeric_score.min(0.5);
            warnings.push("balance column inferred statistically".to_string());
        }
    }

    if !has(boundaries, ColumnType::Description) {
        if let Some((i, _)) = stats
            .iter()
            .enumerate()
            .filter(|(i, _)| boundaries[*i].inferred_type == ColumnType::Unknown)
            .max_by(|(_, a), (_, b)| {
                a.avg_width
                    .partial_cmp(&b.avg_width)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        {
            boundaries[i].inferred_type = ColumnType::Description;
            boundaries[i].confidence = stats[i].text_score.min(0.5);
            warnings.push("description column inferred statistically".to_string());
        }
    }

    // Promote unknown numeric columns between date and balance when the
    // amount roles are missing
    let has_debit = has(boundaries, ColumnType::Debit);
    let has_credit = has(boundaries, ColumnType::Credit);
    let has_merged = has(boundaries, ColumnType::Amount);
    if !has_merged && (!has_debit || !has_credit) {
        let date_pos = boundaries
            .iter()
            .position(|b| b.inferred_type == ColumnType::Date);
        let balance_pos = boundaries
            .iter()
            .position(|b| b.inferred_type == ColumnType::Balance);
        if let (Some(date_pos), Some(balance_pos)) = (date_pos, balance_pos) {
            let mut candidates: Vec<usize> = (date_pos + 1..balance_pos)
                .filter(|&i| {
                    boundaries[i].inferred_type == ColumnType::Unknown
                        && stats[i].numeric_score > 0.0
                })
                .collect();
            // Rightmost becomes credit, the one before debit
            candidates.reverse();
            let mut missing = Vec::new();
            if !has_credit {
                missing.push(ColumnType::Credit);
            }
            if !has_debit {
                missing.push(ColumnType::Debit);
            }
            for (&i, role) in candidates.iter().zip(missing) {
                boundaries[i].inferred_type = role;
                boundaries[i].confidence = 0.4;
                warnings.push(format!("{role:?} column promoted from unknown").to_lowercase());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_core::{BoundingBox, TextFragment};

    fn fragment(text: &str, x: f64, y: f64, width: f64) -> TextFragment {
        TextFragment::native(text, BoundingBox::new(x, y, width, 10.0).unwrap(), 1)
    }

    /// A five-column statement table with a header row.
    fn statement_region() -> (TableRegion, Vec<ColumnBoundary>) {
        let rows: Vec<Vec<(&str, f64, f64)>> = vec![
            vec![
                ("Date", 0.0, 60.0),
                ("Description", 100.0, 80.0),
                ("Debit", 300.0, 40.0),
                ("Credit", 400.0, 40.0),
                ("Balance", 500.0, 50.0),
            ],
            vec![
                ("2025-01-15", 0.0, 60.0),
                ("Salary payment", 100.0, 120.0),
                ("5,250.00", 412.0, 28.0),
                ("12,450.00", 510.0, 40.0),
            ],
            vec![
                ("2025-01-16", 0.0, 60.0),
                ("Transfer out", 100.0, 100.0),
                ("1,200.00", 312.0, 28.0),
                ("11,250.00", 510.0, 40.0),
            ],
            vec![
                ("2025-01-17", 0.0, 60.0),
                ("Purchase", 100.0, 70.0),
                ("89.99", 318.0, 22.0),
                ("11,160.01", 510.0, 40.0),
            ],
        ];
        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                Line::new(
                    cells
                        .iter()
                        .map(|(text, x, width)| fragment(text, *x, 20.0 + row as f64 * 15.0, *width))
                        .collect(),
                )
                .unwrap()
            })
            .collect();
        let region = TableRegion::from_lines(lines, 0.9).unwrap();
        let boundaries = vec![
            ColumnBoundary::new(0.0, 70.0).unwrap(),
            ColumnBoundary::new(90.0, 290.0).unwrap(),
            ColumnBoundary::new(295.0, 345.0).unwrap(),
            ColumnBoundary::new(395.0, 445.0).unwrap(),
            ColumnBoundary::new(495.0, 560.0).unwrap(),
        ];
        (region, boundaries)
    }

    #[test]
    fn test_header_keywords_win() {
        let (region, boundaries) = statement_region();
        let outcome = classify_columns(&region, &boundaries);
        let roles: Vec<ColumnType> = outcome.output.iter().map(|b| b.inferred_type).collect();
        assert_eq!(
            roles,
            vec![
                ColumnType::Date,
                ColumnType::Description,
                ColumnType::Debit,
                ColumnType::Credit,
                ColumnType::Balance
            ]
        );
        assert!(outcome.output[2].confidence >= 0.95);
    }

    #[test]
    fn test_headerless_content_classification() {
        let (region, boundaries) = statement_region();
        // Drop the header line; content rules must carry the layout
        let headerless =
            TableRegion::from_lines(region.data_lines[1..].to_vec(), 0.9).unwrap();
        let outcome = classify_columns(&headerless, &boundaries);
        let roles: Vec<ColumnType> = outcome.output.iter().map(|b| b.inferred_type).collect();
        assert_eq!(roles[0], ColumnType::Date);
        assert_eq!(roles[1], ColumnType::Description);
        assert_eq!(roles[4], ColumnType::Balance);
    }

    #[test]
    fn test_merged_amount_column() {
        let rows: Vec<Vec<(&str, f64, f64)>> = vec![
            vec![
                ("Date", 0.0, 60.0),
                ("Details", 100.0, 70.0),
                ("Amount", 300.0, 50.0),
                ("Balance", 420.0, 50.0),
            ],
            vec![
                ("15/01/2025", 0.0, 60.0),
                ("Salary", 100.0, 60.0),
                ("5,250.00 CR", 300.0, 60.0),
                ("12,450.00", 424.0, 46.0),
            ],
            vec![
                ("16/01/2025", 0.0, 60.0),
                ("Transfer", 100.0, 70.0),
                ("1,200.00 DR", 300.0, 60.0),
                ("11,250.00", 424.0, 46.0),
            ],
        ];
        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                Line::new(
                    cells
                        .iter()
                        .map(|(t, x, w)| fragment(t, *x, 20.0 + row as f64 * 15.0, *w))
                        .collect(),
                )
                .unwrap()
            })
            .collect();
        let region = TableRegion::from_lines(lines, 0.9).unwrap();
        let boundaries = vec![
            ColumnBoundary::new(0.0, 70.0).unwrap(),
            ColumnBoundary::new(90.0, 290.0).unwrap(),
            ColumnBoundary::new(295.0, 375.0).unwrap(),
            ColumnBoundary::new(415.0, 475.0).unwrap(),
        ];
        let outcome = classify_columns(&region, &boundaries);
        assert_eq!(outcome.output[2].inferred_type, ColumnType::Amount);
        assert_eq!(outcome.output[3].inferred_type, ColumnType::Balance);
    }

    #[test]
    fn test_empty_boundaries() {
        let (region, _) = statement_region();
        let outcome = classify_columns(&region, &[]);
        assert!(outcome.output.is_empty());
        assert!(!outcome.warnings.is_empty());
    }
}
