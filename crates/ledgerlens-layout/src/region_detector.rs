//! Table region detection: contiguous spans of consistently-shaped lines.

use tracing::debug;

use ledgerlens_core::{Line, StageOutcome, TableRegion};

/// Minimum fragments per line for a line to look tabular.
const MIN_FRAGMENTS_PER_LINE: usize = 3;

/// Maximum fragment-count change between adjacent full lines within a region.
const MAX_COUNT_DELTA: usize = 2;

/// Minimum lines for a run to qualify as a region.
const MIN_REGION_LINES: usize = 2;

/// Maximum consecutive short lines bridged inside an open region; these
/// are continuation-line candidates for the stitcher.
const MAX_BRIDGED_SHORT_LINES: usize = 2;

/// Confidence assigned to the degraded all-lines fallback region.
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Detect table regions: maximal runs of consecutive lines with at least
/// three fragments each, fragment counts varying by at most ±2 between
/// neighboring full lines, and no vertical gap above `row_gap_threshold`
/// within a page.
///
/// Short lines (fewer than three fragments) inside an open run are bridged
/// when the table resumes right after them; that keeps wrapped description
/// lines available to the stitcher. Trailing short lines terminate the
/// run. Runs continue across page boundaries so a table flowing onto the
/// next page stays one region. When nothing qualifies, all lines become a
/// single degraded region with confidence ≤ 0.3.
pub fn detect_table_regions(
    lines: &[Line],
    row_gap_threshold: f64,
) -> StageOutcome<Vec<TableRegion>> {
    let mut warnings = Vec::new();
    let mut regions = Vec::new();
    let mut run: Vec<Line> = Vec::new();
    // Fragment count of the last full (>= 3 fragment) line in the run
    let mut anchor_len = 0usize;

    let gap_ok = |prev: &Line, line: &Line| {
        line.page_number != prev.page_number || (line.top() - prev.bottom()) <= row_gap_threshold
    };

    let mut index = 0usize;
    while index < lines.len() {
        let line = &lines[index];
        let full = line.len() >= MIN_FRAGMENTS_PER_LINE;

        if full {
            let continues = match run.last() {
                None => true,
                Some(prev) => {
                    line.len().abs_diff(anchor_len) <= MAX_COUNT_DELTA && gap_ok(prev, line)
                }
            };
            if !continues {
                flush_run(&mut run, &mut regions);
            }
            anchor_len = line.len();
            run.push(line.clone());
            index += 1;
            continue;
        }

        // A short line terminates the run unless the table resumes right
        // after a short stretch; then the stretch is bridged into the run
        if !run.is_empty() {
            let stretch_end = lines[index..]
                .iter()
                .take_while(|l| l.len() < MIN_FRAGMENTS_PER_LINE)
                .count()
                + index;
            let stretch = &lines[index..stretch_end];
            let resume = lines.get(stretch_end);
            let bridgeable = stretch.len() <= MAX_BRIDGED_SHORT_LINES
                && resume.map_or(false, |next| {
                    next.len().abs_diff(anchor_len) <= MAX_COUNT_DELTA
                })
                && chain_gaps_ok(run.last().expect("run non-empty"), stretch, resume, &gap_ok);
            if bridgeable {
                run.extend(stretch.iter().cloned());
                index = stretch_end;
                continue;
            }
        }

        flush_run(&mut run, &mut regions);
        index += 1;
    }
    flush_run(&mut run, &mut regions);

    if regions.is_empty() && !lines.is_empty() {
        warnings.push(
            "no table region detected; falling back to all lines (degraded)".to_string(),
        );
        if let Ok(region) = TableRegion::from_lines(lines.to_vec(), FALLBACK_CONFIDENCE) {
            regions.push(region);
        }
    }

    debug!(lines = lines.len(), regions = regions.len(), "detected table regions");
    StageOutcome::with_warnings(regions, warnings)
}

/// Vertical gaps hold across the bridged stretch and into the resume line.
fn chain_gaps_ok(
    run_last: &Line,
    stretch: &[Line],
    resume: Option<&Line>,
    gap_ok: &impl Fn(&Line, &Line) -> bool,
) -> bool {
    let mut prev = run_last;
    for line in stretch {
        if !gap_ok(prev, line) {
            return false;
        }
        prev = line;
    }
    resume.map_or(false, |next| gap_ok(prev, next))
}

fn flush_run(run: &mut Vec<Line>, regions: &mut Vec<TableRegion>) {
    // Trailing short lines never close a region
    while run
        .last()
        .map_or(false, |l| l.len() < MIN_FRAGMENTS_PER_LINE)
    {
        run.pop();
    }
    if run.len() >= MIN_REGION_LINES {
        let lines = std::mem::take(run);
        // Confidence grows with run length and caps at 0.95
        let confidence = (0.6 + 0.05 * lines.len() as f64).min(0.95);
        if let Ok(region) = TableRegion::from_lines(lines, confidence) {
            regions.push(region);
        }
    } else {
        run.clear();
    }
}
