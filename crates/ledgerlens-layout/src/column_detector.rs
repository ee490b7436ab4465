//! Column boundary detection via vertical-gutter histograms.
//!
//! A 1D histogram of horizontal text coverage is built over the region
//! width; maximal low-coverage runs wide enough to be gutters separate the
//! columns. Thresholds adapt to document density: sparse layouts demand
//! wider gutters, dense layouts accept narrower ones.

use tracing::debug;

use ledgerlens_core::{ColumnBoundary, StageOutcome, TableRegion};

/// Histogram resolution in page units per bucket.
const BUCKET_WIDTH: f64 = 2.0;

/// Layout density classes by average fragment count per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// Fewer than 4 fragments per line
    Sparse,
    /// 4 to 7 fragments per line
    Normal,
    /// 8 or more fragments per line
    Dense,
}

impl Density {
    /// Classify a region by its average fragment count per line.
    pub fn of(region: &TableRegion) -> Self {
        let avg = region.avg_fragments_per_line();
        if avg < 4.0 {
            Self::Sparse
        } else if avg < 8.0 {
            Self::Normal
        } else {
            Self::Dense
        }
    }

    /// Coverage fraction (of lines) below which a bucket counts as blank.
    fn coverage_threshold(self) -> f64 {
        match self {
            Self::Sparse => 0.05,
            Self::Normal => 0.10,
            Self::Dense => 0.15,
        }
    }

    /// Minimum gutter width in page units.
    fn min_gutter_width(self) -> f64 {
        match self {
            Self::Sparse => 12.0,
            Self::Normal => 8.0,
            Self::Dense => 5.0,
        }
    }

    /// Minimum column width in page units.
    fn min_column_width(self) -> f64 {
        match self {
            Self::Sparse => 20.0,
            Self::Normal => 15.0,
            Self::Dense => 15.0,
        }
    }
}

/// Detect column boundaries for a region, sorted left to right.
///
/// Columns narrower than the density-adaptive minimum are discarded. When
/// no gutter emerges the whole region width becomes one column and a
/// warning is recorded.
pub fn detect_column_boundaries(region: &TableRegion) -> StageOutcome<Vec<ColumnBoundary>> {
    let mut warnings = Vec::new();
    let width = region.right - region.left;
    if width <= 0.0 || region.data_lines.is_empty() {
        warnings.push("region has no horizontal extent; no columns detected".to_string());
        return StageOutcome::with_warnings(Vec::new(), warnings);
    }

    let density = Density::of(region);
    let bucket_count = ((width / BUCKET_WIDTH).ceil() as usize).max(1);
    let mut coverage = vec![0usize; bucket_count];

    // Count, per bucket, how many lines place text there
    for line in &region.data_lines {
        let mut touched = vec![false; bucket_count];
        for fragment in &line.fragments {
            let start = ((fragment.bounding_box.x - region.left) / BUCKET_WIDTH).floor() as isize;
            let end =
                ((fragment.bounding_box.right() - region.left) / BUCKET_WIDTH).ceil() as isize;
            for bucket in start.max(0)..end.min(bucket_count as isize) {
                touched[bucket as usize] = true;
            }
        }
        for (bucket, hit) in touched.iter().enumerate() {
            if *hit {
                coverage[bucket] += 1;
            }
        }
    }

    let line_count = region.data_lines.len() as f64;
    let blank_limit = (density.coverage_threshold() * line_count).ceil() as usize;
    let min_gutter_buckets = (density.min_gutter_width() / BUCKET_WIDTH).ceil() as usize;

    // Maximal blank runs wide enough to be gutters
    let mut gutters: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (bucket, &count) in coverage.iter().enumerate() {
        if count <= blank_limit {
            run_start.get_or_insert(bucket);
        } else if let Some(start) = run_start.take() {
            if bucket - start >= min_gutter_buckets {
                gutters.push((start, bucket));
            }
        }
    }
    if let Some(start) = run_start {
        if bucket_count - start >= min_gutter_buckets {
            gutters.push((start, bucket_count));
        }
    }

    // Strips between gutters (plus leading and trailing strips) are columns
    let mut columns = Vec::new();
    let mut strip_start = 0usize;
    for &(gutter_start, gutter_end) in &gutters {
        push_strip(region, density, strip_start, gutter_start, &mut columns);
        strip_start = gutter_end;
    }
    push_strip(region, density, strip_start, bucket_count, &mut columns);

    if columns.is_empty() {
        warnings.push("no columns passed the width filter".to_string());
    } else if columns.len() == 1 {
        warnings.push("single column detected; layout may not be tabular".to_string());
    }

    debug!(
        density = ?density,
        gutters = gutters.len(),
        columns = columns.len(),
        "detected column boundaries"
    );
    StageOutcome::with_warnings(columns, warnings)
}

fn push_strip(
    region: &TableRegion,
    density: Density,
    start_bucket: usize,
    end_bucket: usize,
    columns: &mut Vec<ColumnBoundary>,
) {
    if end_bucket <= start_bucket {
        return;
    }
    let x0 = region.left + start_bucket as f64 * BUCKET_WIDTH;
    let x1 = (region.left + end_bucket as f64 * BUCKET_WIDTH).min(region.right.max(x0));
    if x1 - x0 < density.min_column_width() {
        return;
    }
    if let Ok(boundary) = ColumnBoundary::new(x0, x1) {
        columns.push(boundary);
    }
}
